//! Small vector and matrix helpers shared by the camera and transforms
//!
//! Matrices are 4x4 column-major, matching what GPU uniform buffers expect.
//! They are written down row by row and transposed into storage order.

type Vec3 = [f32; 3];
type Mat4 = [f32; 16];

pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn zip_with(a: Vec3, b: Vec3, f: impl Fn(f32, f32) -> f32) -> Vec3 {
    std::array::from_fn(|i| f(a[i], b[i]))
}

pub(crate) fn add(a: Vec3, b: Vec3) -> Vec3 {
    zip_with(a, b, |x, y| x + y)
}

pub(crate) fn sub(a: Vec3, b: Vec3) -> Vec3 {
    zip_with(a, b, |x, y| x - y)
}

pub(crate) fn scale(v: Vec3, s: f32) -> Vec3 {
    v.map(|c| c * s)
}

pub(crate) fn cross(a: Vec3, b: Vec3) -> Vec3 {
    let [ax, ay, az] = a;
    let [bx, by, bz] = b;
    [ay * bz - az * by, az * bx - ax * bz, ax * by - ay * bx]
}

pub(crate) fn dot(a: Vec3, b: Vec3) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub(crate) fn length(v: Vec3) -> f32 {
    dot(v, v).sqrt()
}

/// Unit vector along `v`; the zero vector is returned unchanged
pub(crate) fn normalize(v: Vec3) -> Vec3 {
    match length(v) {
        len if len > 0.0 => v.map(|c| c / len),
        _ => v,
    }
}

/// Storage order for a matrix given as rows
fn from_rows(rows: [[f32; 4]; 4]) -> Mat4 {
    std::array::from_fn(|i| rows[i % 4][i / 4])
}

/// View matrix for an eye at `eye` looking toward `target`
pub(crate) fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let forward = normalize(sub(target, eye));
    let right = normalize(cross(forward, up));
    let true_up = cross(right, forward);
    let back = scale(forward, -1.0);

    let row = |axis: Vec3| [axis[0], axis[1], axis[2], -dot(axis, eye)];
    from_rows([row(right), row(true_up), row(back), [0.0, 0.0, 0.0, 1.0]])
}

/// Right-handed perspective projection onto the [-1, 1] depth range
pub(crate) fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let focal = 1.0 / (fov * 0.5).tan();
    let depth = near - far;
    from_rows([
        [focal / aspect, 0.0, 0.0, 0.0],
        [0.0, focal, 0.0, 0.0],
        [0.0, 0.0, (far + near) / depth, 2.0 * far * near / depth],
        [0.0, 0.0, -1.0, 0.0],
    ])
}

/// Matrix product `a * b`
pub(crate) fn mat4_multiply(a: Mat4, b: Mat4) -> Mat4 {
    std::array::from_fn(|i| {
        let (col, row) = (i / 4, i % 4);
        (0..4).map(|k| a[k * 4 + row] * b[col * 4 + k]).sum()
    })
}
