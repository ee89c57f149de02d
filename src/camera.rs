//! Orbit camera and one-shot autoframing
//!
//! The camera orbits a target point using spherical coordinates and eases
//! toward requested moves. [`Autoframer`] aims it at the centroid of a dataset
//! the first time the dataset becomes non-empty, then leaves navigation to
//! the user.

use std::f32::consts::{FRAC_PI_2, PI};

use serde::Serialize;

use crate::config::{CameraConfig, OrbitConfig};
use crate::layout::{PositionedNode, centroid};
use crate::math::{add, cross, look_at, mat4_multiply, normalize, perspective, scale, sub};

/// Polar angle limit away from the poles
const PHI_MARGIN: f32 = 0.1;

/// Camera position and look-at target
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraPose {
    pub position: [f32; 3],
    pub target: [f32; 3],
}

/// A ray in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: [f32; 3],
    /// Unit direction
    pub direction: [f32; 3],
}

impl Ray {
    /// Distance along the ray to the first hit with a sphere, if any
    pub fn intersect_sphere(&self, center: [f32; 3], radius: f32) -> Option<f32> {
        let oc = sub(self.origin, center);
        let b = crate::math::dot(oc, self.direction);
        let c = crate::math::dot(oc, oc) - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        let near = -b - sqrt_disc;
        let far = -b + sqrt_disc;
        if near >= 0.0 {
            Some(near)
        } else if far >= 0.0 {
            Some(0.0)
        } else {
            None
        }
    }
}

/// Orbit-style camera
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Camera position in world space
    pub position: [f32; 3],
    /// Point the camera looks at
    pub target: [f32; 3],
    pub up: [f32; 3],

    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    pub distance: f32,
    /// Azimuth around the Y axis, 0 = looking down -Z
    pub theta: f32,
    /// Polar angle from +Y
    pub phi: f32,

    min_distance: f32,
    max_distance: f32,
    enable_pan: bool,
    enable_zoom: bool,

    target_distance: f32,
    target_theta: f32,
    target_phi: f32,
    target_target: [f32; 3],

    /// Where `reset_view` returns to: the last framed target and distance
    home_target: [f32; 3],
    home_distance: f32,

    pub is_animating: bool,
}

impl OrbitCamera {
    pub fn new(camera: &CameraConfig, orbit: &OrbitConfig, aspect: f32) -> Self {
        let min_distance = orbit.min_distance.min(orbit.max_distance);
        let max_distance = orbit.max_distance.max(orbit.min_distance);
        let distance = camera.frame_distance.clamp(min_distance, max_distance);
        let theta = 0.0;
        let phi = FRAC_PI_2;

        let mut cam = Self {
            position: [0.0, 0.0, distance],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fov: camera.fov_degrees.to_radians(),
            aspect,
            near: camera.near,
            far: camera.far,
            distance,
            theta,
            phi,
            min_distance,
            max_distance,
            enable_pan: orbit.enable_pan,
            enable_zoom: orbit.enable_zoom,
            target_distance: distance,
            target_theta: theta,
            target_phi: phi,
            target_target: [0.0, 0.0, 0.0],
            home_target: [0.0, 0.0, 0.0],
            home_distance: distance,
            is_animating: false,
        };
        cam.update_position();
        cam
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position,
            target: self.target,
        }
    }

    pub fn distance_limits(&self) -> (f32, f32) {
        (self.min_distance, self.max_distance)
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        if height > 0.0 {
            self.aspect = width / height;
        }
    }

    /// Jump to look at `target` from `distance` along +Z, with no easing
    pub fn frame(&mut self, target: [f32; 3], distance: f32) {
        let distance = distance.clamp(self.min_distance, self.max_distance);
        self.target = target;
        self.target_target = target;
        self.distance = distance;
        self.target_distance = distance;
        self.theta = 0.0;
        self.target_theta = 0.0;
        self.phi = FRAC_PI_2;
        self.target_phi = FRAC_PI_2;
        self.home_target = target;
        self.home_distance = distance;
        self.is_animating = false;
        self.update_position();
    }

    /// Animate back to the last framed view
    pub fn reset_view(&mut self) {
        self.target_distance = self.home_distance;
        self.target_theta = 0.0;
        self.target_phi = FRAC_PI_2;
        self.target_target = self.home_target;
        self.is_animating = true;
    }

    pub fn orbit_horizontal(&mut self, delta: f32) {
        self.target_theta += delta;
        self.is_animating = true;
    }

    pub fn orbit_vertical(&mut self, delta: f32) {
        self.target_phi = (self.target_phi + delta).clamp(PHI_MARGIN, PI - PHI_MARGIN);
        self.is_animating = true;
    }

    /// Multiply the distance by `factor`, within the orbit limits
    pub fn zoom(&mut self, factor: f32) {
        if !self.enable_zoom {
            return;
        }
        self.target_distance =
            (self.target_distance * factor).clamp(self.min_distance, self.max_distance);
        self.is_animating = true;
    }

    /// Move the target in the screen plane
    pub fn pan(&mut self, dx: f32, dy: f32) {
        if !self.enable_pan {
            return;
        }
        let forward = normalize(sub(self.target, self.position));
        let right = normalize(cross(forward, self.up));
        let up = cross(right, forward);

        let s = self.distance * 0.002;
        self.target_target = add(
            self.target_target,
            add(scale(right, dx * s), scale(up, dy * s)),
        );
        self.is_animating = true;
    }

    /// Spin around the target, `speed` in three.js units (2 = one turn per 30 s)
    pub fn auto_rotate(&mut self, dt_secs: f32, speed: f32) {
        let angle = 2.0 * PI / 60.0 * speed * dt_secs;
        self.theta -= angle;
        self.target_theta -= angle;
        self.update_position();
    }

    /// Ease toward requested values; returns true while still moving
    pub fn update_animation(&mut self) -> bool {
        const LERP_FACTOR: f32 = 0.12;
        const EPSILON: f32 = 0.001;

        fn step(current: &mut f32, target: f32, moving: &mut bool) {
            if (*current - target).abs() > EPSILON {
                *current = crate::math::lerp(*current, target, LERP_FACTOR);
                *moving = true;
            } else {
                *current = target;
            }
        }

        let mut still_animating = false;
        step(&mut self.distance, self.target_distance, &mut still_animating);
        step(&mut self.theta, self.target_theta, &mut still_animating);
        step(&mut self.phi, self.target_phi, &mut still_animating);
        for i in 0..3 {
            step(&mut self.target[i], self.target_target[i], &mut still_animating);
        }

        self.is_animating = still_animating;
        self.update_position();
        still_animating
    }

    fn update_position(&mut self) {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();

        self.position[0] = self.target[0] + self.distance * sin_phi * sin_theta;
        self.position[1] = self.target[1] + self.distance * cos_phi;
        self.position[2] = self.target[2] + self.distance * sin_phi * cos_theta;
    }

    /// Picking ray through a point in normalized device coordinates
    pub fn ray(&self, ndc_x: f32, ndc_y: f32) -> Ray {
        let forward = normalize(sub(self.target, self.position));
        let right = normalize(cross(forward, self.up));
        let up = cross(right, forward);
        let half_height = (self.fov / 2.0).tan();
        let half_width = half_height * self.aspect;

        let direction = normalize(add(
            forward,
            add(
                scale(right, ndc_x * half_width),
                scale(up, ndc_y * half_height),
            ),
        ));
        Ray {
            origin: self.position,
            direction,
        }
    }

    pub fn view_matrix(&self) -> [f32; 16] {
        look_at(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> [f32; 16] {
        perspective(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> [f32; 16] {
        mat4_multiply(self.projection_matrix(), self.view_matrix())
    }
}

/// Frames the camera on the first non-empty load after mount or after an
/// empty load
#[derive(Debug, Clone)]
pub struct Autoframer {
    frame_distance: f32,
    framed: bool,
}

impl Autoframer {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            frame_distance: config.frame_distance,
            framed: false,
        }
    }

    /// Whether the current dataset has already been framed
    pub fn is_framed(&self) -> bool {
        self.framed
    }

    /// Handle a dataset load; returns the new pose if the camera was moved
    pub fn on_load(
        &mut self,
        nodes: &[PositionedNode],
        camera: &mut OrbitCamera,
    ) -> Option<CameraPose> {
        match centroid(nodes) {
            None => {
                self.framed = false;
                None
            }
            Some(_) if self.framed => None,
            Some(center) => {
                camera.frame(center, self.frame_distance);
                self.framed = true;
                tracing::info!(?center, nodes = nodes.len(), "camera framed on dataset");
                Some(camera.pose())
            }
        }
    }
}
