//! Per-frame node transforms
//!
//! Pure functions of scene time, hover flag and camera position. The scene
//! evaluates them every frame; renderers only copy the results.

use serde::Serialize;

use crate::config::BreathingConfig;
use crate::math::{cross, length, lerp, normalize, sub};

const WORLD_UP: [f32; 3] = [0.0, 1.0, 0.0];
const FALLBACK_UP: [f32; 3] = [0.0, 0.0, 1.0];

/// Position, uniform scale and orientation of one node
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub position: [f32; 3],
    pub scale: f32,
    /// Orthonormal basis columns (right, up, facing); facing points at the camera
    pub basis: [[f32; 3]; 3],
}

impl Transform {
    /// Direction the node's front faces
    pub fn facing(&self) -> [f32; 3] {
        self.basis[2]
    }

    /// Model matrix (column-major): translate * rotate * scale
    pub fn model_matrix(&self) -> [f32; 16] {
        let [r, u, f] = self.basis;
        let s = self.scale;
        let p = self.position;
        [
            r[0] * s,
            r[1] * s,
            r[2] * s,
            0.0,
            u[0] * s,
            u[1] * s,
            u[2] * s,
            0.0,
            f[0] * s,
            f[1] * s,
            f[2] * s,
            0.0,
            p[0],
            p[1],
            p[2],
            1.0,
        ]
    }
}

/// Target scale: hover override, otherwise a sine "breath" offset by the
/// node's x coordinate so neighbours do not pulse in lockstep
pub fn breathing_scale(phase: f32, offset: f32, hovered: bool, cfg: &BreathingConfig) -> f32 {
    if hovered {
        cfg.hover_scale
    } else {
        1.0 + cfg.amplitude * (cfg.frequency * phase + offset).sin()
    }
}

/// Rotation basis that turns a node at `position` to face `camera`
pub fn billboard(position: [f32; 3], camera: [f32; 3]) -> [[f32; 3]; 3] {
    let to_camera = sub(camera, position);
    if length(to_camera) <= f32::EPSILON {
        return [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    }
    let facing = normalize(to_camera);

    let mut right = cross(WORLD_UP, facing);
    if length(right) <= 1e-6 {
        right = cross(FALLBACK_UP, facing);
    }
    let right = normalize(right);
    let up = cross(facing, right);
    [right, up, facing]
}

/// Full transform for one node at scene time `phase`
pub fn node_transform(
    phase: f32,
    hovered: bool,
    coordinate: [f32; 3],
    camera_position: [f32; 3],
    cfg: &BreathingConfig,
) -> Transform {
    Transform {
        position: coordinate,
        scale: breathing_scale(phase, coordinate[0], hovered, cfg),
        basis: billboard(coordinate, camera_position),
    }
}

/// Move `current` toward `target` by the easing factor
pub fn ease_scale(current: f32, target: f32, smoothing: f32) -> f32 {
    lerp(current, target, smoothing.clamp(0.0, 1.0))
}
