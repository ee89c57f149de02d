//! Decorative starfield and lighting
//!
//! Pure presentation: stars are scattered once at mount in a spherical shell
//! behind the dataset and never move.

use serde::Serialize;

use crate::config::BackdropConfig;
use crate::random::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Star {
    pub position: [f32; 3],
    /// Point size factor in [0.5, 1.5)
    pub size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Lighting {
    pub ambient_intensity: f32,
    pub point_position: [f32; 3],
    pub point_intensity: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Backdrop {
    pub stars: Vec<Star>,
    pub lighting: Lighting,
}

impl Backdrop {
    /// Scatter `star_count` stars between `radius` and `radius + depth`
    pub fn generate(config: &BackdropConfig, rng: &mut dyn RandomSource) -> Self {
        let stars = (0..config.star_count)
            .map(|_| {
                let cos_theta = rng.next_range(-1.0, 1.0);
                let phi = rng.next_range(0.0, std::f32::consts::TAU);
                let r = config.radius + config.depth * rng.next_unit() as f32;
                let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
                Star {
                    position: [
                        r * sin_theta * phi.cos(),
                        r * sin_theta * phi.sin(),
                        r * cos_theta,
                    ],
                    size: rng.next_range(0.5, 1.5),
                }
            })
            .collect();

        Self {
            stars,
            lighting: Lighting {
                ambient_intensity: config.ambient_intensity,
                point_position: config.point_light,
                point_intensity: config.point_intensity,
            },
        }
    }
}
