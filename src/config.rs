//! Galaxy configuration
//!
//! Every tunable constant of the engine lives here. All sections default to
//! the values the browser client ships with, so a config file only needs the
//! keys it overrides.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::MediaKind;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxyConfig {
    pub layout: LayoutConfig,
    pub breathing: BreathingConfig,
    pub attention: AttentionConfig,
    pub camera: CameraConfig,
    pub orbit: OrbitConfig,
    pub node: NodeConfig,
    pub backdrop: BackdropConfig,
    pub popover: PopoverConfig,
}

/// How truncation picks which items survive a cap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapPolicy {
    /// First N items in array order
    #[default]
    InputOrder,
    /// Highest `score` first; unscored items rank last
    Relevance,
}

/// Shape of the volume fallback positions are sampled from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackVolume {
    #[default]
    Cube,
    Sphere,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindCaps {
    pub image: usize,
    pub audio: usize,
    pub video: usize,
}

impl Default for KindCaps {
    fn default() -> Self {
        Self {
            image: 600,
            audio: 200,
            video: 200,
        }
    }
}

impl KindCaps {
    pub fn for_kind(&self, kind: MediaKind) -> usize {
        match kind {
            MediaKind::Image => self.image,
            MediaKind::Audio => self.audio,
            MediaKind::Video => self.video,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub volume: FallbackVolume,
    /// Half-extent of the cube, or radius of the sphere
    pub radius: f32,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            volume: FallbackVolume::Cube,
            radius: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Hard cap on instantiated nodes across all kinds
    pub max_nodes: usize,
    pub caps: KindCaps,
    pub cap_policy: CapPolicy,
    /// Multiplier applied to backend-provided coordinates
    pub spread: f32,
    pub fallback: FallbackConfig,
    /// Reuse fallback samples for ids that survive into the next load
    pub retain_fallbacks: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_nodes: 800,
            caps: KindCaps::default(),
            cap_policy: CapPolicy::InputOrder,
            spread: 1.0,
            fallback: FallbackConfig::default(),
            retain_fallbacks: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreathingConfig {
    pub amplitude: f32,
    /// Angular frequency in radians per second
    pub frequency: f32,
    pub hover_scale: f32,
    /// Per-frame easing factor toward the target scale, in (0, 1]
    pub smoothing: f32,
}

impl Default for BreathingConfig {
    fn default() -> Self {
        Self {
            amplitude: 0.15,
            frequency: 1.5,
            hover_scale: 2.0,
            smoothing: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionConfig {
    pub interval_ms: u64,
    /// A draw must exceed this to start dreaming; entry probability is `1 - threshold`
    pub threshold: f64,
    pub dwell_ms: u64,
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            interval_ms: 6000,
            threshold: 0.99,
            dwell_ms: 4000,
        }
    }
}

impl AttentionConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }

    /// Probability that an eligible node starts dreaming on one poll
    pub fn entry_probability(&self) -> f64 {
        (1.0 - self.threshold).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Depth offset from the centroid when autoframing
    pub frame_distance: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frame_distance: 18.0,
            fov_degrees: 60.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub min_distance: f32,
    pub max_distance: f32,
    pub enable_pan: bool,
    pub enable_zoom: bool,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            min_distance: 2.0,
            max_distance: 50.0,
            enable_pan: true,
            enable_zoom: true,
            auto_rotate: true,
            auto_rotate_speed: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub image_radius: f32,
    pub audio_radius: f32,
    pub video_radius: f32,
    /// Radius of the invisible pick sphere
    pub hit_radius: f32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            image_radius: 0.10,
            audio_radius: 0.15,
            video_radius: 0.12,
            hit_radius: 0.4,
        }
    }
}

impl NodeConfig {
    pub fn radius(&self, kind: MediaKind) -> f32 {
        match kind {
            MediaKind::Image => self.image_radius,
            MediaKind::Audio => self.audio_radius,
            MediaKind::Video => self.video_radius,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdropConfig {
    pub star_count: usize,
    pub radius: f32,
    pub depth: f32,
    pub ambient_intensity: f32,
    pub point_light: [f32; 3],
    pub point_intensity: f32,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            star_count: 5000,
            radius: 100.0,
            depth: 50.0,
            ambient_intensity: 0.5,
            point_light: [10.0, 10.0, 10.0],
            point_intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopoverConfig {
    /// Base URL thumbnail and raw-media references are resolved against
    pub api_base: String,
    /// Show the first tag as a label on nodes that are not shown
    pub tag_labels: bool,
}

impl Default for PopoverConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000".to_string(),
            tag_labels: true,
        }
    }
}
