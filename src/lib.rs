//! memory-galaxy - spatial visualization engine for a personal memory browser.
//!
//! Places photos, audio and video as nodes in a navigable 3D "galaxy",
//! tracks hover and dreaming state per node, and keeps the camera framed on
//! the dataset. Rendering backends consume the plain data this crate
//! produces; nothing here draws pixels or talks to the media backend.

pub mod attention;
pub mod backdrop;
pub mod camera;
pub mod config;
pub mod io;
pub mod layout;
mod math;
pub mod model;
pub mod node_state;
pub mod popover;
pub mod random;
pub mod scene;
pub mod transform;

pub use camera::{CameraPose, OrbitCamera};
pub use config::GalaxyConfig;
pub use io::{GalaxyError, GalaxyResult};
pub use layout::{Placement, PositionResolver, PositionedNode};
pub use model::{Item, MediaKind};
pub use node_state::NodeState;
pub use random::{RandomSource, RngSource, ScriptedSource};
pub use scene::{GalaxyScene, SceneEvent, SceneSnapshot};
