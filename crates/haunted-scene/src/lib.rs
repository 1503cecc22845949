//! The haunted house scene: graph, geometry, materials, environment, and the
//! per-frame updater that animates the ghost lights and the flickering door
//! light.
//!
//! Nothing in this crate touches the GPU. The renderer consumes a
//! [`SceneState`] through the [`FrameHost`] trait.

mod camera;
mod environment;
mod flicker;
mod frame;
mod geometry;
mod ghost;
mod graph;
mod graves;
mod house;
mod material;
mod timer;

pub use camera::Camera;
pub use environment::{FogExp2, Sky, SkyScattering};
pub use flicker::{FLICKER_MAX_DECREMENT, FLICKER_RESET_INTENSITY, Flicker};
pub use frame::{
    CameraControls, FrameHost, FrameUpdater, GhostLight, SceneState, ShutdownToken,
    run_until_cancelled,
};
pub use geometry::MeshData;
pub use ghost::{GHOST_ORBITS, GhostOrbit, ghost_positions};
pub use graph::{GeometryId, MaterialId, MeshNode, Node, NodeId, NodeKind, Scene, Transform};
pub use graves::{GravePlacement, scatter_graves};
pub use house::build_haunted_house;
pub use material::{ColorSpace, StandardMaterial, TextureRef, TextureSlot, WrapMode};
pub use timer::{FrameClock, ManualClock, Timer};
