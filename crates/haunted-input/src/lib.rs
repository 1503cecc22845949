//! Pointer input: frame-coherent mouse state and damped orbit camera controls.

pub mod mouse;
pub mod orbit;

pub use mouse::MouseState;
pub use orbit::OrbitControls;
