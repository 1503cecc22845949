//! Haunted house viewer application: window, event handling, and the
//! display-driven frame loop.

pub mod platform;
pub mod window;

pub use platform::{PlatformDirs, PlatformError};
pub use window::{AppError, AppState, WindowHost, run};
