//! Configuration for the haunted house viewer.
//!
//! Settings persist to disk as a RON file, missing fields fall back to their
//! defaults, and command-line arguments override whatever was loaded.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{CONFIG_FILE_NAME, CameraConfig, Config, DebugConfig, RenderConfig, SceneConfig, WindowConfig};
pub use error::ConfigError;
