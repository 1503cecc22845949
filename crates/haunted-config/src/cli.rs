//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Haunted house viewer command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "haunted-house", about = "Haunted house scene viewer")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Start in fullscreen.
    #[arg(long)]
    pub fullscreen: Option<bool>,

    /// Wait for vertical sync when presenting.
    #[arg(long)]
    pub vsync: Option<bool>,

    /// Render the directional light shadow map.
    #[arg(long)]
    pub shadows: Option<bool>,

    /// Directory holding the scene textures.
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Number of graves to scatter.
    #[arg(long)]
    pub graves: Option<u32>,

    /// Seed for grave placement.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Fog density.
    #[arg(long)]
    pub fog_density: Option<f32>,

    /// Stop after rendering this many frames.
    #[arg(long)]
    pub frames: Option<u64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(fs) = args.fullscreen {
            self.window.fullscreen = fs;
        }
        if let Some(vsync) = args.vsync {
            self.window.vsync = vsync;
        }
        if let Some(shadows) = args.shadows {
            self.render.shadows = shadows;
        }
        if let Some(ref dir) = args.assets {
            self.scene.assets_dir = dir.clone();
        }
        if let Some(count) = args.graves {
            self.scene.grave_count = count;
        }
        if let Some(seed) = args.seed {
            self.scene.grave_seed = Some(seed);
        }
        if let Some(density) = args.fog_density {
            self.scene.fog_density = density.max(0.0);
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
