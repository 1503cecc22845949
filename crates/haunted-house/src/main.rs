//! Haunted house viewer.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p haunted-house` to open the scene.
//! Run with `cargo run -p haunted-house -- --frames 600 --seed 3` for a fixed,
//! bounded run.

use std::process::ExitCode;

use clap::Parser;
use haunted_app::PlatformDirs;
use haunted_config::{CliArgs, Config};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let dirs = match args.config.as_deref() {
        Some(dir) => PlatformDirs::with_config_dir(dir),
        None => match PlatformDirs::resolve() {
            Ok(dirs) => dirs,
            Err(e) => {
                eprintln!("{e}, using the working directory");
                PlatformDirs::with_config_dir(std::path::Path::new("."))
            }
        },
    };

    let loaded = Config::load_or_create(&dirs.config_dir);
    let mut config = loaded.as_ref().cloned().unwrap_or_default();
    config.apply_cli_overrides(&args);

    haunted_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    if let Err(e) = &loaded {
        warn!("Failed to load config: {e}, using defaults");
    }
    info!(
        config_dir = %dirs.config_dir.display(),
        assets = %config.scene.assets_dir.display(),
        graves = config.scene.grave_count,
        "Starting haunted house viewer"
    );

    match haunted_app::run(config, args.frames) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
