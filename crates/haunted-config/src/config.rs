//! Configuration structs with scene defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Top-level viewer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Rendering settings.
    pub render: RenderConfig,
    /// Scene content and tweakables.
    pub scene: SceneConfig,
    /// Camera and orbit control settings.
    pub camera: CameraConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Start in fullscreen mode.
    pub fullscreen: bool,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Upper bound applied to the window scale factor when sizing render targets.
    pub max_pixel_ratio: f64,
    /// Render the directional shadow map.
    pub shadows: bool,
    /// Edge length of the directional shadow map in texels.
    pub shadow_map_size: u32,
}

/// Scene content settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Root directory of the texture assets.
    pub assets_dir: PathBuf,
    /// Number of graves scattered around the house.
    pub grave_count: u32,
    /// Seed for grave placement. `None` draws a fresh layout every run.
    pub grave_seed: Option<u64>,
    /// Density of the exponential-squared fog.
    pub fog_density: f32,
    /// Height scale applied to the floor displacement map.
    pub floor_displacement_scale: f32,
    /// Offset added to the floor displacement.
    pub floor_displacement_bias: f32,
    /// Intensity the door light starts at before the first flicker.
    pub door_light_intensity: f32,
}

/// Camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clip plane distance.
    pub near: f32,
    /// Far clip plane distance.
    pub far: f32,
    /// Starting camera position in world space.
    pub position: [f32; 3],
    /// Smooth orbit motion with inertia.
    pub enable_damping: bool,
    /// Fraction of the pending orbit motion applied each frame when damping.
    pub damping_factor: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log frame timing every this many frames. Zero disables it.
    pub frame_log_interval: u64,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            title: "Haunted House".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_pixel_ratio: 2.0,
            shadows: true,
            shadow_map_size: 256,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("static"),
            grave_count: 50,
            grave_seed: None,
            fog_density: 0.1,
            floor_displacement_scale: 0.3,
            floor_displacement_bias: -0.2,
            door_light_intensity: 5.0,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 100.0,
            position: [4.0, 2.0, 5.0],
            enable_damping: true,
            damping_factor: 0.05,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            frame_log_interval: 600,
        }
    }
}

// --- Load / Save ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
                    path: config_path.clone(),
                    source,
                })?;
            let config: Config = ron::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: config_path.clone(),
                source,
            })?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path,
            source,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("width: 1280"));
        assert!(ron_str.contains("grave_count: 50"));
        assert!(ron_str.contains("shadow_map_size: 256"));
    }

    #[test]
    fn test_defaults_match_scene() {
        let config = Config::default();
        assert_eq!(config.scene.door_light_intensity, 5.0);
        assert_eq!(config.scene.fog_density, 0.1);
        assert_eq!(config.scene.floor_displacement_scale, 0.3);
        assert_eq!(config.scene.floor_displacement_bias, -0.2);
        assert_eq!(config.camera.position, [4.0, 2.0, 5.0]);
        assert_eq!(config.camera.fov_y_degrees, 75.0);
        assert_eq!(config.render.max_pixel_ratio, 2.0);
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.scene.grave_seed = Some(7);
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(window: (), render: (), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.scene, SceneConfig::default());
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_missing_field_uses_default() {
        let ron_str = "(scene: (grave_count: 12))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.scene.grave_count, 12);
        assert_eq!(config.scene.fog_density, 0.1);
        assert_eq!(config.scene.assets_dir, PathBuf::from("static"));
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.window.width = 1920;
        config.window.height = 1080;
        config.scene.grave_seed = Some(42);
        config.scene.fog_density = 0.05;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("haunted-house");

        let config = Config::load_or_create(&nested).unwrap();
        assert_eq!(config, Config::default());
        assert!(nested.join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_invalid_ron_produces_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{{not valid}}").unwrap();

        let result = Config::load_or_create(dir.path());
        match result {
            Err(ConfigError::Parse { path, .. }) => assert!(path.ends_with(CONFIG_FILE_NAME)),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_ron_comments_accepted() {
        let ron_str = "// This is a comment\n(\n  // Another comment\n)";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config, Config::default());
    }
}
