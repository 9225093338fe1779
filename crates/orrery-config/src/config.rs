//! Configuration structs with sensible defaults and RON persistence.

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
    /// Camera settings.
    pub camera: CameraConfig,
    /// Input settings.
    pub input: InputConfig,
    /// Simulation clock settings.
    pub simulation: SimulationConfig,
    /// Asset locations.
    pub assets: AssetConfig,
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
    /// Linear RGB clear color.
    pub clear_color: [f64; 3],
    /// Near clip plane distance.
    pub near: f32,
    /// Far clip plane distance.
    pub far: f32,
    /// Longitude subdivisions of every sphere mesh.
    pub sphere_sectors: u32,
    /// Latitude subdivisions of every sphere mesh.
    pub sphere_stacks: u32,
    /// Radius of the background sphere centered on the camera.
    pub sky_radius: f32,
}

/// Fly camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Initial vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Movement speed in scene units per second.
    pub move_speed: f32,
    /// Field-of-view change per second of held zoom key, as a multiple of `move_speed`.
    pub zoom_rate: f32,
    /// Initial camera position.
    pub position: [f32; 3],
}

/// Input configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Degrees of yaw/pitch per pixel of mouse motion.
    pub mouse_sensitivity: f32,
    /// Invert Y axis for camera.
    pub invert_y: bool,
}

/// Simulation clock configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated days per real second.
    pub days_per_second: f64,
    /// Day the clock starts at.
    pub start_day: f64,
    /// Start with the clock frozen.
    pub paused: bool,
}

/// Where textures and shaders are loaded from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory holding body and background textures.
    pub texture_dir: PathBuf,
    /// Directory holding WGSL shader sources.
    pub shader_dir: PathBuf,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Directory for JSON log files in debug builds.
    pub log_dir: Option<PathBuf>,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            fullscreen: false,
            vsync: true,
            title: "Orrery".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.1, 0.1, 0.1],
            near: 0.1,
            far: 100.0,
            sphere_sectors: 36,
            sphere_stacks: 18,
            sky_radius: 20.0,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            move_speed: 2.5,
            zoom_rate: 20.0,
            position: [0.0, 1.0, 10.0],
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 0.08,
            invert_y: false,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            days_per_second: 10.0,
            start_day: 0.0,
            paused: false,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            texture_dir: PathBuf::from("assets/textures"),
            shader_dir: PathBuf::from("assets/shaders"),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Platform config directory for the viewer (`<config_dir>/orrery`).
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("orrery"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
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
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }
}
