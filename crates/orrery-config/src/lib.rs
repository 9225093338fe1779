//! Configuration for the orrery viewer.
//!
//! Settings persist to disk as a RON file and can be overridden from the
//! command line. Missing fields fall back to defaults so older files keep
//! loading after new settings are added.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AssetConfig, CONFIG_FILE_NAME, CameraConfig, Config, DebugConfig, InputConfig, RenderConfig,
    SimulationConfig, WindowConfig,
};
pub use error::ConfigError;
