//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Orrery command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "orrery", about = "Animated solar system viewer")]
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

    /// Simulated days per real second.
    #[arg(long)]
    pub days_per_second: Option<f64>,

    /// Directory holding body textures.
    #[arg(long)]
    pub texture_dir: Option<PathBuf>,

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
        if let Some(rate) = args.days_per_second {
            self.simulation.days_per_second = rate;
        }
        if let Some(ref dir) = args.texture_dir {
            self.assets.texture_dir = dir.clone();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            width: Some(1920),
            days_per_second: Some(1.0),
            texture_dir: Some(PathBuf::from("textures")),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.window.width, 1920);
        assert_eq!(config.simulation.days_per_second, 1.0);
        assert_eq!(config.assets.texture_dir, PathBuf::from("textures"));
        // Non-overridden fields retain defaults
        assert_eq!(config.window.height, 1024);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from([
            "orrery",
            "--width",
            "800",
            "--days-per-second",
            "3.5",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.width, Some(800));
        assert_eq!(args.days_per_second, Some(3.5));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.config.is_none());
    }
}
