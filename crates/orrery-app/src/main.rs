//! Orrery binary entry point.
//!
//! Run with: `cargo run -p orrery-app -- --days-per-second 5`

use clap::Parser;
use orrery_config::{CliArgs, Config};
use tracing::{error, info, warn};

fn main() {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().or_else(|| Config::default_dir().ok());
    let (mut config, load_error) = match config_dir.as_deref().map(Config::load_or_create) {
        Some(Ok(config)) => (config, None),
        Some(Err(err)) => (Config::default(), Some(err)),
        None => (Config::default(), None),
    };
    config.apply_cli_overrides(&args);

    orrery_log::init_logging(
        config.debug.log_dir.as_deref(),
        cfg!(debug_assertions),
        Some(&config),
    );

    // Logging only exists once the config is known, so report load failures now.
    if let Some(err) = load_error {
        warn!("Using default config: {err}");
    }

    info!(
        "Window: {}x{} | {:.1} days/s | textures in {}",
        config.window.width,
        config.window.height,
        config.simulation.days_per_second,
        config.assets.texture_dir.display()
    );

    if let Err(err) = orrery_app::run(config) {
        error!("Fatal: {err}");
        std::process::exit(1);
    }
}
