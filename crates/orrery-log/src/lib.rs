//! Structured logging for the orrery viewer.
//!
//! Console output goes through `tracing-subscriber` with uptime timestamps and
//! module targets. Debug builds can additionally write JSON lines to a file for
//! post-mortem analysis. The filter honours `RUST_LOG` first, then the
//! configured log level.

use orrery_config::Config;
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config names a level.
pub const DEFAULT_FILTER: &str = "info,wgpu=warn,naga=warn";

/// Name of the JSON log file created inside `log_dir`.
pub const LOG_FILE_NAME: &str = "orrery.log";

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - whether file logging is enabled
/// * `config` - optional configuration supplying `debug.log_level`
///
/// ```no_run
/// use orrery_log::init_logging;
///
/// init_logging(Some(std::path::Path::new("./logs")), true, None);
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = filter_string(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE_NAME))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// Filter directive derived from the config, keeping GPU crates quiet.
///
/// A bare level such as `"debug"` becomes `"debug,wgpu=warn,naga=warn"`;
/// anything containing an explicit directive is passed through unchanged.
pub fn filter_string(config: Option<&Config>) -> String {
    match config.map(|c| c.debug.log_level.trim()) {
        Some(level) if !level.is_empty() && level.contains(['=', ',']) => level.to_string(),
        Some(level) if !level.is_empty() => format!("{level},wgpu=warn,naga=warn"),
        _ => DEFAULT_FILTER.to_string(),
    }
}
