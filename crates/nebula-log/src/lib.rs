//! Structured logging for the Nebula biome generator.
//!
//! Installs a `tracing` subscriber with console output and, in debug builds,
//! a JSON log file. The level comes from `RUST_LOG` when set, otherwise from
//! the `debug.log_level` config setting.

use nebula_config::Config;
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// File written inside the log directory in debug builds.
pub const LOG_FILE_NAME: &str = "nebula-biomes.log";

/// Filter used when neither `RUST_LOG` nor the config names a level.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Initialize the global tracing subscriber.
///
/// Sets up:
/// - Console output with uptime timestamps, targets, and levels
/// - JSON file logging into `log_dir` in debug builds
/// - Filtering from `RUST_LOG`, falling back to [`filter_directive`]
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
///
/// # Examples
///
/// ```no_run
/// use nebula_log::init_logging;
/// use nebula_config::Config;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = filter_directive(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
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

/// Filter directive derived from the config's `debug.log_level`.
///
/// Blank or missing settings fall back to [`DEFAULT_DIRECTIVE`].
pub fn filter_directive(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => {
            config.debug.log_level.trim().to_string()
        }
        _ => DEFAULT_DIRECTIVE.to_string(),
    }
}

/// An `EnvFilter` with the default directive.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_DIRECTIVE)
}
