//! Structured logging for skylight.
//!
//! Console output with uptime timestamps and module paths, plus an optional
//! JSON file log in debug builds. The level comes from `RUST_LOG` when set,
//! otherwise from `config.debug.log_level`.

use std::fs::File;
use std::path::Path;

use skylight_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config supplies one.
pub const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "skylight.log";

/// Resolve the filter directive string from the config.
pub fn filter_directives(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => {
            config.debug.log_level.trim().to_string()
        }
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - enables the file layer
/// * `config` - optional configuration supplying the log level
///
/// Calling this twice is harmless: the second install attempt is ignored.
///
/// ```no_run
/// use skylight_log::init_logging;
/// use skylight_config::Config;
///
/// let config = Config::default();
/// init_logging(None, false, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));

    // Worker threads are unnamed; the thread id tells table-build bands apart.
    let console = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_timer(fmt::time::uptime());
    let json_file = log_dir
        .filter(|_| debug_build)
        .and_then(open_log_file)
        .map(|file| {
            fmt::layer()
                .json()
                .with_writer(file)
                .with_ansi(false)
                .with_timer(fmt::time::uptime())
        });

    // `Option<Layer>` is itself a layer; `None` disables the file output.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(json_file)
        .try_init();
}

/// Create `log_dir` and truncate the JSON log inside it.
fn open_log_file(log_dir: &Path) -> Option<File> {
    std::fs::create_dir_all(log_dir).ok()?;
    File::create(log_dir.join(LOG_FILE_NAME)).ok()
}

/// `EnvFilter` built from [`DEFAULT_FILTER`].
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}
