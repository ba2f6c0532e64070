use std::path::Path;
use std::sync::Once;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_LOG_LEVEL: &str = "info";
const ENV_VAR_NAME: &str = "VENUESCOUT_LOG";

static INIT: Once = Once::new();

/// Initialize the global tracing subscriber.
///
/// Human-readable compact output goes to stderr, filtered with precedence
/// `VENUESCOUT_LOG` env var > `log_level` argument > `info`. When
/// `log_file` is set, unfiltered structured JSON is appended there as
/// well (parent directories are created). Safe to call more than once;
/// only the first call installs the subscriber.
pub fn init(log_level: Option<&str>, log_file: Option<&Path>) -> anyhow::Result<()> {
    let mut init_err: Option<anyhow::Error> = None;

    INIT.call_once(|| {
        if let Err(e) = try_init(log_level, log_file) {
            init_err = Some(e);
        }
    });

    match init_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn try_init(log_level: Option<&str>, log_file: Option<&Path>) -> anyhow::Result<()> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(true)
        .compact()
        .with_filter(build_filter(log_level));

    let registry = tracing_subscriber::registry().with(stderr_layer);

    let result = match log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(file.with_max_level(Level::TRACE))
                .with_target(false)
                .with_ansi(false)
                .json();
            registry.with(file_layer).try_init()
        }
        None => registry.try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}

fn build_filter(log_level: Option<&str>) -> EnvFilter {
    // The env var takes highest precedence (EnvFilter::try_from_env).
    EnvFilter::try_from_env(ENV_VAR_NAME)
        .unwrap_or_else(|_| EnvFilter::new(log_level.unwrap_or(DEFAULT_LOG_LEVEL)))
}

fn open_log_file(path: &Path) -> anyhow::Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("failed to create log directory {}: {e}", parent.display())
            })?;
        }
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow::anyhow!("failed to open log file {}: {e}", path.display()))
}
