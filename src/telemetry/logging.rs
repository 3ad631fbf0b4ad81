use tracing::Level;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::config::Config;
use crate::error::Error;

/// Initialize the logging system.
///
/// Logs go to stderr so command output on stdout stays clean. `RUST_LOG`
/// directives are honoured on top of the configured level.
pub fn init_logging(config: &Config) -> Result<(), Error> {
    let log_level = parse_level(&config.general.log_level);

    let filter = EnvFilter::from_default_env()
        .add_directive(log_level.into());

    let registry = Registry::default().with(filter);

    let result = if config.general.structured_logging {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .try_init()
    };

    result.map_err(|e| Error::Internal(format!("Failed to set global default subscriber: {}", e)))
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Create a test logging subscriber; safe to call from several tests
#[cfg(test)]
pub fn init_test_logging() {
    let filter = EnvFilter::from_default_env()
        .add_directive(Level::DEBUG.into());

    let fmt_layer = fmt::layer()
        .with_test_writer()
        .with_target(true)
        .with_ansi(false);

    let _ = Registry::default()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
