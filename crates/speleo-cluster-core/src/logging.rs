//! Tracing subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{CoreError, CoreResult};

/// Build the level filter: `RUST_LOG` when set, otherwise `config.level`.
pub fn env_filter(config: &LoggingConfig) -> CoreResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            CoreError::LoggingError(format!("invalid log level '{}': {}", config.level, e))
        }),
    }
}

/// Install the global fmt subscriber.
///
/// # Errors
///
/// `CoreError::LoggingError` if the level directive does not parse or a
/// global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> CoreResult<()> {
    let filter = env_filter(config)?;
    let builder = fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    let installed = match config.format.as_str() {
        "compact" => builder.compact().try_init(),
        _ => builder.pretty().try_init(),
    };
    installed.map_err(|e| CoreError::LoggingError(e.to_string()))
}
