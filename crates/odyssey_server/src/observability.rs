//! Structured logging setup.

use crate::config::ServerSection;
use odyssey_error::{ConfigError, OdysseyResult};
use tracing_subscriber::{
    EnvFilter,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured log level applies.
/// JSON output is meant for production log shipping.
pub fn init_logging(server: &ServerSection) -> OdysseyResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&server.log_level))
        .map_err(|e| {
            ConfigError::invalid(
                "server.log_level",
                format!("is not a valid filter: '{}' ({})", server.log_level, e),
            )
        })?;

    let fmt_layer = if server.json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to install tracing subscriber: {}", e)))?;

    Ok(())
}
