use time::UtcOffset;
use tracing_subscriber::{
    fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

use crate::config::LoggingConfig;
use crate::errors::StackError;

pub fn setup_logging(config: &LoggingConfig) -> Result<(), StackError> {
    config.validate().map_err(StackError::Config)?;

    let timer = OffsetTime::new(
        UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        time::format_description::well_known::Rfc3339,
    );

    // RUST_LOG still wins over the configured level
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(config.get_level_filter().into()));

    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_level(true)
        .with_timer(timer)
        .with_filter(env_filter);

    Registry::default()
        .with(layer)
        .try_init()
        .map_err(|e| StackError::Init(format!("failed to initialize logging: {}", e)))?;

    Ok(())
}
