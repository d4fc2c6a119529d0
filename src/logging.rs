use time::UtcOffset;
use tracing_subscriber::{
    fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

use crate::config::LogConfig;
use crate::errors::RadioError;

pub fn setup_logging(config: &LogConfig) -> Result<(), RadioError> {
    config.validate()?;

    let timer = OffsetTime::new(
        UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        time::format_description::well_known::Rfc3339,
    );

    let base_level = config.get_level_filter();

    let mut env_filter = EnvFilter::default().add_directive(base_level.into());

    // trace_frames turns on the raw TX/RX byte dumps without dragging the
    // rest of the crate down to trace level
    if config.trace_frames {
        env_filter = env_filter
            .add_directive("fazan_control::client=trace".parse().unwrap())
            .add_directive("fazan_control::transport=trace".parse().unwrap());
    }

    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_level(true)
        .with_timer(timer)
        .with_filter(env_filter);

    Registry::default()
        .with(layer)
        .try_init()
        .map_err(|e| RadioError::init(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}
