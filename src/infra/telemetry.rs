use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install the global tracing subscriber and register metric descriptions.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default());

    let installed = match logging.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(true))
            .try_init(),
    };

    installed
        .map_err(|err| InfraError::telemetry(format!("tracing subscriber install: {err}")))
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "foglio_page_cache_hit_total",
            Unit::Count,
            "Total number of rendered-page cache hits."
        );
        describe_counter!(
            "foglio_page_cache_miss_total",
            Unit::Count,
            "Total number of rendered-page cache misses."
        );
        describe_counter!(
            "foglio_page_cache_evict_total",
            Unit::Count,
            "Total number of rendered-page cache evictions due to capacity."
        );
        describe_counter!(
            "foglio_revalidate_total",
            Unit::Count,
            "Total number of webhook-triggered revalidations."
        );
    });
}
