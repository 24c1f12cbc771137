use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for every metric the crate emits. Idempotent.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "courier_intake_admission_granted_total",
            Unit::Count,
            "Total number of admission checks that were granted."
        );
        describe_counter!(
            "courier_intake_admission_denied_total",
            Unit::Count,
            "Total number of admission checks rejected inside the cooldown window."
        );
        describe_counter!(
            "courier_intake_admission_cleared_total",
            Unit::Count,
            "Total number of full admission-table sweeps."
        );
        describe_counter!(
            "courier_intake_cache_rejected_total",
            Unit::Count,
            "Total number of cache appends and removals rejected for unregistered keys."
        );
        describe_counter!(
            "courier_intake_scan_total",
            Unit::Count,
            "Total number of frame cycles, labelled by scan intent."
        );
        describe_counter!(
            "courier_intake_vision_failure_total",
            Unit::Count,
            "Total number of failed vision calls, labelled by reason."
        );
        describe_histogram!(
            "courier_intake_vision_latency_ms",
            Unit::Milliseconds,
            "Vision call latency in milliseconds."
        );
    });
}
