use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::metrics::{
    METRIC_ADMIN_LOGINS, METRIC_COMPENSATIONS, METRIC_POSTS_CREATED, METRIC_POSTS_TOGGLED,
    METRIC_UPLOADS_STORED,
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
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
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

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_POSTS_CREATED,
            Unit::Count,
            "Total number of posts created, labelled by visibility."
        );
        describe_counter!(
            METRIC_POSTS_TOGGLED,
            Unit::Count,
            "Total number of post visibility toggles."
        );
        describe_counter!(
            METRIC_UPLOADS_STORED,
            Unit::Count,
            "Total number of images written to blob storage, labelled by bucket."
        );
        describe_counter!(
            METRIC_COMPENSATIONS,
            Unit::Count,
            "Total number of rollback steps run after a partial failure."
        );
        describe_counter!(
            METRIC_ADMIN_LOGINS,
            Unit::Count,
            "Total number of admin sign-in attempts, labelled by outcome."
        );
    });
}
