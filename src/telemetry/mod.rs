//! Telemetry initialization: metrics and structured logging

pub mod metrics;

use crate::config::{AppEnvironment, TelemetryConfig};
use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
pub fn default_filter(environment: AppEnvironment) -> &'static str {
    if environment.is_production() {
        "storefront_auth=info,tower_http=warn"
    } else {
        "storefront_auth=debug,tower_http=debug"
    }
}

/// Install the tracing subscriber and, when enabled, the Prometheus recorder.
///
/// Returns the handle the `/metrics` endpoint renders from.
pub fn init(config: &TelemetryConfig, environment: AppEnvironment) -> Result<Option<PrometheusHandle>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(environment)));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_format == "json" {
        // Keep `message` and event fields at the top level
        let fmt_layer = tracing_subscriber::fmt::layer().json().flatten_event(true);
        registry.with(fmt_layer).try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }

    let prometheus_handle = if config.metrics_enabled {
        let handle = metrics::install_prometheus_recorder()?;
        metrics::describe_metrics();
        Some(handle)
    } else {
        None
    };

    Ok(prometheus_handle)
}
