use crate::config::LoggingConfig;
use crate::error::AppError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Installs the global subscriber. `RUST_LOG` overrides `logging.level`.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| AppError::Config(format!("Invalid logging.level {:?}: {e}", config.level)))?;

    let registry = Registry::default().with(filter);
    let installed = if config.json {
        registry
            .with(fmt::layer().json().flatten_event(true).with_current_span(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    installed.map_err(|e| AppError::Config(format!("Failed to install tracing subscriber: {e}")))
}

/// Installs the Prometheus recorder behind the `metrics` facade and returns
/// a handle that renders the scrape body.
#[cfg(feature = "prometheus")]
pub fn install_prometheus() -> Result<metrics_exporter_prometheus::PrometheusHandle, AppError> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| AppError::Server(format!("Failed to install Prometheus recorder: {e}")))
}
