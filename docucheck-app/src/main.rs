use anyhow::{Context, Result};
use docucheck_app::{bootstrap, config, server, telemetry};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let path = config::config_path(
        std::env::args().nth(1),
        std::env::var(config::CONFIG_ENV).ok(),
    );
    let config = config::load_config(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    telemetry::init_tracing(&config.logging)?;

    let registry = Arc::new(bootstrap::build_registry(&config.audit, bootstrap::default_sink())?);
    let app = server::router(registry, config.server.max_body_bytes);

    #[cfg(feature = "prometheus")]
    let app = {
        let handle = telemetry::install_prometheus()?;
        app.route(
            "/metrics",
            axum::routing::get(move || std::future::ready(handle.render())),
        )
    };

    server::serve(config.bind_addr()?, app).await?;
    Ok(())
}
