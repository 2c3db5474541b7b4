mod error;
mod routes;
mod state;

use anyhow::Context;
use constancias::Settings;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "constancias=info,constancias_server=info,tower_http=info".into()
            }),
        )
        .init();

    let settings = Settings::from_env().context("invalid configuration")?;
    let addr = format!("{}:{}", settings.host, settings.port);

    if !constancias::StudentDirectory::new(&settings.data_dir).exists() {
        tracing::warn!(
            data_dir = %settings.data_dir.display(),
            "base_datos.xlsx not found, lookups will fail until one is uploaded"
        );
    }

    let state = Arc::new(state::AppState::new(settings)?);
    let app = routes::router(state);

    tracing::info!("constancias listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
