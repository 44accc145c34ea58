use std::{net::SocketAddr, sync::Arc};

use symptom_log::summary::{GeminiClient, SummaryProvider};
use symptom_log::weather::OpenMeteoClient;
use symptom_log::{load_data, router, AppState, Config};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    if let Some(parent) = config.data_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let data = load_data(&config.data_path).await;
    let weather = Arc::new(OpenMeteoClient::new(&config.weather_url, config.http_timeout)?);
    let summarizer: Option<Arc<dyn SummaryProvider>> = match &config.gemini_api_key {
        Some(key) => Some(Arc::new(GeminiClient::new(
            &config.gemini_url,
            config.gemini_model.clone(),
            key.clone(),
            config.http_timeout,
        )?)),
        None => {
            warn!("GEMINI_API_KEY not set, AI summaries are disabled");
            None
        }
    };

    let state = AppState::new(config.data_path.clone(), data, weather, summarizer)
        .with_correlation(config.correlation);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
