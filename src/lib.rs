// PreventAI core library
// Health risk assessment API with model-written reports and rule-based fallback

pub mod api;
pub mod services;
pub mod settings;

use anyhow::Context;
use tokio::net::TcpListener;

/// Start the PreventAI API server and run until Ctrl-C.
pub async fn run() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logging();

    let settings = settings::load().context("Failed to load settings")?;
    let bind_addr = settings.bind_addr.clone();
    let state = api::AppState::new(settings);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    log::info!("PreventAI API listening on http://{}", bind_addr);

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    log::info!("PreventAI API stopped");
    Ok(())
}

/// `RUST_LOG` wins; `LOG_LEVEL` is honoured when it is unset.
fn init_logging() {
    let default_level = std::env::var("LOG_LEVEL")
        .map(|level| level.to_lowercase())
        .unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
