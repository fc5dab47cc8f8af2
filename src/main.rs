use anyhow::Context;
use ddg_gateway::api::create_router;
use ddg_gateway::backend::DuckDuckGo;
use ddg_gateway::backend::duckduckgo::ClientSettings;
use ddg_gateway::config::Config;
use ddg_gateway::query_engine::QueryEngine;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .with_target(true)
        .init();

    let backend = DuckDuckGo::new(ClientSettings::from(&config));
    let query_engine = Arc::new(QueryEngine::new(backend));
    let app = create_router(query_engine);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    tracing::info!("listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
