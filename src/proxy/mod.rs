//! CORS-enabled relay endpoints for backends a browser can't call directly.

pub mod aliyun;
pub mod google;

use crate::config::Config;
use crate::error::{QuicktransError, Result};
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use reqwest::Client;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct ProxyState {
    pub client: Client,
    /// DashScope chat-completions URL.
    pub upstream_url: String,
}

impl ProxyState {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            upstream_url: config.dashscope_url.clone(),
        }
    }
}

pub fn router(state: ProxyState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/aliyun-proxy", post(aliyun::aliyun_proxy))
        .route("/api/google-translate", post(google::google_translate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already-bound listener until the future resolves or Ctrl+C.
pub async fn serve_on(listener: TcpListener, state: ProxyState) -> Result<()> {
    let addr = listener.local_addr()?;
    info!("Proxy listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Proxy stopped");
    Ok(())
}

pub async fn serve(config: &Config) -> Result<()> {
    let listener = TcpListener::bind(&config.listen_addr).await.map_err(|e| {
        QuicktransError::Config(format!("Cannot listen on {}: {}", config.listen_addr, e))
    })?;
    serve_on(listener, ProxyState::new(config)).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
