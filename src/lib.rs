pub mod auth;
pub mod config;
pub mod error;
pub mod google;
pub mod logging;
pub mod model;
pub mod server;
pub mod state;
pub mod tools;

pub use config::{CliArgs, ServerConfig, TransportKind};
pub use error::{ErrorCode, to_rmcp_error};
pub use logging::{LoggingConfig, init_logging};
pub use server::GoogleSheetsServer;
pub use state::{AppState, ServiceConnector};

use anyhow::Result;
use axum::Router;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use std::sync::Arc;
use tokio::net::TcpListener;

const HTTP_SERVICE_PATH: &str = "/mcp";

pub async fn run_server(config: ServerConfig) -> Result<()> {
    let config = Arc::new(config);
    let state = Arc::new(AppState::new(config.clone()));

    tracing::info!(
        transport = %config.transport,
        default_folder = config.default_folder_id.as_deref().unwrap_or("root"),
        "starting Google Sheets MCP server",
    );

    match config.transport {
        TransportKind::Stdio => {
            let server = GoogleSheetsServer::from_state(state);
            server.run_stdio().await
        }
        TransportKind::Http => run_stream_http_transport(config, state).await,
    }
}

async fn health_handler() -> (axum::http::StatusCode, &'static str) {
    (axum::http::StatusCode::OK, "ok")
}

async fn run_stream_http_transport(config: Arc<ServerConfig>, state: Arc<AppState>) -> Result<()> {
    let bind_addr = config.http_bind_address;
    let service_state = state.clone();
    let service = StreamableHttpService::new(
        move || Ok(GoogleSheetsServer::from_state(service_state.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let router = Router::new()
        .nest_service(HTTP_SERVICE_PATH, service)
        .route("/health", axum::routing::get(health_handler));
    let listener = TcpListener::bind(bind_addr).await?;
    let actual_addr = listener.local_addr()?;
    tracing::info!(transport = "http", bind = %actual_addr, path = HTTP_SERVICE_PATH, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::error!(?error, "failed to listen for shutdown signal");
            }
        })
        .await
        .map_err(anyhow::Error::from)
}
