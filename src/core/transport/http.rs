//! HTTP transport implementation.
//!
//! Serves the MCP Streamable HTTP protocol under the configured path, next to
//! a couple of plain JSON endpoints for operators and load balancers.

use axum::{Json, Router, response::IntoResponse, routing::get};
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Build the axum router serving `server`.
    pub fn router(&self, server: McpServer) -> Router {
        let name = server.name().to_string();
        let version = server.version().to_string();
        let mcp_path = self.config.path.clone();

        let service = StreamableHttpService::new(
            move || Ok(server.clone()),
            LocalSessionManager::default().into(),
            StreamableHttpServerConfig::default(),
        );

        let mut app = Router::new()
            .nest_service(&self.config.path, service)
            .route("/health", get(health_check))
            .route(
                "/",
                get(move || async move {
                    Json(serde_json::json!({
                        "name": name,
                        "version": version,
                        "transport": "Streamable HTTP",
                        "endpoints": {
                            "mcp": mcp_path,
                            "health": "/health"
                        }
                    }))
                }),
            )
            .layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            app = app.layer(cors);
        }

        app
    }

    /// Run the HTTP transport until Ctrl-C.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let app = self.router(server);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!("Ready - listening on {} (CORS {})", addr, cors_status);
        info!("  → MCP:    {}", self.config.path);
        info!("  → Health: GET /health");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP transport stopped");
        Ok(())
    }
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
