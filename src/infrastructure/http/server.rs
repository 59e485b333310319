//! HTTP Server
//!
//! Axum HTTP 服务器启动和配置

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::middleware::error_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;
use crate::config::ServerConfig;

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    /// 创建新的 HTTP 服务器
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// 构建 Router
    pub fn build_router(&self) -> Router {
        // CORS 配置 - 允许所有来源的跨域请求
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .expose_headers(Any)
            .max_age(Duration::from_secs(3600));

        create_routes()
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .layer(middleware::from_fn(error_logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// 启动服务器（带优雅关闭）
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let addr = self.config.addr();

        info!("Starting HTTP server on {} (with graceful shutdown)", addr);

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::voice::VoiceCatalog;
    use crate::infrastructure::adapters::FileAudioStorage;
    use crate::infrastructure::memory::InMemoryProjectStore;
    use crate::infrastructure::persistence::JsonVoiceRegistry;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tempfile::TempDir;
    use tokio::sync::mpsc;
    use tower::util::ServiceExt;

    async fn server(dir: &TempDir, max_body_size: usize) -> (HttpServer, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(4);
        let state = AppState::new(
            "http://localhost:5000",
            Arc::new(InMemoryProjectStore::new(tx)),
            Arc::new(JsonVoiceRegistry::open(dir.path()).await.unwrap()),
            Arc::new(FileAudioStorage::new(dir.path().join("output"))),
            Arc::new(VoiceCatalog::from_ids(["V0"]).unwrap()),
        );
        let config = ServerConfig {
            max_body_size,
            ..ServerConfig::default()
        };
        (HttpServer::new(config, state), rx)
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let dir = TempDir::new().unwrap();
        let (server, _rx) = server(&dir, 1024).await;

        let request = Request::builder()
            .uri("/api/ping")
            .header(header::ORIGIN, "http://example.com")
            .body(Body::empty())
            .unwrap();
        let response = server.build_router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_body_limit() {
        let dir = TempDir::new().unwrap();
        let (server, _rx) = server(&dir, 64).await;

        let body = serde_json::json!({ "text": "字".repeat(200) }).to_string();
        let request = Request::builder()
            .method("POST")
            .uri("/api/audiobook/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = server.build_router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
