//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                            GET   健康检查
//! - /api/audiobook/generate              POST  提交生成（返回 task_id）
//! - /api/audiobook/status                POST  查询生成状态
//! - /api/audiobook/cancel                POST  请求取消
//! - /api/audiobook/download/:file_name   GET   下载成品
//! - /api/character/list                  GET   列出角色
//! - /api/character/alias                 POST  登记别名
//! - /api/character/voice                 POST  指定音色
//! - /api/voice/catalog                   GET   音色目录

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/audiobook", audiobook_routes())
        .nest("/character", character_routes())
        .route("/voice/catalog", get(handlers::list_catalog_voices))
}

/// Audiobook 路由
fn audiobook_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate", post(handlers::generate_audiobook))
        .route("/status", post(handlers::query_generation_status))
        .route("/cancel", post(handlers::cancel_generation))
        .route("/download/:file_name", get(handlers::download_audiobook))
}

/// Character 路由
fn character_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", get(handlers::list_characters))
        .route("/alias", post(handlers::add_character_alias))
        .route("/voice", post(handlers::set_character_voice))
}
