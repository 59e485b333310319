//! Audiobook Handlers - 提交生成、查询状态、取消、下载成品

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::application::{
    CancelGeneration, GenerationStatusResponse, GetAudiobookFile, QueryGenerationStatus,
    SubmitGeneration,
};
use crate::domain::project::ProjectState;
use crate::infrastructure::http::dto::{download_url, ApiResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Generate
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub text: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponseDto {
    pub task_id: String,
    pub project_id: String,
    pub state: ProjectState,
}

pub async fn generate_audiobook(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<GenerateResponseDto>>, ApiError> {
    let cmd = SubmitGeneration {
        text: req.text,
        project_id: req.project_id,
    };

    let result = state.submit_generation_handler.handle(cmd)?;

    Ok(Json(ApiResponse::success(GenerateResponseDto {
        task_id: result.handle,
        project_id: result.project_id,
        state: result.state,
    })))
}

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    pub task_id: String,
}

#[derive(Debug, Serialize)]
pub struct GenerationStatusDto {
    pub task_id: String,
    pub project_id: String,
    pub state: ProjectState,
    pub progress: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub clip_count: usize,
    pub skipped_count: usize,
    pub cancel_requested: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl GenerationStatusDto {
    fn new(status: GenerationStatusResponse, base_url: &str) -> Self {
        Self {
            download_url: status
                .output_file
                .as_deref()
                .map(|file| download_url(base_url, file)),
            task_id: status.handle,
            project_id: status.project_id,
            state: status.state,
            progress: status.progress,
            error: status.error_message,
            clip_count: status.clip_count,
            skipped_count: status.skipped_count,
            cancel_requested: status.cancel_requested,
            created_at: status.created_at,
            updated_at: status.updated_at,
        }
    }
}

pub async fn query_generation_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TaskRequest>,
) -> Result<Json<ApiResponse<GenerationStatusDto>>, ApiError> {
    let status = state
        .query_generation_status_handler
        .handle(QueryGenerationStatus { handle: req.task_id })?;

    Ok(Json(ApiResponse::success(GenerationStatusDto::new(
        status,
        &state.base_url,
    ))))
}

// ============================================================================
// Cancel
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CancelResponseDto {
    pub task_id: String,
    pub state: ProjectState,
    pub cancel_requested: bool,
}

pub async fn cancel_generation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TaskRequest>,
) -> Result<Json<ApiResponse<CancelResponseDto>>, ApiError> {
    let result = state
        .cancel_generation_handler
        .handle(CancelGeneration { handle: req.task_id })?;

    Ok(Json(ApiResponse::success(CancelResponseDto {
        task_id: result.handle,
        state: result.state,
        cancel_requested: result.cancel_requested,
    })))
}

// ============================================================================
// Download
// ============================================================================

pub async fn download_audiobook(
    State(state): State<Arc<AppState>>,
    Path(file_name): Path<String>,
) -> Result<Response, ApiError> {
    let file = state
        .get_audiobook_file_handler
        .handle(GetAudiobookFile { file_name })
        .await?;

    // 文件可能在定位之后被删除
    let handle = tokio::fs::File::open(&file.path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ApiError::NotFound(format!("File not found: {}", file.file_name))
        } else {
            ApiError::Internal(format!("Failed to open audiobook: {}", e))
        }
    })?;
    let file_size = handle
        .metadata()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to get file metadata: {}", e)))?
        .len();

    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_LENGTH, file_size.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(ReaderStream::new(handle)),
    )
        .into_response())
}
