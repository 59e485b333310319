//! Generation Query Handlers

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{AudioFormat, AudioStoragePort, ProjectRecord, ProjectStorePort};
use crate::application::queries::generation_queries::{
    AudiobookFile, GetAudiobookFile, QueryGenerationStatus,
};
use crate::domain::project::ProjectState;

// ============================================================================
// Response DTOs
// ============================================================================

/// 生成状态响应
#[derive(Debug, Clone, Serialize)]
pub struct GenerationStatusResponse {
    pub handle: String,
    pub project_id: String,
    pub state: ProjectState,
    pub progress: String,
    pub output_file: Option<String>,
    pub error_message: Option<String>,
    pub clip_count: usize,
    pub skipped_count: usize,
    pub cancel_requested: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ProjectRecord> for GenerationStatusResponse {
    fn from(record: ProjectRecord) -> Self {
        Self {
            handle: record.handle,
            project_id: record.project_id.to_string(),
            state: record.state,
            progress: record.progress,
            output_file: record.output_file,
            error_message: record.error_message,
            clip_count: record.clip_count,
            skipped_count: record.skipped_count,
            cancel_requested: record.cancel_requested,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// QueryGenerationStatus Handler
pub struct QueryGenerationStatusHandler {
    store: Arc<dyn ProjectStorePort>,
}

impl QueryGenerationStatusHandler {
    pub fn new(store: Arc<dyn ProjectStorePort>) -> Self {
        Self { store }
    }

    pub fn handle(
        &self,
        query: QueryGenerationStatus,
    ) -> Result<GenerationStatusResponse, ApplicationError> {
        self.store
            .get(&query.handle)
            .map(GenerationStatusResponse::from)
            .ok_or_else(|| ApplicationError::not_found("Project", query.handle))
    }
}

/// GetAudiobookFile Handler - 定位成品文件
pub struct GetAudiobookFileHandler {
    storage: Arc<dyn AudioStoragePort>,
}

impl GetAudiobookFileHandler {
    pub fn new(storage: Arc<dyn AudioStoragePort>) -> Self {
        Self { storage }
    }

    pub async fn handle(&self, query: GetAudiobookFile) -> Result<AudiobookFile, ApplicationError> {
        let path = self.storage.resolve_download(&query.file_name).await?;
        let format = Path::new(&query.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(AudioFormat::from_extension)
            .ok_or_else(|| {
                ApplicationError::validation(format!("Invalid file name: {}", query.file_name))
            })?;

        tracing::debug!(
            file_name = %query.file_name,
            path = %path.display(),
            "Audiobook file resolved"
        );

        Ok(AudiobookFile {
            file_name: query.file_name,
            path,
            content_type: format.content_type(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project::ProjectId;
    use crate::infrastructure::adapters::FileAudioStorage;
    use crate::infrastructure::memory::InMemoryProjectStore;
    use tempfile::tempdir;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_status_query() {
        let (tx, _rx) = mpsc::channel(8);
        let store = Arc::new(InMemoryProjectStore::new(tx));
        let handle = store
            .submit(ProjectRecord::new(ProjectId::new("book").unwrap()), "正文".to_string())
            .unwrap();

        let handler = QueryGenerationStatusHandler::new(store.clone());
        let status = handler
            .handle(QueryGenerationStatus {
                handle: handle.clone(),
            })
            .unwrap();
        assert_eq!(status.project_id, "book");
        assert_eq!(status.state, ProjectState::Queued);
        assert!(status.output_file.is_none());

        let missing = handler.handle(QueryGenerationStatus {
            handle: "unknown".to_string(),
        });
        assert!(matches!(missing, Err(ApplicationError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_download() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(FileAudioStorage::new(dir.path()));
        let saved = storage
            .save_final(&ProjectId::new("book").unwrap(), AudioFormat::Wav, b"RIFF....")
            .await
            .unwrap();

        let handler = GetAudiobookFileHandler::new(storage);
        let file = handler
            .handle(GetAudiobookFile {
                file_name: "final_audiobook_book.wav".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(file.path, saved);
        assert_eq!(std::fs::read(&file.path).unwrap(), b"RIFF....");
        assert_eq!(file.content_type, "audio/wav");

        let missing = handler
            .handle(GetAudiobookFile {
                file_name: "final_audiobook_other.mp3".to_string(),
            })
            .await;
        assert!(matches!(missing, Err(ApplicationError::NotFound { .. })));

        let traversal = handler
            .handle(GetAudiobookFile {
                file_name: "../secret.mp3".to_string(),
            })
            .await;
        assert!(matches!(traversal, Err(ApplicationError::ValidationError(_))));
    }
}
