//! Generation Command Handlers

use std::sync::Arc;

use crate::application::commands::generation_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{ProjectRecord, ProjectStoreError, ProjectStorePort};
use crate::domain::project::ProjectId;

/// SubmitGeneration Handler - 登记项目并排队
pub struct SubmitGenerationHandler {
    store: Arc<dyn ProjectStorePort>,
}

impl SubmitGenerationHandler {
    pub fn new(store: Arc<dyn ProjectStorePort>) -> Self {
        Self { store }
    }

    pub fn handle(&self, cmd: SubmitGeneration) -> Result<SubmitGenerationResponse, ApplicationError> {
        if cmd.text.trim().is_empty() {
            return Err(ApplicationError::validation("Text must not be empty"));
        }

        let project_id = match cmd.project_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => {
                ProjectId::new(id).map_err(|e| ApplicationError::validation(e.to_string()))?
            }
            _ => ProjectId::generate(),
        };

        let record = ProjectRecord::new(project_id.clone());
        let state = record.state;
        let handle = self.store.submit(record, cmd.text).map_err(|e| match e {
            ProjectStoreError::QueueUnavailable(msg) => ApplicationError::BackendUnavailable(
                format!("Generation queue unavailable: {}", msg),
            ),
            ProjectStoreError::AlreadyExists(id) => ApplicationError::validation(format!(
                "Project '{}' is already queued or generating",
                id
            )),
            other => other.into(),
        })?;

        tracing::info!(
            handle = %handle,
            project_id = %project_id,
            "Generation submitted"
        );

        Ok(SubmitGenerationResponse {
            handle,
            project_id: project_id.to_string(),
            state,
        })
    }
}

/// CancelGeneration Handler - 设置协作式取消标记
pub struct CancelGenerationHandler {
    store: Arc<dyn ProjectStorePort>,
}

impl CancelGenerationHandler {
    pub fn new(store: Arc<dyn ProjectStorePort>) -> Self {
        Self { store }
    }

    pub fn handle(&self, cmd: CancelGeneration) -> Result<CancelGenerationResponse, ApplicationError> {
        let cancel_requested = self.store.request_cancel(&cmd.handle)?;
        let record = self
            .store
            .get(&cmd.handle)
            .ok_or_else(|| ApplicationError::not_found("Project", &cmd.handle))?;

        Ok(CancelGenerationResponse {
            handle: cmd.handle,
            state: record.state,
            cancel_requested,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project::ProjectState;
    use crate::infrastructure::memory::InMemoryProjectStore;
    use tokio::sync::mpsc;

    fn store() -> (Arc<InMemoryProjectStore>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(8);
        (Arc::new(InMemoryProjectStore::new(tx)), rx)
    }

    #[tokio::test]
    async fn test_submit_with_default_project_id() {
        let (store, mut rx) = store();
        let handler = SubmitGenerationHandler::new(store.clone());

        let response = handler
            .handle(SubmitGeneration {
                text: "小明说：你好。".to_string(),
                project_id: None,
            })
            .unwrap();

        assert!(response.project_id.starts_with("api_audiobook_"));
        assert_eq!(response.project_id.len(), "api_audiobook_".len() + 8);
        assert_eq!(response.state, ProjectState::Queued);
        assert_eq!(rx.try_recv().unwrap(), response.handle);
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let (store, _rx) = store();
        let handler = SubmitGenerationHandler::new(store);

        let blank = handler.handle(SubmitGeneration {
            text: "  \n ".to_string(),
            project_id: None,
        });
        assert!(matches!(blank, Err(ApplicationError::ValidationError(_))));

        let traversal = handler.handle(SubmitGeneration {
            text: "正文".to_string(),
            project_id: Some("../etc".to_string()),
        });
        assert!(matches!(traversal, Err(ApplicationError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_duplicate_running_project_id_is_rejected() {
        let (store, mut rx) = store();
        let handler = SubmitGenerationHandler::new(store.clone());
        let submit = |text: &str| {
            handler.handle(SubmitGeneration {
                text: text.to_string(),
                project_id: Some("book".to_string()),
            })
        };

        let first = submit("第一版").unwrap();
        let second = submit("第二版");
        assert!(matches!(second, Err(ApplicationError::ValidationError(_))));
        assert_eq!(rx.try_recv().unwrap(), first.handle);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancel() {
        let (store, _rx) = store();
        let submitted = SubmitGenerationHandler::new(store.clone())
            .handle(SubmitGeneration {
                text: "正文".to_string(),
                project_id: Some("book".to_string()),
            })
            .unwrap();

        let handler = CancelGenerationHandler::new(store);
        let response = handler
            .handle(CancelGeneration {
                handle: submitted.handle.clone(),
            })
            .unwrap();
        assert!(response.cancel_requested);
        assert_eq!(response.state, ProjectState::Queued);

        let missing = handler.handle(CancelGeneration {
            handle: "nope".to_string(),
        });
        assert!(matches!(missing, Err(ApplicationError::NotFound { .. })));
    }
}
