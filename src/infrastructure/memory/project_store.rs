//! In-Memory Project Store Implementation
//!
//! 每个生成请求一条状态记录，按句柄查询；提交时把句柄放入有界队列交给 GenerationWorker
//!
//! 同一个 project_id 同时只能有一个未结束的项目，它们共用片段目录和成品路径

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::application::ports::{CompletionInfo, ProjectRecord, ProjectStoreError, ProjectStorePort};
use crate::domain::project::ProjectState;

/// 内存项目状态存储
pub struct InMemoryProjectStore {
    /// handle -> ProjectRecord
    records: DashMap<String, ProjectRecord>,
    /// handle -> 待处理原文（worker 取走后删除）
    inputs: DashMap<String, String>,
    /// project_id -> 未结束项目的 handle
    active: DashMap<String, String>,
    /// 生成队列发送端
    queue_sender: mpsc::Sender<String>,
}

impl InMemoryProjectStore {
    pub fn new(queue_sender: mpsc::Sender<String>) -> Self {
        Self {
            records: DashMap::new(),
            inputs: DashMap::new(),
            active: DashMap::new(),
            queue_sender,
        }
    }

    fn transition(
        &self,
        handle: &str,
        next: ProjectState,
        update: impl FnOnce(&mut ProjectRecord),
    ) -> Result<(), ProjectStoreError> {
        let mut record = self
            .records
            .get_mut(handle)
            .ok_or_else(|| ProjectStoreError::NotFound(handle.to_string()))?;

        let old_state = record.state;
        record.state = old_state.transition(next)?;
        update(&mut record);
        record.updated_at = Utc::now();

        tracing::debug!(
            handle = %handle,
            project_id = %record.project_id,
            old_state = %old_state,
            new_state = %next,
            "Project state changed"
        );

        if next.is_terminal() {
            let project_id = record.project_id.to_string();
            drop(record);
            self.release(&project_id, handle);
        }
        Ok(())
    }

    /// 释放 project_id 占用（只释放本 handle 持有的）
    fn release(&self, project_id: &str, handle: &str) {
        self.active.remove_if(project_id, |_, owner| owner == handle);
    }
}

impl ProjectStorePort for InMemoryProjectStore {
    fn submit(&self, record: ProjectRecord, text: String) -> Result<String, ProjectStoreError> {
        let handle = record.handle.clone();
        if self.records.contains_key(&handle) {
            return Err(ProjectStoreError::AlreadyExists(handle));
        }

        let project_id = record.project_id.clone();
        match self.active.entry(project_id.to_string()) {
            Entry::Occupied(entry) => {
                tracing::warn!(
                    project_id = %project_id,
                    running_handle = %entry.get(),
                    "Project id already in progress"
                );
                return Err(ProjectStoreError::AlreadyExists(project_id.to_string()));
            }
            Entry::Vacant(entry) => {
                entry.insert(handle.clone());
            }
        }

        self.records.insert(handle.clone(), record);
        self.inputs.insert(handle.clone(), text);

        if let Err(e) = self.queue_sender.try_send(handle.clone()) {
            tracing::warn!(handle = %handle, error = %e, "Failed to enqueue project");
            self.records.remove(&handle);
            self.inputs.remove(&handle);
            self.release(project_id.as_str(), &handle);
            return Err(ProjectStoreError::QueueUnavailable(e.to_string()));
        }

        tracing::info!(handle = %handle, project_id = %project_id, "Project queued");
        Ok(handle)
    }

    fn get(&self, handle: &str) -> Option<ProjectRecord> {
        self.records.get(handle).map(|r| r.clone())
    }

    fn take_input(&self, handle: &str) -> Option<String> {
        self.inputs.remove(handle).map(|(_, text)| text)
    }

    fn set_state(&self, handle: &str, state: ProjectState) -> Result<(), ProjectStoreError> {
        self.transition(handle, state, |_| {})
    }

    fn set_progress(&self, handle: &str, progress: String) {
        if let Some(mut record) = self.records.get_mut(handle) {
            if !record.state.is_terminal() {
                record.progress = progress;
                record.updated_at = Utc::now();
            }
        }
    }

    fn complete(&self, handle: &str, info: CompletionInfo) -> Result<(), ProjectStoreError> {
        self.transition(handle, ProjectState::Completed, |record| {
            record.progress = format!("Completed: {}", info.output_file);
            record.output_file = Some(info.output_file);
            record.clip_count = info.clip_count;
            record.skipped_count = info.skipped_count;
        })
    }

    fn fail(&self, handle: &str, message: String) -> Result<(), ProjectStoreError> {
        self.inputs.remove(handle);
        self.transition(handle, ProjectState::Failed, |record| {
            record.progress = "Failed".to_string();
            record.error_message = Some(message);
        })
    }

    fn request_cancel(&self, handle: &str) -> Result<bool, ProjectStoreError> {
        let mut record = self
            .records
            .get_mut(handle)
            .ok_or_else(|| ProjectStoreError::NotFound(handle.to_string()))?;

        if record.state.is_terminal() {
            return Ok(false);
        }
        record.cancel_requested = true;
        record.updated_at = Utc::now();
        tracing::info!(handle = %handle, state = %record.state, "Cancellation requested");
        Ok(true)
    }

    fn is_cancel_requested(&self, handle: &str) -> bool {
        self.records
            .get(handle)
            .map(|r| r.cancel_requested)
            .unwrap_or(true) // 不存在的项目视为已取消
    }

    fn list(&self) -> Vec<ProjectRecord> {
        let mut records: Vec<ProjectRecord> = self.records.iter().map(|r| r.clone()).collect();
        records.sort_by_key(|r| r.created_at);
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project::ProjectId;

    fn record(id: &str) -> ProjectRecord {
        ProjectRecord::new(ProjectId::new(id).unwrap())
    }

    #[tokio::test]
    async fn test_project_lifecycle() {
        let (tx, mut rx) = mpsc::channel(8);
        let store = InMemoryProjectStore::new(tx);

        let handle = store.submit(record("book"), "正文".to_string()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), handle);
        assert_eq!(store.get(&handle).unwrap().state, ProjectState::Queued);

        assert_eq!(store.take_input(&handle).as_deref(), Some("正文"));
        assert_eq!(store.take_input(&handle), None);

        store.set_state(&handle, ProjectState::Processing).unwrap();
        store.set_progress(&handle, "Processing paragraph 1/1".to_string());
        assert_eq!(store.get(&handle).unwrap().progress, "Processing paragraph 1/1");

        store
            .complete(
                &handle,
                CompletionInfo {
                    output_file: "final_audiobook_book.mp3".to_string(),
                    clip_count: 3,
                    skipped_count: 1,
                },
            )
            .unwrap();

        let done = store.get(&handle).unwrap();
        assert_eq!(done.state, ProjectState::Completed);
        assert_eq!(done.output_file.as_deref(), Some("final_audiobook_book.mp3"));
        assert_eq!(done.clip_count, 3);
        assert_eq!(done.skipped_count, 1);
    }

    #[tokio::test]
    async fn test_terminal_states_are_final() {
        let (tx, _rx) = mpsc::channel(8);
        let store = InMemoryProjectStore::new(tx);
        let handle = store.submit(record("book"), "正文".to_string()).unwrap();

        store.fail(&handle, "boom".to_string()).unwrap();
        assert!(matches!(
            store.set_state(&handle, ProjectState::Processing),
            Err(ProjectStoreError::InvalidStateTransition(_))
        ));
        assert!(!store.request_cancel(&handle).unwrap());

        // 终态后的进度更新被忽略
        store.set_progress(&handle, "late".to_string());
        assert_eq!(store.get(&handle).unwrap().progress, "Failed");
        assert_eq!(store.get(&handle).unwrap().error_message.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_cannot_complete_from_queued() {
        let (tx, _rx) = mpsc::channel(8);
        let store = InMemoryProjectStore::new(tx);
        let handle = store.submit(record("book"), "正文".to_string()).unwrap();

        let result = store.complete(
            &handle,
            CompletionInfo {
                output_file: "x.mp3".to_string(),
                clip_count: 1,
                skipped_count: 0,
            },
        );
        assert!(result.is_err());
        assert_eq!(store.get(&handle).unwrap().state, ProjectState::Queued);
    }

    #[tokio::test]
    async fn test_full_queue_rejects_submission() {
        let (tx, _rx) = mpsc::channel(1);
        let store = InMemoryProjectStore::new(tx);
        store.submit(record("a"), "一".to_string()).unwrap();

        let result = store.submit(record("b"), "二".to_string());
        assert!(matches!(result, Err(ProjectStoreError::QueueUnavailable(_))));
        assert_eq!(store.list().len(), 1);
    }

    #[tokio::test]
    async fn test_same_project_id_rejected_while_running() {
        let (tx, _rx) = mpsc::channel(8);
        let store = InMemoryProjectStore::new(tx);
        let first = store.submit(record("book"), "一".to_string()).unwrap();

        // 排队中和生成中都占用 project_id
        assert!(matches!(
            store.submit(record("book"), "二".to_string()),
            Err(ProjectStoreError::AlreadyExists(id)) if id == "book"
        ));
        store.set_state(&first, ProjectState::Processing).unwrap();
        assert!(matches!(
            store.submit(record("book"), "二".to_string()),
            Err(ProjectStoreError::AlreadyExists(_))
        ));
        assert_eq!(store.list().len(), 1);

        // 其他 project_id 不受影响
        store.submit(record("other"), "三".to_string()).unwrap();

        store
            .complete(
                &first,
                CompletionInfo {
                    output_file: "final_audiobook_book.wav".to_string(),
                    clip_count: 1,
                    skipped_count: 0,
                },
            )
            .unwrap();
        let second = store.submit(record("book"), "二".to_string()).unwrap();
        assert_ne!(first, second);

        store.fail(&second, "boom".to_string()).unwrap();
        store.submit(record("book"), "四".to_string()).unwrap();
    }

    #[tokio::test]
    async fn test_full_queue_releases_project_id() {
        let (tx, mut rx) = mpsc::channel(1);
        let store = InMemoryProjectStore::new(tx);
        store.submit(record("a"), "一".to_string()).unwrap();
        assert!(matches!(
            store.submit(record("b"), "二".to_string()),
            Err(ProjectStoreError::QueueUnavailable(_))
        ));

        rx.try_recv().unwrap();
        store.submit(record("b"), "二".to_string()).unwrap();
    }

    #[tokio::test]
    async fn test_cancel_flag() {
        let (tx, _rx) = mpsc::channel(8);
        let store = InMemoryProjectStore::new(tx);
        let handle = store.submit(record("book"), "正文".to_string()).unwrap();

        assert!(!store.is_cancel_requested(&handle));
        assert!(store.request_cancel(&handle).unwrap());
        assert!(store.is_cancel_requested(&handle));
        assert!(store.is_cancel_requested("unknown"));
        assert!(matches!(
            store.request_cancel("unknown"),
            Err(ProjectStoreError::NotFound(_))
        ));
    }
}
