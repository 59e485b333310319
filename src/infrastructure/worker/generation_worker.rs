//! Generation Worker - 后台有声书生成
//!
//! 从队列消费项目句柄，每个项目在独立任务中顺序执行整条流水线；
//! 不同项目之间并发，并发数由 semaphore 限制。

use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

use crate::application::ports::{CompletionInfo, ProjectStorePort};
use crate::application::services::{AudiobookAssembler, ProgressSink};
use crate::domain::project::ProjectState;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct GenerationWorkerConfig {
    /// 最大并发项目数
    pub max_concurrent: usize,
}

impl Default for GenerationWorkerConfig {
    fn default() -> Self {
        Self { max_concurrent: 2 }
    }
}

/// 把组装器的进度写回项目记录
struct StoreProgress {
    handle: String,
    store: Arc<dyn ProjectStorePort>,
}

impl ProgressSink for StoreProgress {
    fn report(&self, message: String) {
        self.store.set_progress(&self.handle, message);
    }

    fn is_cancelled(&self) -> bool {
        self.store.is_cancel_requested(&self.handle)
    }
}

/// 生成 Worker
pub struct GenerationWorker {
    config: GenerationWorkerConfig,
    queue_receiver: mpsc::Receiver<String>,
    store: Arc<dyn ProjectStorePort>,
    assembler: Arc<AudiobookAssembler>,
}

impl GenerationWorker {
    pub fn new(
        config: GenerationWorkerConfig,
        queue_receiver: mpsc::Receiver<String>,
        store: Arc<dyn ProjectStorePort>,
        assembler: Arc<AudiobookAssembler>,
    ) -> Self {
        Self {
            config,
            queue_receiver,
            store,
            assembler,
        }
    }

    /// 启动 Worker，队列关闭后返回
    pub async fn run(mut self) {
        tracing::info!(
            max_concurrent = self.config.max_concurrent,
            "GenerationWorker started"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));

        while let Some(handle) = self.queue_receiver.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::error!("Failed to acquire semaphore permit");
                    continue;
                }
            };

            let store = self.store.clone();
            let assembler = self.assembler.clone();

            tokio::spawn(async move {
                let _permit = permit; // 持有 permit 直到项目结束
                Self::process_project(&handle, store, assembler).await;
            });
        }

        tracing::info!("GenerationWorker stopped");
    }

    /// 处理单个项目
    pub async fn process_project(
        handle: &str,
        store: Arc<dyn ProjectStorePort>,
        assembler: Arc<AudiobookAssembler>,
    ) {
        let record = match store.get(handle) {
            Some(r) => r,
            None => {
                tracing::warn!(handle = %handle, "Project not found, skipping");
                return;
            }
        };

        if record.cancel_requested {
            tracing::info!(handle = %handle, "Project cancelled while queued");
            let _ = store.fail(handle, "Cancelled before start".to_string());
            return;
        }

        let Some(text) = store.take_input(handle) else {
            tracing::error!(handle = %handle, "Project input missing");
            let _ = store.fail(handle, "Project input missing".to_string());
            return;
        };

        if let Err(e) = store.set_state(handle, ProjectState::Processing) {
            tracing::error!(handle = %handle, error = %e, "Failed to update project state");
            return;
        }

        let progress = StoreProgress {
            handle: handle.to_string(),
            store: store.clone(),
        };

        match assembler.generate(&text, &record.project_id, &progress).await {
            Ok(output) => {
                let info = CompletionInfo {
                    output_file: output.file_name,
                    clip_count: output.clip_count,
                    skipped_count: output.skipped_count,
                };
                if let Err(e) = store.complete(handle, info) {
                    tracing::error!(handle = %handle, error = %e, "Failed to mark project completed");
                }
            }
            Err(e) => {
                if let Err(store_err) = store.fail(handle, e.to_string()) {
                    tracing::error!(handle = %handle, error = %store_err, "Failed to mark project failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{AudioFormat, ProjectRecord, VoiceRegistryPort};
    use crate::application::services::{AssemblerConfig, NarratorConfig, SpeakerAnnotator};
    use crate::domain::project::ProjectId;
    use crate::domain::voice::VoiceCatalog;
    use crate::infrastructure::adapters::{
        FakeLlmClient, FakeTtsClient, FileAudioStorage, SymphoniaConcatenator,
    };
    use crate::infrastructure::memory::InMemoryProjectStore;
    use crate::infrastructure::persistence::JsonVoiceRegistry;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Harness {
        dir: TempDir,
        llm: Arc<FakeLlmClient>,
        tts: Arc<FakeTtsClient>,
        store: Arc<InMemoryProjectStore>,
        assembler: Arc<AudiobookAssembler>,
    }

    async fn harness(queue: mpsc::Sender<String>) -> Harness {
        let dir = TempDir::new().unwrap();
        let registry = Arc::new(JsonVoiceRegistry::open(dir.path().join("registry")).await.unwrap());
        registry.set_voice("旁白", "V0").await.unwrap();

        let llm = Arc::new(FakeLlmClient::new());
        let tts = Arc::new(FakeTtsClient::new());
        let annotator = Arc::new(SpeakerAnnotator::new(
            llm.clone(),
            registry.clone(),
            Arc::new(VoiceCatalog::from_ids(["V0", "V1"]).unwrap()),
            NarratorConfig {
                name: "旁白".to_string(),
                default_voice_id: "V0".to_string(),
            },
        ));
        let assembler = Arc::new(AudiobookAssembler::new(
            annotator,
            tts.clone(),
            registry,
            Arc::new(FileAudioStorage::new(dir.path().join("output"))),
            Arc::new(SymphoniaConcatenator::new()),
            AssemblerConfig {
                format: AudioFormat::Wav,
                keep_intermediate: false,
            },
        ));

        Harness {
            dir,
            llm,
            tts,
            store: Arc::new(InMemoryProjectStore::new(queue)),
            assembler,
        }
    }

    fn submit(store: &InMemoryProjectStore, id: &str, text: &str) -> String {
        store
            .submit(ProjectRecord::new(ProjectId::new(id).unwrap()), text.to_string())
            .unwrap()
    }

    #[tokio::test]
    async fn test_worker_completes_project() {
        let (tx, rx) = mpsc::channel(8);
        let h = harness(tx).await;
        h.llm.push_response(
            r#"[{"speaker_name": "小明", "speaker_voice_id": "V1", "text": "你好。"}]"#,
        );
        let handle = submit(&h.store, "worker_book", "小明说：你好。");

        let worker = GenerationWorker::new(
            GenerationWorkerConfig::default(),
            rx,
            h.store.clone(),
            h.assembler.clone(),
        );
        tokio::spawn(worker.run());

        let mut state = ProjectState::Queued;
        for _ in 0..200 {
            state = h.store.get(&handle).unwrap().state;
            if state.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let record = h.store.get(&handle).unwrap();
        assert_eq!(state, ProjectState::Completed, "{:?}", record.error_message);
        assert_eq!(record.output_file.as_deref(), Some("final_audiobook_worker_book.wav"));
        assert!(h.dir.path().join("output/final_audiobook_worker_book.wav").exists());
    }

    #[tokio::test]
    async fn test_failed_generation_is_recorded() {
        let (tx, _rx) = mpsc::channel(8);
        let h = harness(tx).await;
        h.llm.push_response(
            r#"[{"speaker_name": "旁白", "speaker_voice_id": "V0", "text": "唯一一句。"}]"#,
        );
        h.tts.fail_on("唯一一句。");
        let handle = submit(&h.store, "doomed", "唯一一句。");

        GenerationWorker::process_project(&handle, h.store.clone(), h.assembler.clone()).await;

        let record = h.store.get(&handle).unwrap();
        assert_eq!(record.state, ProjectState::Failed);
        assert!(record.error_message.unwrap().contains("No audio segments"));
        assert!(record.output_file.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_while_queued() {
        let (tx, _rx) = mpsc::channel(8);
        let h = harness(tx).await;
        let handle = submit(&h.store, "cancelled", "正文");
        h.store.request_cancel(&handle).unwrap();

        GenerationWorker::process_project(&handle, h.store.clone(), h.assembler.clone()).await;

        let record = h.store.get(&handle).unwrap();
        assert_eq!(record.state, ProjectState::Failed);
        assert!(h.tts.calls().is_empty());
        assert!(h.llm.prompts().is_empty());
    }
}
