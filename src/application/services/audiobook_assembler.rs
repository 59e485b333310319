//! Audiobook Assembler - 有声书组装
//!
//! 编排完整流水线：
//! 1. 确保旁白音色已初始化
//! 2. 按空行切分段落
//! 3. 逐段标注，逐条合成（严格顺序），单条失败只跳过该条
//! 4. 按生产顺序拼接全部片段并写出最终文件

use std::path::PathBuf;
use std::sync::Arc;

use super::progress::ProgressSink;
use super::speaker_annotator::SpeakerAnnotator;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AudioConcatenatorPort, AudioFormat, AudioStoragePort, SynthesisRequest, TtsEnginePort,
    VoiceRegistryPort,
};
use crate::domain::project::{AudioClip, Project, ProjectId};
use crate::domain::{split_paragraphs, Annotation, Utterance};

/// 组装器配置
#[derive(Debug, Clone, Default)]
pub struct AssemblerConfig {
    /// 中间片段与最终文件的容器格式
    pub format: AudioFormat,
    /// 完成后保留中间片段目录
    pub keep_intermediate: bool,
}

/// 一次成功生成的结果
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub output_path: PathBuf,
    /// 可下载的文件名
    pub file_name: String,
    pub clip_count: usize,
    pub skipped_count: usize,
    pub duration_ms: u64,
}

/// 有声书组装器
pub struct AudiobookAssembler {
    annotator: Arc<SpeakerAnnotator>,
    tts: Arc<dyn TtsEnginePort>,
    registry: Arc<dyn VoiceRegistryPort>,
    storage: Arc<dyn AudioStoragePort>,
    concatenator: Arc<dyn AudioConcatenatorPort>,
    config: AssemblerConfig,
}

impl AudiobookAssembler {
    pub fn new(
        annotator: Arc<SpeakerAnnotator>,
        tts: Arc<dyn TtsEnginePort>,
        registry: Arc<dyn VoiceRegistryPort>,
        storage: Arc<dyn AudioStoragePort>,
        concatenator: Arc<dyn AudioConcatenatorPort>,
        config: AssemblerConfig,
    ) -> Self {
        Self {
            annotator,
            tts,
            registry,
            storage,
            concatenator,
            config,
        }
    }

    pub fn format(&self) -> AudioFormat {
        self.config.format
    }

    /// 生成一本有声书
    ///
    /// 没有任何片段时返回 `EmptyResult`，且不会写出最终文件。
    pub async fn generate(
        &self,
        text: &str,
        project_id: &ProjectId,
        progress: &dyn ProgressSink,
    ) -> Result<GenerationOutput, ApplicationError> {
        self.ensure_narrator().await?;

        let paragraphs = split_paragraphs(text);
        if paragraphs.is_empty() {
            return Err(ApplicationError::EmptyResult(
                "Input text contains no paragraphs".to_string(),
            ));
        }

        tracing::info!(
            project_id = %project_id,
            paragraphs = paragraphs.len(),
            format = %self.config.format,
            "Starting audiobook generation"
        );

        let result = self.run(&paragraphs, project_id, progress).await;

        if !self.config.keep_intermediate {
            match self.storage.remove_project_dir(project_id).await {
                Ok(removed) => {
                    tracing::debug!(project_id = %project_id, removed, "Intermediate clips removed")
                }
                Err(e) => tracing::warn!(
                    project_id = %project_id,
                    error = %e,
                    "Failed to remove intermediate clips"
                ),
            }
        }

        match &result {
            Ok(output) => tracing::info!(
                project_id = %project_id,
                file = %output.file_name,
                clips = output.clip_count,
                skipped = output.skipped_count,
                duration_ms = output.duration_ms,
                "Audiobook generation complete"
            ),
            Err(e) => tracing::error!(project_id = %project_id, error = %e, "Audiobook generation failed"),
        }

        result
    }

    /// 旁白没有音色（或音色已不在目录中）时写入默认音色
    async fn ensure_narrator(&self) -> Result<(), ApplicationError> {
        let narrator = self.annotator.narrator();
        let current = self.registry.get_voice(&narrator.name).await;

        if let Some(voice) = &current {
            if self.annotator.catalog().contains(voice) {
                return Ok(());
            }
        }

        self.registry
            .set_voice(&narrator.name, &narrator.default_voice_id)
            .await?;
        tracing::info!(
            narrator = %narrator.name,
            previous = ?current,
            voice_id = %narrator.default_voice_id,
            "Initialized narrator voice"
        );
        Ok(())
    }

    async fn run(
        &self,
        paragraphs: &[String],
        project_id: &ProjectId,
        progress: &dyn ProgressSink,
    ) -> Result<GenerationOutput, ApplicationError> {
        let format = self.config.format;
        let mut project = Project::new(
            project_id.clone(),
            self.storage.project_dir(project_id),
            self.storage.final_path(project_id, format),
        );
        let total = paragraphs.len();
        let mut sequence: u32 = 0;
        let mut skipped = 0usize;

        for (index, paragraph) in paragraphs.iter().enumerate() {
            if progress.is_cancelled() {
                return Err(ApplicationError::Cancelled(format!(
                    "Cancelled before paragraph {}/{}",
                    index + 1,
                    total
                )));
            }
            progress.report(format!("Processing paragraph {}/{}", index + 1, total));

            let snapshot = self.registry.snapshot().await;
            let annotation = self.annotator.annotate(paragraph, &snapshot).await;
            if let Annotation::Rejected { reason } = &annotation {
                tracing::warn!(
                    project_id = %project_id,
                    paragraph = index + 1,
                    reason = %reason,
                    "Paragraph produced no utterances"
                );
                continue;
            }

            for utterance in annotation.into_utterances() {
                if progress.is_cancelled() {
                    return Err(ApplicationError::Cancelled(format!(
                        "Cancelled at paragraph {}/{}",
                        index + 1,
                        total
                    )));
                }

                sequence += 1;
                match self.render(project_id, sequence, &utterance).await {
                    Ok(clip) => project
                        .push_clip(clip)
                        .map_err(|e| ApplicationError::internal(e.to_string()))?,
                    Err(e) => {
                        skipped += 1;
                        tracing::warn!(
                            project_id = %project_id,
                            sequence,
                            speaker = %utterance.speaker,
                            voice_id = %utterance.voice_id,
                            error = %e,
                            "Skipping utterance"
                        );
                    }
                }
            }
        }

        if project.is_empty() {
            return Err(ApplicationError::EmptyResult(
                "No audio segments were generated".to_string(),
            ));
        }

        progress.report(format!("Merging {} audio segments", project.clips().len()));

        let mut clips = Vec::with_capacity(project.clips().len());
        for clip in project.clips() {
            clips.push(self.storage.read_clip(&clip.path).await?);
        }
        let concatenator = self.concatenator.clone();
        let merged = tokio::task::spawn_blocking(move || concatenator.concat(&clips, format))
            .await
            .map_err(|e| ApplicationError::internal(format!("Concat task failed: {}", e)))??;
        let output_path = self.storage.save_final(project_id, format, &merged).await?;

        let file_name = output_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| ApplicationError::internal("Output path has no file name"))?;

        Ok(GenerationOutput {
            output_path,
            file_name,
            clip_count: project.clips().len(),
            skipped_count: skipped,
            duration_ms: project.total_duration_ms(),
        })
    }

    /// 合成一条话语、校验可解码、写入中间文件
    async fn render(
        &self,
        project_id: &ProjectId,
        sequence: u32,
        utterance: &Utterance,
    ) -> Result<AudioClip, ApplicationError> {
        let format = self.config.format;
        tracing::debug!(
            project_id = %project_id,
            sequence,
            speaker = %utterance.speaker,
            voice_id = %utterance.voice_id,
            text_len = utterance.text.chars().count(),
            "Synthesizing utterance"
        );

        let response = self
            .tts
            .synthesize(SynthesisRequest {
                text: utterance.text.clone(),
                voice_id: utterance.voice_id.clone(),
                format,
            })
            .await
            .map_err(|e| ApplicationError::BackendUnavailable(e.to_string()))?;

        // 解码校验是 CPU 密集操作，放到阻塞线程池
        let concatenator = self.concatenator.clone();
        let audio_data = response.audio_data;
        let (audio_data, probed) = tokio::task::spawn_blocking(move || {
            let probed = concatenator.probe(&audio_data, format);
            (audio_data, probed)
        })
        .await
        .map_err(|e| ApplicationError::internal(format!("Probe task failed: {}", e)))?;
        let info = probed.map_err(|e| ApplicationError::MalformedResponse(e.to_string()))?;

        let path = self
            .storage
            .save_clip(project_id, sequence, format, &audio_data)
            .await?;

        Ok(AudioClip {
            sequence,
            path,
            speaker: utterance.speaker.clone(),
            voice_id: utterance.voice_id.clone(),
            duration_ms: info.duration_ms,
        })
    }
}
