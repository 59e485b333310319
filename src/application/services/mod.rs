//! Application Services - 生成流水线
//!
//! - speaker_annotator: 段落 → 有序话语（LLM 标注 + 注册表归一）
//! - audiobook_assembler: 全文 → 单个有声书文件
//! - progress: 进度回报与取消

mod audiobook_assembler;
mod progress;
mod speaker_annotator;

pub use audiobook_assembler::{AssemblerConfig, AudiobookAssembler, GenerationOutput};
pub use progress::{NoopProgress, ProgressSink};
pub use speaker_annotator::{build_prompt, NarratorConfig, SpeakerAnnotator, EMPTY_CONTENT_MESSAGE};
