//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_concatenator;
mod audio_storage;
mod llm_engine;
mod project_store;
mod tts_engine;
mod voice_registry;

pub use audio_concatenator::{AudioConcatenatorPort, AudioError, AudioFormat, ClipInfo};
pub use audio_storage::{AudioStorageError, AudioStoragePort};
pub use llm_engine::{LlmEnginePort, LlmError};
pub use project_store::{CompletionInfo, ProjectRecord, ProjectStoreError, ProjectStorePort};
pub use tts_engine::{SynthesisRequest, SynthesisResponse, TtsEnginePort, TtsError};
pub use voice_registry::{RegistryError, VoiceRegistryPort};
