//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（LlmEngine、TtsEngine、VoiceRegistry、AudioStorage 等）
//! - services: 说话人标注与有声书组装流水线
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod services;

// Re-exports
pub use commands::{
    // Generation commands
    CancelGeneration,
    CancelGenerationResponse,
    SubmitGeneration,
    SubmitGenerationResponse,
    // Character commands
    AddCharacterAlias,
    SetCharacterVoice,
    // Handlers
    handlers::{
        AddCharacterAliasHandler, CancelGenerationHandler, SetCharacterVoiceHandler,
        SubmitGenerationHandler,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Audio
    AudioConcatenatorPort,
    AudioError,
    AudioFormat,
    AudioStorageError,
    AudioStoragePort,
    ClipInfo,
    // LLM
    LlmEnginePort,
    LlmError,
    // Project store
    CompletionInfo,
    ProjectRecord,
    ProjectStoreError,
    ProjectStorePort,
    // TTS engine
    SynthesisRequest,
    SynthesisResponse,
    TtsEnginePort,
    TtsError,
    // Voice registry
    RegistryError,
    VoiceRegistryPort,
};

pub use queries::{
    // Generation queries
    AudiobookFile,
    GetAudiobookFile,
    QueryGenerationStatus,
    // Character queries
    ListCatalogVoices,
    ListCharacters,
    // Handlers
    handlers::{
        CatalogVoiceResponse, CharacterResponse, GenerationStatusResponse,
        GetAudiobookFileHandler, ListCatalogVoicesHandler, ListCharactersHandler,
        QueryGenerationStatusHandler,
    },
};

pub use services::{
    AssemblerConfig, AudiobookAssembler, GenerationOutput, NarratorConfig, ProgressSink,
    SpeakerAnnotator,
};
