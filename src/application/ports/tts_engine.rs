//! TTS Engine Port - 语音合成引擎抽象
//!
//! 定义语音合成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use super::AudioFormat;

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("No audio data received")]
    EmptyAudio,
}

/// TTS 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 要合成的文本内容
    pub text: String,
    /// 音色 ID
    pub voice_id: String,
    /// 期望的音频格式
    pub format: AudioFormat,
}

/// TTS 合成响应
#[derive(Debug, Clone)]
pub struct SynthesisResponse {
    /// 本次请求 ID（用于追踪）
    pub request_id: String,
    /// 按到达顺序拼接的音频字节
    pub audio_data: Vec<u8>,
    /// 收到的传输分块数
    pub chunk_count: usize,
}

/// TTS Engine Port
///
/// 外部 TTS 服务的抽象接口
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 执行语音合成
    ///
    /// 零字节音频视为失败（`TtsError::EmptyAudio`）
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisResponse, TtsError>;
}
