//! LLM Engine Port - 大模型推理抽象
//!
//! 只暴露“提示词进、文本出”这一窄接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

/// LLM 错误
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty content")]
    EmptyContent,
}

/// LLM Engine Port
///
/// 外部大模型服务的抽象接口
#[async_trait]
pub trait LlmEnginePort: Send + Sync {
    /// 发送提示词，返回模型消息的文本内容
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}
