//! 应用层错误定义
//!
//! 统一的命令/查询/流水线错误类型

use thiserror::Error;

use crate::application::ports::{
    AudioError, AudioStorageError, ProjectStoreError, RegistryError,
};

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 配置缺失或无效（凭据、音色目录），启动前即失败
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// LLM/TTS 后端不可用
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// 后端响应无法解析
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// 段落或整本书没有产出任何话语/音频
    #[error("Empty result: {0}")]
    EmptyResult(String),

    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 状态无效
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 已取消
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    /// 创建配置错误
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError(message.into())
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<RegistryError> for ApplicationError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::InvalidMapping(e) => Self::ValidationError(e.to_string()),
            other => Self::StorageError(other.to_string()),
        }
    }
}

impl From<AudioStorageError> for ApplicationError {
    fn from(err: AudioStorageError) -> Self {
        match err {
            AudioStorageError::FileNotFound(name) => Self::not_found("File", name),
            AudioStorageError::InvalidFileName(name) => {
                Self::ValidationError(format!("Invalid file name: {}", name))
            }
            other => Self::StorageError(other.to_string()),
        }
    }
}

impl From<AudioError> for ApplicationError {
    fn from(err: AudioError) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<ProjectStoreError> for ApplicationError {
    fn from(err: ProjectStoreError) -> Self {
        match err {
            ProjectStoreError::NotFound(handle) => Self::not_found("Project", handle),
            ProjectStoreError::InvalidStateTransition(e) => Self::InvalidState(e.to_string()),
            other => Self::InternalError(other.to_string()),
        }
    }
}
