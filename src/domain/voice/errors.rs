//! Voice Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("音色目录解析失败: {0}")]
    Parse(String),

    #[error("音色目录为空")]
    Empty,

    #[error("无效的音色 ID: '{0}'")]
    InvalidVoiceId(String),
}
