//! 音色目录加载
//!
//! 启动时读取一次；读不到、解析失败或为空都是配置错误，服务不会启动。

use std::path::Path;

use crate::application::error::ApplicationError;
use crate::domain::voice::VoiceCatalog;

pub async fn load_voice_catalog(path: impl AsRef<Path>) -> Result<VoiceCatalog, ApplicationError> {
    let path = path.as_ref();
    let json = tokio::fs::read_to_string(path).await.map_err(|e| {
        ApplicationError::configuration(format!(
            "Cannot read voice catalog {}: {}",
            path.display(),
            e
        ))
    })?;

    let catalog = VoiceCatalog::from_json_str(&json).map_err(|e| {
        ApplicationError::configuration(format!("Voice catalog {}: {}", path.display(), e))
    })?;

    tracing::info!(path = %path.display(), voices = catalog.len(), "Voice catalog loaded");
    Ok(catalog)
}
