//! Audio Storage Port - 出站端口
//!
//! 定义项目中间片段与最终有声书文件的存储抽象

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use super::AudioFormat;
use crate::domain::project::ProjectId;

/// 音频存储错误
#[derive(Debug, Error)]
pub enum AudioStorageError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Audio Storage Port - 出站端口
#[async_trait]
pub trait AudioStoragePort: Send + Sync {
    /// 项目的中间片段目录
    fn project_dir(&self, project_id: &ProjectId) -> PathBuf;

    /// 项目最终文件路径
    fn final_path(&self, project_id: &ProjectId, format: AudioFormat) -> PathBuf;

    /// 保存一个中间片段，文件名带序号和唯一 ID，项目内不会冲突
    async fn save_clip(
        &self,
        project_id: &ProjectId,
        sequence: u32,
        format: AudioFormat,
        data: &[u8],
    ) -> Result<PathBuf, AudioStorageError>;

    /// 读取片段
    async fn read_clip(&self, path: &std::path::Path) -> Result<Vec<u8>, AudioStorageError>;

    /// 写入最终文件，返回路径
    async fn save_final(
        &self,
        project_id: &ProjectId,
        format: AudioFormat,
        data: &[u8],
    ) -> Result<PathBuf, AudioStorageError>;

    /// 删除项目的中间片段目录，返回删除的文件数
    async fn remove_project_dir(&self, project_id: &ProjectId) -> Result<u64, AudioStorageError>;

    /// 按文件名定位可下载的输出文件（拒绝路径穿越）
    async fn resolve_download(&self, file_name: &str) -> Result<PathBuf, AudioStorageError>;
}
