//! Voice Registry Port - 角色音色注册表
//!
//! 持久化的规范名 → 别名、规范名 → 音色映射。
//! 每个写操作在返回前同时落盘两张映射；写操作之间串行。

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::character::{AliasMap, CharacterError, RegistrySnapshot, VoiceMap};

/// 注册表错误
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid character mapping: {0}")]
    InvalidMapping(#[from] CharacterError),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Voice Registry Port
#[async_trait]
pub trait VoiceRegistryPort: Send + Sync {
    /// 名称（规范名或别名）→ 规范名
    async fn resolve(&self, name: &str) -> Option<String>;

    /// 添加别名（幂等），规范名不存在时创建
    async fn add_alias(&self, canonical: &str, alias: &str) -> Result<(), RegistryError>;

    /// 获取规范名的音色
    async fn get_voice(&self, canonical: &str) -> Option<String>;

    /// 设置规范名的音色（无条件覆盖）
    async fn set_voice(&self, canonical: &str, voice_id: &str) -> Result<(), RegistryError>;

    /// 别名映射完整快照
    async fn all_aliases(&self) -> AliasMap;

    /// 音色映射完整快照
    async fn all_voices(&self) -> VoiceMap;

    /// 两张映射的一致快照
    async fn snapshot(&self) -> RegistrySnapshot;
}
