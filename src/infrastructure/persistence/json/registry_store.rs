//! JSON Voice Registry - 角色注册表的文件持久化
//!
//! 两个扁平 JSON 文件：
//! - character_aliases.json: 规范名 → 别名列表
//! - character_voices.json: 规范名 → 音色 ID
//!
//! 写操作在互斥锁内串行执行：克隆 → 修改 → 只落盘内容变化的文件 → 提交内存状态。
//! 每种修改只涉及一个文件，落盘失败时内存和磁盘都保持原状。

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::application::ports::{RegistryError, VoiceRegistryPort};
use crate::domain::character::{
    AliasMap, CharacterError, CharacterRegistry, RegistrySnapshot, VoiceMap,
};

pub const ALIASES_FILE: &str = "character_aliases.json";
pub const VOICES_FILE: &str = "character_voices.json";

/// 基于 JSON 文件的角色注册表
pub struct JsonVoiceRegistry {
    aliases_path: PathBuf,
    voices_path: PathBuf,
    inner: Mutex<CharacterRegistry>,
}

fn io_error(e: std::io::Error) -> RegistryError {
    RegistryError::IoError(e.to_string())
}

async fn read_map<T>(path: &Path) -> Result<T, RegistryError>
where
    T: DeserializeOwned + Default,
{
    match fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(T::default()),
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
            RegistryError::SerializationError(format!("{}: {}", path.display(), e))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(io_error(e)),
    }
}

/// 写临时文件、fsync、再原子改名
async fn write_map<T: Serialize>(path: &Path, value: &T) -> Result<(), RegistryError> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| RegistryError::SerializationError(e.to_string()))?;

    let tmp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&tmp_path).await.map_err(io_error)?;
    file.write_all(&bytes).await.map_err(io_error)?;
    file.sync_all().await.map_err(io_error)?;
    drop(file);

    fs::rename(&tmp_path, path).await.map_err(io_error)
}

impl JsonVoiceRegistry {
    /// 打开（必要时创建）注册表目录并加载两个映射
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await.map_err(io_error)?;

        let aliases_path = dir.join(ALIASES_FILE);
        let voices_path = dir.join(VOICES_FILE);
        let aliases: AliasMap = read_map(&aliases_path).await?;
        let voices: VoiceMap = read_map(&voices_path).await?;

        tracing::info!(
            dir = %dir.display(),
            characters = voices.len(),
            alias_groups = aliases.len(),
            "Voice registry loaded"
        );

        Ok(Self {
            aliases_path,
            voices_path,
            inner: Mutex::new(CharacterRegistry::from_maps(aliases, voices)),
        })
    }

    async fn persist(
        &self,
        previous: &CharacterRegistry,
        next: &CharacterRegistry,
    ) -> Result<(), RegistryError> {
        if next.aliases() != previous.aliases() {
            write_map(&self.aliases_path, next.aliases()).await?;
        }
        if next.voices() != previous.voices() {
            write_map(&self.voices_path, next.voices()).await?;
        }
        Ok(())
    }

    /// 串行化的 load-mutate-save
    async fn mutate<F>(&self, op: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut CharacterRegistry) -> Result<bool, CharacterError> + Send,
    {
        let mut guard = self.inner.lock().await;
        let mut next = guard.clone();
        if !op(&mut next)? {
            return Ok(());
        }
        self.persist(&guard, &next).await?;
        *guard = next;
        Ok(())
    }
}

#[async_trait]
impl VoiceRegistryPort for JsonVoiceRegistry {
    async fn resolve(&self, name: &str) -> Option<String> {
        self.inner.lock().await.resolve(name).map(str::to_string)
    }

    async fn add_alias(&self, canonical: &str, alias: &str) -> Result<(), RegistryError> {
        self.mutate(|r| r.add_alias(canonical, alias)).await?;
        tracing::debug!(canonical = %canonical, alias = %alias, "Alias recorded");
        Ok(())
    }

    async fn get_voice(&self, canonical: &str) -> Option<String> {
        self.inner.lock().await.get_voice(canonical).map(str::to_string)
    }

    async fn set_voice(&self, canonical: &str, voice_id: &str) -> Result<(), RegistryError> {
        self.mutate(|r| r.set_voice(canonical, voice_id)).await?;
        tracing::debug!(canonical = %canonical, voice_id = %voice_id, "Voice recorded");
        Ok(())
    }

    async fn all_aliases(&self) -> AliasMap {
        self.inner.lock().await.aliases().clone()
    }

    async fn all_voices(&self) -> VoiceMap {
        self.inner.lock().await.voices().clone()
    }

    async fn snapshot(&self) -> RegistrySnapshot {
        self.inner.lock().await.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_updates_survive_reopen() {
        let dir = tempdir().unwrap();
        {
            let registry = JsonVoiceRegistry::open(dir.path()).await.unwrap();
            registry.add_alias("哈利波特", "救世主").await.unwrap();
            registry.set_voice("哈利波特", "V1").await.unwrap();
        }

        let reopened = JsonVoiceRegistry::open(dir.path()).await.unwrap();
        assert_eq!(reopened.resolve("救世主").await.as_deref(), Some("哈利波特"));
        assert_eq!(reopened.get_voice("哈利波特").await.as_deref(), Some("V1"));
    }

    #[tokio::test]
    async fn test_files_are_pretty_utf8() {
        let dir = tempdir().unwrap();
        let registry = JsonVoiceRegistry::open(dir.path()).await.unwrap();
        registry.set_voice("旁白", "V0").await.unwrap();
        registry.add_alias("旁白", "叙述者").await.unwrap();

        let voices = std::fs::read_to_string(dir.path().join(VOICES_FILE)).unwrap();
        assert!(voices.contains("\"旁白\": \"V0\""));
        let aliases = std::fs::read_to_string(dir.path().join(ALIASES_FILE)).unwrap();
        assert!(aliases.contains("\"叙述者\""));
    }

    #[tokio::test]
    async fn test_failed_write_touches_only_its_own_file() {
        let dir = tempdir().unwrap();
        let registry = JsonVoiceRegistry::open(dir.path()).await.unwrap();
        registry.set_voice("萧炎", "V1").await.unwrap();

        // 音色文件被目录占位，改名会失败
        std::fs::remove_file(dir.path().join(VOICES_FILE)).unwrap();
        std::fs::create_dir(dir.path().join(VOICES_FILE)).unwrap();

        registry.add_alias("萧炎", "炎帝").await.unwrap();
        assert!(registry.set_voice("萧炎", "V2").await.is_err());
        assert_eq!(registry.get_voice("萧炎").await.as_deref(), Some("V1"));
        assert!(!dir.path().join(ALIASES_FILE).with_extension("json.tmp").exists());

        std::fs::remove_dir(dir.path().join(VOICES_FILE)).unwrap();
        let reopened = JsonVoiceRegistry::open(dir.path()).await.unwrap();
        assert_eq!(reopened.resolve("炎帝").await.as_deref(), Some("萧炎"));
        assert_eq!(reopened.get_voice("萧炎").await, None);
    }

    #[tokio::test]
    async fn test_add_alias_is_idempotent() {
        let dir = tempdir().unwrap();
        let registry = JsonVoiceRegistry::open(dir.path()).await.unwrap();
        registry.add_alias("萧炎", "炎帝").await.unwrap();
        let once = registry.snapshot().await;
        registry.add_alias("萧炎", "炎帝").await.unwrap();
        assert_eq!(registry.snapshot().await, once);
    }

    #[tokio::test]
    async fn test_conflicting_alias_leaves_state_untouched() {
        let dir = tempdir().unwrap();
        let registry = JsonVoiceRegistry::open(dir.path()).await.unwrap();
        registry.add_alias("萧炎", "炎帝").await.unwrap();

        let err = registry.add_alias("药老", "炎帝").await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidMapping(_)));
        assert_eq!(registry.resolve("炎帝").await.as_deref(), Some("萧炎"));
        assert!(!registry.all_aliases().await.contains_key("药老"));
    }

    #[tokio::test]
    async fn test_concurrent_writes_are_not_lost() {
        let dir = tempdir().unwrap();
        let registry = Arc::new(JsonVoiceRegistry::open(dir.path()).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..16 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry
                    .set_voice(&format!("角色{}", i), &format!("V{}", i))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(registry.all_voices().await.len(), 16);
        let reopened = JsonVoiceRegistry::open(dir.path()).await.unwrap();
        assert_eq!(reopened.all_voices().await.len(), 16);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(VOICES_FILE), "{not json").unwrap();
        let result = JsonVoiceRegistry::open(dir.path()).await;
        assert!(matches!(result, Err(RegistryError::SerializationError(_))));
    }
}
