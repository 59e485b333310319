//! File Storage - 文件系统音频存储实现
//!
//! 目录布局:
//! ```text
//! <output_dir>/
//! ├── <project_id>_chunks/clip_<seq:05>_<uuid>.<ext>   中间片段
//! └── final_audiobook_<project_id>.<ext>               最终文件
//! ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{AudioFormat, AudioStorageError, AudioStoragePort};
use crate::domain::project::ProjectId;

/// 文件系统音频存储
pub struct FileAudioStorage {
    /// 输出根目录
    base_dir: PathBuf,
}

impl FileAudioStorage {
    /// 目录在首次写入时创建
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 只接受输出根目录下的普通文件名
    fn validate_file_name(file_name: &str) -> Result<(), AudioStorageError> {
        let invalid = file_name.is_empty()
            || file_name.starts_with('.')
            || file_name.contains(['/', '\\', '\0'])
            || file_name.contains("..");
        let known_ext = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(AudioFormat::from_extension)
            .is_some();

        if invalid || !known_ext {
            return Err(AudioStorageError::InvalidFileName(file_name.to_string()));
        }
        Ok(())
    }
}

fn io_error(e: std::io::Error) -> AudioStorageError {
    AudioStorageError::IoError(e.to_string())
}

#[async_trait]
impl AudioStoragePort for FileAudioStorage {
    fn project_dir(&self, project_id: &ProjectId) -> PathBuf {
        self.base_dir.join(format!("{}_chunks", project_id))
    }

    fn final_path(&self, project_id: &ProjectId, format: AudioFormat) -> PathBuf {
        self.base_dir
            .join(format!("final_audiobook_{}.{}", project_id, format.extension()))
    }

    async fn save_clip(
        &self,
        project_id: &ProjectId,
        sequence: u32,
        format: AudioFormat,
        data: &[u8],
    ) -> Result<PathBuf, AudioStorageError> {
        let project_dir = self.project_dir(project_id);
        fs::create_dir_all(&project_dir).await.map_err(io_error)?;

        let clip_path = project_dir.join(format!(
            "clip_{:05}_{}.{}",
            sequence,
            Uuid::new_v4().simple(),
            format.extension()
        ));
        fs::write(&clip_path, data).await.map_err(io_error)?;

        tracing::debug!(
            project_id = %project_id,
            sequence,
            size = data.len(),
            "Saved clip"
        );
        Ok(clip_path)
    }

    async fn read_clip(&self, path: &Path) -> Result<Vec<u8>, AudioStorageError> {
        match fs::read(path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                AudioStorageError::FileNotFound(path.to_string_lossy().to_string()),
            ),
            Err(e) => Err(io_error(e)),
        }
    }

    async fn save_final(
        &self,
        project_id: &ProjectId,
        format: AudioFormat,
        data: &[u8],
    ) -> Result<PathBuf, AudioStorageError> {
        fs::create_dir_all(&self.base_dir).await.map_err(io_error)?;

        // 先写临时文件再改名，下载方不会读到半个文件
        let final_path = self.final_path(project_id, format);
        let tmp_path = final_path.with_extension(format!("{}.part", format.extension()));
        fs::write(&tmp_path, data).await.map_err(io_error)?;
        fs::rename(&tmp_path, &final_path).await.map_err(io_error)?;

        tracing::info!(
            project_id = %project_id,
            path = %final_path.display(),
            size = data.len(),
            "Saved final audiobook"
        );
        Ok(final_path)
    }

    async fn remove_project_dir(&self, project_id: &ProjectId) -> Result<u64, AudioStorageError> {
        let project_dir = self.project_dir(project_id);
        if !project_dir.exists() {
            return Ok(0);
        }

        let mut deleted_count = 0u64;
        let mut entries = fs::read_dir(&project_dir).await.map_err(io_error)?;
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            if entry.file_type().await.map_or(false, |t| t.is_file()) {
                fs::remove_file(entry.path()).await.map_err(io_error)?;
                deleted_count += 1;
            }
        }

        // 目录里还有别的东西时保留目录
        let _ = fs::remove_dir(&project_dir).await;

        tracing::debug!(
            project_id = %project_id,
            files = deleted_count,
            "Removed project clips"
        );
        Ok(deleted_count)
    }

    async fn resolve_download(&self, file_name: &str) -> Result<PathBuf, AudioStorageError> {
        Self::validate_file_name(file_name)?;

        let path = self.base_dir.join(file_name);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(AudioStorageError::FileNotFound(file_name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn pid(id: &str) -> ProjectId {
        ProjectId::new(id).unwrap()
    }

    #[tokio::test]
    async fn test_save_and_read_clip() {
        let temp_dir = tempdir().unwrap();
        let storage = FileAudioStorage::new(temp_dir.path());

        let path = storage
            .save_clip(&pid("book"), 7, AudioFormat::Mp3, b"fake mp3 data")
            .await
            .unwrap();

        assert!(path.starts_with(temp_dir.path().join("book_chunks")));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("clip_00007_"));
        assert!(name.ends_with(".mp3"));
        assert_eq!(storage.read_clip(&path).await.unwrap(), b"fake mp3 data");
    }

    #[tokio::test]
    async fn test_clip_names_never_collide() {
        let temp_dir = tempdir().unwrap();
        let storage = FileAudioStorage::new(temp_dir.path());

        let a = storage.save_clip(&pid("p"), 1, AudioFormat::Wav, b"a").await.unwrap();
        let b = storage.save_clip(&pid("p"), 1, AudioFormat::Wav, b"b").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_remove_project_dir() {
        let temp_dir = tempdir().unwrap();
        let storage = FileAudioStorage::new(temp_dir.path());

        for i in 0..3 {
            storage.save_clip(&pid("p"), i, AudioFormat::Mp3, b"data").await.unwrap();
        }

        assert_eq!(storage.remove_project_dir(&pid("p")).await.unwrap(), 3);
        assert!(!storage.project_dir(&pid("p")).exists());
        assert_eq!(storage.remove_project_dir(&pid("p")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_save_final_and_resolve_download() {
        let temp_dir = tempdir().unwrap();
        let storage = FileAudioStorage::new(temp_dir.path());

        let path = storage
            .save_final(&pid("book"), AudioFormat::Mp3, b"merged")
            .await
            .unwrap();
        assert_eq!(path, temp_dir.path().join("final_audiobook_book.mp3"));

        let resolved = storage
            .resolve_download("final_audiobook_book.mp3")
            .await
            .unwrap();
        assert_eq!(resolved, path);
    }

    #[tokio::test]
    async fn test_resolve_download_rejects_traversal() {
        let temp_dir = tempdir().unwrap();
        let storage = FileAudioStorage::new(temp_dir.path());

        for name in ["../secret.mp3", "a/b.mp3", "..", "", ".hidden.mp3", "notes.txt"] {
            assert!(
                matches!(
                    storage.resolve_download(name).await,
                    Err(AudioStorageError::InvalidFileName(_))
                ),
                "{name} should be rejected"
            );
        }
        assert!(matches!(
            storage.resolve_download("missing.mp3").await,
            Err(AudioStorageError::FileNotFound(_))
        ));
    }
}
