//! Project Context - Aggregate Root

use std::path::{Path, PathBuf};

use super::{AudioClip, ProjectError, ProjectId};

/// 一次生成运行
///
/// 不变量:
/// - clips 按 sequence 严格递增，只能追加，不能重排
/// - 运行期间由组装器独占
#[derive(Debug, Clone)]
pub struct Project {
    id: ProjectId,
    working_dir: PathBuf,
    output_path: PathBuf,
    clips: Vec<AudioClip>,
}

impl Project {
    pub fn new(id: ProjectId, working_dir: PathBuf, output_path: PathBuf) -> Self {
        Self {
            id,
            working_dir,
            output_path,
            clips: Vec::new(),
        }
    }

    /// 追加片段
    pub fn push_clip(&mut self, clip: AudioClip) -> Result<(), ProjectError> {
        if let Some(last) = self.clips.last() {
            if clip.sequence <= last.sequence {
                return Err(ProjectError::OutOfOrderClip {
                    last: last.sequence,
                    got: clip.sequence,
                });
            }
        }
        self.clips.push(clip);
        Ok(())
    }

    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn clips(&self) -> &[AudioClip] {
        &self.clips
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.clips.iter().map(|c| c.duration_ms).sum()
    }
}
