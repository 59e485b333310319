//! Project Context - Entities

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 单条话语合成后的音频片段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioClip {
    /// 项目内的生产序号（按话语顺序递增，被跳过的话语留下空位）
    pub sequence: u32,
    /// 中间文件路径
    pub path: PathBuf,
    /// 说话人规范名
    pub speaker: String,
    /// 使用的音色 ID
    pub voice_id: String,
    /// 时长（毫秒）
    pub duration_ms: u64,
}
