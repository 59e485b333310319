//! Audio Concatenator Port - 音频校验与拼接抽象
//!
//! 校验单个片段可解码并测量时长，再按顺序拼接成一个可播放文件

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 音频处理错误
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Incompatible clips: {0}")]
    IncompatibleClips(String),
}

/// 音频容器格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MP3 - 通用有损格式，帧流可直接拼接
    #[default]
    Mp3,
    /// WAV (PCM) - 拼接时重写 RIFF 头
    Wav,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Wav => "audio/wav",
        }
    }

    /// 从文件扩展名推断
    pub fn from_extension(ext: &str) -> Option<Self> {
        ext.parse().ok()
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mp3" => Ok(AudioFormat::Mp3),
            "wav" => Ok(AudioFormat::Wav),
            _ => Err(AudioError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// 片段信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipInfo {
    /// 时长（毫秒）
    pub duration_ms: u64,
    /// 采样率
    pub sample_rate: u32,
    /// 声道数
    pub channels: u8,
}

/// Audio Concatenator Port
pub trait AudioConcatenatorPort: Send + Sync {
    /// 解码校验片段，返回时长等信息
    fn probe(&self, data: &[u8], format: AudioFormat) -> Result<ClipInfo, AudioError>;

    /// 按给定顺序拼接片段
    fn concat(&self, clips: &[Vec<u8>], format: AudioFormat) -> Result<Vec<u8>, AudioError>;
}
