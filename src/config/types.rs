//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::ports::AudioFormat;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM 配置
    #[serde(default)]
    pub llm: LlmConfig,

    /// TTS 引擎配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 音频配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 流水线配置
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 公开访问的 Base URL（拼接下载链接）
    /// 如果未设置，则使用 http://{host}:{port}
    #[serde(default)]
    pub base_url: Option<String>,

    /// 请求体上限（字节）
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024 // 10 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
            max_body_size: default_max_body_size(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 获取公开的 Base URL
    pub fn public_base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            let host = if self.host == "0.0.0.0" {
                "localhost"
            } else {
                &self.host
            };
            format!("http://{}:{}", host, self.port)
        })
    }
}

/// LLM 配置（Ark chat completions）
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_endpoint() -> String {
    "https://ark.cn-beijing.volces.com/api/v3/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "doubao-seed-1-6-250615".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            api_key: String::new(),
            model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// TTS 引擎配置（流式合成接口）
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_tts_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub app_id: String,

    #[serde(default)]
    pub access_key: String,

    #[serde(default = "default_tts_resource_id")]
    pub resource_id: String,

    /// 请求超时时间（秒），覆盖整个流
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_bit_rate")]
    pub bit_rate: u32,
}

fn default_tts_endpoint() -> String {
    "https://openspeech.bytedance.com/api/v3/tts/unidirectional".to_string()
}

fn default_tts_resource_id() -> String {
    "volc.service_type.10029".to_string()
}

fn default_tts_timeout() -> u64 {
    60
}

fn default_sample_rate() -> u32 {
    24000
}

fn default_bit_rate() -> u32 {
    160
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_tts_endpoint(),
            app_id: String::new(),
            access_key: String::new(),
            resource_id: default_tts_resource_id(),
            timeout_secs: default_tts_timeout(),
            sample_rate: default_sample_rate(),
            bit_rate: default_bit_rate(),
        }
    }
}

/// 音频配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioConfig {
    /// 输出格式
    /// 可选: mp3, wav
    #[serde(default)]
    pub format: AudioFormat,
}

/// 流水线配置
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// 旁白角色名
    #[serde(default = "default_narrator_name")]
    pub narrator_name: String,

    /// 旁白默认音色，必须在音色目录中
    #[serde(default = "default_narrator_voice_id")]
    pub narrator_voice_id: String,

    /// 最大并发项目数
    #[serde(default = "default_max_concurrent_projects")]
    pub max_concurrent_projects: usize,

    /// 是否保留中间片段（调试用）
    #[serde(default)]
    pub keep_intermediate: bool,

    /// 生成队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_narrator_name() -> String {
    "旁白".to_string()
}

fn default_narrator_voice_id() -> String {
    "zh_male_jieshuoxiaoming_moon_bigtts".to_string()
}

fn default_max_concurrent_projects() -> usize {
    2
}

fn default_queue_capacity() -> usize {
    64
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            narrator_name: default_narrator_name(),
            narrator_voice_id: default_narrator_voice_id(),
            max_concurrent_projects: default_max_concurrent_projects(),
            keep_intermediate: false,
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 有声书输出目录（中间片段子目录与成品文件）
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// 角色注册表目录（character_aliases.json / character_voices.json）
    #[serde(default = "default_registry_dir")]
    pub registry_dir: PathBuf,

    /// 音色目录文件
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/audiobooks")
}

fn default_registry_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("assets/voice_catalog.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            registry_dir: default_registry_dir(),
            catalog_path: default_catalog_path(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
