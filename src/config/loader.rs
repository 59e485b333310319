//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `AUDIOBOOK_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `AUDIOBOOK_SERVER__PORT=8080`
/// - `AUDIOBOOK_LLM__API_KEY=...`
/// - `AUDIOBOOK_TTS__APP_ID=...`
/// - `AUDIOBOOK_TTS__ACCESS_KEY=...`
/// - `AUDIOBOOK_AUDIO__FORMAT=wav`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5000)?
        .set_default("server.max_body_size", 10 * 1024 * 1024)?
        .set_default("llm.endpoint", "https://ark.cn-beijing.volces.com/api/v3/chat/completions")?
        .set_default("llm.model", "doubao-seed-1-6-250615")?
        .set_default("llm.timeout_secs", 120)?
        .set_default("tts.endpoint", "https://openspeech.bytedance.com/api/v3/tts/unidirectional")?
        .set_default("tts.resource_id", "volc.service_type.10029")?
        .set_default("tts.timeout_secs", 60)?
        .set_default("tts.sample_rate", 24000)?
        .set_default("tts.bit_rate", 160)?
        .set_default("audio.format", "mp3")?
        .set_default("pipeline.narrator_name", "旁白")?
        .set_default("pipeline.narrator_voice_id", "zh_male_jieshuoxiaoming_moon_bigtts")?
        .set_default("pipeline.max_concurrent_projects", 2)?
        .set_default("pipeline.keep_intermediate", false)?
        .set_default("pipeline.queue_capacity", 64)?
        .set_default("storage.output_dir", "data/audiobooks")?
        .set_default("storage.registry_dir", "data")?
        .set_default("storage.catalog_path", "assets/voice_catalog.json")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: AUDIOBOOK_TTS__ACCESS_KEY=xxx
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("AUDIOBOOK")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.llm.endpoint.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "LLM endpoint cannot be empty".to_string(),
        ));
    }

    if config.tts.endpoint.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS endpoint cannot be empty".to_string(),
        ));
    }

    if config.llm.timeout_secs == 0 || config.tts.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Backend timeouts must be greater than 0".to_string(),
        ));
    }

    if config.pipeline.max_concurrent_projects == 0 {
        return Err(ConfigError::ValidationError(
            "max_concurrent_projects must be greater than 0".to_string(),
        ));
    }

    if config.pipeline.queue_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "queue_capacity must be greater than 0".to_string(),
        ));
    }

    if config.pipeline.narrator_name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Narrator name cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 校验后端凭据（启动时调用，缺失即退出）
pub fn check_credentials(config: &AppConfig) -> Result<(), ConfigError> {
    let required = [
        ("llm.api_key", &config.llm.api_key),
        ("tts.app_id", &config.tts.app_id),
        ("tts.access_key", &config.tts.access_key),
        ("tts.resource_id", &config.tts.resource_id),
    ];

    match required.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(ConfigError::MissingCredential(name)),
        None => Ok(()),
    }
}

/// 打印配置信息（用于启动时日志，不输出凭据）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Public Base URL: {}", config.server.public_base_url());
    tracing::info!("LLM Endpoint: {}", config.llm.endpoint);
    tracing::info!("LLM Model: {}", config.llm.model);
    tracing::info!("TTS Endpoint: {}", config.tts.endpoint);
    tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
    tracing::info!("Audio Format: {}", config.audio.format);
    tracing::info!(
        "Narrator: {} ({})",
        config.pipeline.narrator_name,
        config.pipeline.narrator_voice_id
    );
    tracing::info!("Max Concurrent Projects: {}", config.pipeline.max_concurrent_projects);
    tracing::info!("Output Directory: {:?}", config.storage.output_dir);
    tracing::info!("Registry Directory: {:?}", config.storage.registry_dir);
    tracing::info!("Voice Catalog: {:?}", config.storage.catalog_path);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::AudioFormat;
    use tempfile::tempdir;

    #[test]
    fn test_validation_passes_for_default_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_endpoint() {
        let mut config = AppConfig::default();
        config.tts.endpoint = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_timeout_or_concurrency() {
        let mut config = AppConfig::default();
        config.llm.timeout_secs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.pipeline.max_concurrent_projects = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_missing_credentials() {
        let mut config = AppConfig::default();
        assert!(matches!(
            check_credentials(&config),
            Err(ConfigError::MissingCredential("llm.api_key"))
        ));

        config.llm.api_key = "ark-key".to_string();
        config.tts.app_id = "app".to_string();
        assert!(matches!(
            check_credentials(&config),
            Err(ConfigError::MissingCredential("tts.access_key"))
        ));

        config.tts.access_key = "token".to_string();
        assert!(check_credentials(&config).is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 8080

[audio]
format = "wav"

[pipeline]
keep_intermediate = true
"#,
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.audio.format, AudioFormat::Wav);
        assert!(config.pipeline.keep_intermediate);
        assert_eq!(config.pipeline.narrator_name, "旁白");
        assert_eq!(config.tts.sample_rate, 24000);
    }
}
