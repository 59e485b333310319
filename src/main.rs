//! Audiobook Forge - 多角色有声书生成服务
//!
//! 启动顺序：配置 → 日志 → 凭据与音色目录校验 → 注册表 → 后端客户端 → Worker → HTTP

use std::sync::Arc;

use audiobook_forge::application::ports::VoiceRegistryPort;
use audiobook_forge::application::services::{
    AssemblerConfig, AudiobookAssembler, NarratorConfig, SpeakerAnnotator,
};
use audiobook_forge::config::{check_credentials, load_config, print_config, LogConfig};
use audiobook_forge::infrastructure::adapters::{
    FileAudioStorage, HttpLlmClient, HttpLlmClientConfig, HttpTtsClient, HttpTtsClientConfig,
    SymphoniaConcatenator,
};
use audiobook_forge::infrastructure::http::{AppState, HttpServer};
use audiobook_forge::infrastructure::memory::InMemoryProjectStore;
use audiobook_forge::infrastructure::persistence::{load_voice_catalog, JsonVoiceRegistry};
use audiobook_forge::infrastructure::worker::{GenerationWorker, GenerationWorkerConfig};
use tokio::sync::mpsc;

fn init_tracing(log: &LogConfig) {
    let log_filter = format!("{},audiobook_forge={},tower_http=debug", log.level, log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);

    tracing::info!("Audiobook Forge - 多角色有声书生成服务");
    print_config(&config);

    // 凭据和音色目录缺失时直接退出，不接受任何请求
    check_credentials(&config).map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    let catalog = Arc::new(load_voice_catalog(&config.storage.catalog_path).await?);
    if !catalog.contains(&config.pipeline.narrator_voice_id) {
        anyhow::bail!(
            "Configuration error: narrator voice '{}' is not in the voice catalog",
            config.pipeline.narrator_voice_id
        );
    }
    tracing::info!(voices = catalog.len(), "Voice catalog loaded");

    // 确保数据目录存在
    tokio::fs::create_dir_all(&config.storage.output_dir).await?;

    // 角色注册表（两个 JSON 文件）
    let registry: Arc<dyn VoiceRegistryPort> =
        Arc::new(JsonVoiceRegistry::open(&config.storage.registry_dir).await?);

    // 后端客户端
    let llm = Arc::new(HttpLlmClient::new(HttpLlmClientConfig {
        endpoint: config.llm.endpoint.clone(),
        api_key: config.llm.api_key.clone(),
        model: config.llm.model.clone(),
        timeout_secs: config.llm.timeout_secs,
    })?);
    let tts = Arc::new(HttpTtsClient::new(HttpTtsClientConfig {
        endpoint: config.tts.endpoint.clone(),
        app_id: config.tts.app_id.clone(),
        access_key: config.tts.access_key.clone(),
        resource_id: config.tts.resource_id.clone(),
        timeout_secs: config.tts.timeout_secs,
        sample_rate: config.tts.sample_rate,
        bit_rate: config.tts.bit_rate,
    })?);

    let storage = Arc::new(FileAudioStorage::new(&config.storage.output_dir));

    // 流水线
    let annotator = Arc::new(SpeakerAnnotator::new(
        llm,
        registry.clone(),
        catalog.clone(),
        NarratorConfig {
            name: config.pipeline.narrator_name.clone(),
            default_voice_id: config.pipeline.narrator_voice_id.clone(),
        },
    ));
    let assembler = Arc::new(AudiobookAssembler::new(
        annotator,
        tts,
        registry.clone(),
        storage.clone(),
        Arc::new(SymphoniaConcatenator::new()),
        AssemblerConfig {
            format: config.audio.format,
            keep_intermediate: config.pipeline.keep_intermediate,
        },
    ));

    // 生成队列与项目状态存储
    let (queue_tx, queue_rx) = mpsc::channel(config.pipeline.queue_capacity);
    let project_store = Arc::new(InMemoryProjectStore::new(queue_tx));

    // 启动 Worker
    let worker = GenerationWorker::new(
        GenerationWorkerConfig {
            max_concurrent: config.pipeline.max_concurrent_projects,
        },
        queue_rx,
        project_store.clone(),
        assembler,
    );
    tokio::spawn(worker.run());

    // 创建 HTTP 服务器
    let state = AppState::new(
        config.server.public_base_url(),
        project_store,
        registry,
        storage,
        catalog,
    );
    let server = HttpServer::new(config.server.clone(), state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
