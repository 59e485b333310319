//! Audiobook Forge - 多角色有声书生成服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Character Context: 角色别名与音色映射
//! - Voice Context: 音色目录
//! - Project Context: 生成项目与状态机
//!
//! 应用层 (application/):
//! - Ports: 端口定义（LlmEngine, TtsEngine, VoiceRegistry, AudioStorage, AudioConcatenator, ProjectStore）
//! - Services: SpeakerAnnotator, AudiobookAssembler
//! - Commands / Queries: CQRS 处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API
//! - Adapters: LLM Client, 流式 TTS Client, 文件存储, 音频拼接
//! - Persistence: 角色注册表 JSON 文件
//! - Memory: 项目状态存储
//! - Worker: GenerationWorker 后台生成

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
