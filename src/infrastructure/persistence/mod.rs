//! Persistence Layer - 数据持久化
//!
//! 跨进程重启保留的只有角色注册表（两个 JSON 文件）；音色目录只读

pub mod json;

pub use self::json::{load_voice_catalog, JsonVoiceRegistry};
