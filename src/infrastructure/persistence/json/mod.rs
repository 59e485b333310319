//! JSON 文件持久化
//!
//! - registry_store: 角色别名/音色注册表
//! - catalog: 音色目录加载

mod catalog;
mod registry_store;

pub use catalog::load_voice_catalog;
pub use registry_store::{JsonVoiceRegistry, ALIASES_FILE, VOICES_FILE};
