//! Character Context - 角色限界上下文
//!
//! 职责:
//! - 规范角色名与别名的对应关系
//! - 规范角色名与音色 ID 的对应关系
//! - 别名不相交约束（一个别名只属于一个规范名）

mod errors;
mod registry;

pub use errors::CharacterError;
pub use registry::{AliasMap, CharacterRegistry, RegistrySnapshot, VoiceMap};
