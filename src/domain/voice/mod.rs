//! Voice Context - 音色目录限界上下文
//!
//! 职责:
//! - 外部提供的可用音色 ID 集合及其描述元数据
//! - 校验音色 ID 是否可合成
//!
//! 目录只读，运行期间从不修改。

mod catalog;
mod errors;

pub use catalog::{VoiceCatalog, VoiceProfile};
pub use errors::CatalogError;
