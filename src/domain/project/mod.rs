//! Project Context - 有声书生成项目限界上下文
//!
//! 职责:
//! - 项目标识与文件名安全校验
//! - 生成状态机（queued → processing → completed | failed）
//! - 有序音频片段列表

mod aggregate;
mod entities;
mod errors;
mod value_objects;

pub use aggregate::Project;
pub use entities::AudioClip;
pub use errors::ProjectError;
pub use value_objects::{ProjectId, ProjectState};
