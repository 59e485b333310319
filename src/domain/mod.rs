//! Domain Layer - 领域层
//!
//! 包含三个限界上下文:
//! - Character Context: 角色别名与音色映射
//! - Voice Context: 音色目录
//! - Project Context: 有声书生成项目
//!
//! 以及流水线共享的段落分割与话语类型

pub mod character;
pub mod project;
pub mod voice;

mod paragraph;
mod utterance;

pub use paragraph::split_paragraphs;
pub use utterance::{Annotation, FallbackReason, Utterance};
