//! Project Context - Errors

use thiserror::Error;

use super::ProjectState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
    #[error("无效的项目 ID: {0}")]
    InvalidId(String),

    #[error("非法状态转换: {from} -> {to}")]
    InvalidTransition { from: ProjectState, to: ProjectState },

    #[error("音频片段乱序: 上一个序号 {last}，收到 {got}")]
    OutOfOrderClip { last: u32, got: u32 },
}
