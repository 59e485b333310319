//! Project Store Port - 生成项目状态管理
//!
//! 每个生成请求一条显式状态记录，按句柄查询；具体实现在 infrastructure/memory 层

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::project::{ProjectError, ProjectId, ProjectState};

/// Project Store 错误
#[derive(Debug, Error)]
pub enum ProjectStoreError {
    #[error("Project not found: {0}")]
    NotFound(String),

    #[error("Project already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(#[from] ProjectError),

    #[error("Queue unavailable: {0}")]
    QueueUnavailable(String),
}

/// 生成项目状态记录
#[derive(Debug, Clone)]
pub struct ProjectRecord {
    /// 句柄（查询用）
    pub handle: String,
    pub project_id: ProjectId,
    pub state: ProjectState,
    /// 粗粒度的进度描述
    pub progress: String,
    /// 完成后的输出文件名
    pub output_file: Option<String>,
    pub error_message: Option<String>,
    /// 已合成片段数
    pub clip_count: usize,
    /// 跳过的话语数
    pub skipped_count: usize,
    pub cancel_requested: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectRecord {
    pub fn new(project_id: ProjectId) -> Self {
        let now = Utc::now();
        Self {
            handle: Uuid::new_v4().to_string(),
            project_id,
            state: ProjectState::Queued,
            progress: "Waiting to start...".to_string(),
            output_file: None,
            error_message: None,
            clip_count: 0,
            skipped_count: 0,
            cancel_requested: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 生成完成时的统计
#[derive(Debug, Clone)]
pub struct CompletionInfo {
    pub output_file: String,
    pub clip_count: usize,
    pub skipped_count: usize,
}

/// Project Store Port
///
/// 管理生成项目的生命周期，所有状态存储在内存中
pub trait ProjectStorePort: Send + Sync {
    /// 登记项目并放入生成队列，返回句柄
    fn submit(&self, record: ProjectRecord, text: String) -> Result<String, ProjectStoreError>;

    /// 获取状态记录
    fn get(&self, handle: &str) -> Option<ProjectRecord>;

    /// 取走待处理的原文（只能取一次）
    fn take_input(&self, handle: &str) -> Option<String>;

    /// 状态转换（按状态机校验）
    fn set_state(&self, handle: &str, state: ProjectState) -> Result<(), ProjectStoreError>;

    /// 更新进度描述
    fn set_progress(&self, handle: &str, progress: String);

    /// 标记完成
    fn complete(&self, handle: &str, info: CompletionInfo) -> Result<(), ProjectStoreError>;

    /// 标记失败并记录错误
    fn fail(&self, handle: &str, message: String) -> Result<(), ProjectStoreError>;

    /// 请求取消（协作式）；已终止的项目返回 false
    fn request_cancel(&self, handle: &str) -> Result<bool, ProjectStoreError>;

    /// 是否已请求取消
    fn is_cancel_requested(&self, handle: &str) -> bool;

    /// 列出所有记录（按创建时间）
    fn list(&self) -> Vec<ProjectRecord>;
}
