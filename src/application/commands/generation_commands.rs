//! Generation Commands - 有声书生成命令

use crate::domain::project::ProjectState;

/// 提交生成命令
#[derive(Debug, Clone)]
pub struct SubmitGeneration {
    pub text: String,
    /// 缺省时生成 `api_audiobook_<8位十六进制>`
    pub project_id: Option<String>,
}

/// 提交生成响应
#[derive(Debug, Clone)]
pub struct SubmitGenerationResponse {
    pub handle: String,
    pub project_id: String,
    pub state: ProjectState,
}

/// 取消生成命令（协作式，在话语之间生效）
#[derive(Debug, Clone)]
pub struct CancelGeneration {
    pub handle: String,
}

/// 取消生成响应
#[derive(Debug, Clone)]
pub struct CancelGenerationResponse {
    pub handle: String,
    pub state: ProjectState,
    /// 项目已处于终态时为 false
    pub cancel_requested: bool,
}
