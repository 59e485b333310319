//! Project Context - Value Objects

use serde::{Deserialize, Serialize};

use super::ProjectError;

/// 项目 ID 最大长度
const MAX_PROJECT_ID_LEN: usize = 128;

/// 项目唯一标识
///
/// 会出现在输出文件名和工作目录名里，因此只允许字母、数字、`-`、`_`
/// 以及非 ASCII 文字（如中文书名），禁止路径分隔符和 `..`。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Result<Self, ProjectError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() || trimmed.chars().count() > MAX_PROJECT_ID_LEN {
            return Err(ProjectError::InvalidId(id));
        }
        let safe = trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || (!c.is_ascii() && c.is_alphanumeric()));
        if !safe {
            return Err(ProjectError::InvalidId(id));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// 生成默认项目 ID：`api_audiobook_<8 位十六进制>`
    pub fn generate() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("api_audiobook_{}", &hex[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProjectId {
    type Error = ProjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProjectId> for String {
    fn from(id: ProjectId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 生成状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectState {
    /// 已排队
    Queued,
    /// 生成中
    Processing,
    /// 已完成
    Completed,
    /// 失败（含取消）
    Failed,
}

impl ProjectState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectState::Queued => "queued",
            ProjectState::Processing => "processing",
            ProjectState::Completed => "completed",
            ProjectState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProjectState::Completed | ProjectState::Failed)
    }

    /// 合法转换：queued → processing | failed，processing → completed | failed
    pub fn can_transition_to(&self, next: ProjectState) -> bool {
        matches!(
            (self, next),
            (ProjectState::Queued, ProjectState::Processing)
                | (ProjectState::Queued, ProjectState::Failed)
                | (ProjectState::Processing, ProjectState::Completed)
                | (ProjectState::Processing, ProjectState::Failed)
        )
    }

    pub fn transition(self, next: ProjectState) -> Result<ProjectState, ProjectError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ProjectError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl std::fmt::Display for ProjectState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_id_validation() {
        assert!(ProjectId::new("my_first_audiobook").is_ok());
        assert!(ProjectId::new("斗破苍穹-01").is_ok());
        assert_eq!(ProjectId::new("  padded ").unwrap().as_str(), "padded");
        assert!(ProjectId::new("").is_err());
        assert!(ProjectId::new("../etc").is_err());
        assert!(ProjectId::new("a/b").is_err());
        assert!(ProjectId::new("a b").is_err());
        assert!(ProjectId::new("x".repeat(129)).is_err());
    }

    #[test]
    fn test_generated_project_id() {
        let id = ProjectId::generate();
        assert!(id.as_str().starts_with("api_audiobook_"));
        assert_eq!(id.as_str().len(), "api_audiobook_".len() + 8);
        assert!(ProjectId::new(id.as_str()).is_ok());
    }

    #[test]
    fn test_state_machine() {
        use ProjectState::*;
        assert!(Queued.can_transition_to(Processing));
        assert!(Queued.can_transition_to(Failed));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));

        assert!(!Queued.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Processing));
        assert!(Completed.is_terminal() && Failed.is_terminal());

        assert_eq!(
            Completed.transition(Processing),
            Err(ProjectError::InvalidTransition {
                from: Completed,
                to: Processing
            })
        );
    }

    #[test]
    fn test_state_serde() {
        assert_eq!(serde_json::to_string(&ProjectState::Processing).unwrap(), "\"processing\"");
    }
}
