//! Character Context - Errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CharacterError {
    #[error("角色名不能为空")]
    EmptyName,

    #[error("音色 ID 不能为空")]
    EmptyVoiceId,

    #[error("别名 '{alias}' 已属于 '{existing}'，不能再关联到 '{requested}'")]
    AliasConflict {
        alias: String,
        existing: String,
        requested: String,
    },

    #[error("'{name}' 是 '{owner}' 的别名，不能作为规范名使用")]
    CanonicalIsAlias { name: String, owner: String },
}
