//! Character Queries

/// 列出注册表中的所有角色
#[derive(Debug, Clone)]
pub struct ListCharacters;

/// 列出音色目录
#[derive(Debug, Clone)]
pub struct ListCatalogVoices;
