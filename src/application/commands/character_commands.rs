//! Character Commands - 角色注册表维护命令

/// 为规范名添加别名
#[derive(Debug, Clone)]
pub struct AddCharacterAlias {
    pub canonical: String,
    pub alias: String,
}

/// 设置规范名的音色（音色必须在目录中）
#[derive(Debug, Clone)]
pub struct SetCharacterVoice {
    pub canonical: String,
    pub voice_id: String,
}
