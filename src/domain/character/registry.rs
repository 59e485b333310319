//! Character Context - 角色注册表
//!
//! 两张持久映射（规范名 → 别名列表、规范名 → 音色 ID）加一个内存反向索引
//! （任意名称 → 规范名）。反向索引随每次写入增量维护，解析是 O(1)，
//! 别名冲突在插入时即可发现。

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::CharacterError;

/// 规范名 → 别名列表
pub type AliasMap = BTreeMap<String, Vec<String>>;

/// 规范名 → 音色 ID
pub type VoiceMap = BTreeMap<String, String>;

/// 注册表快照（只读副本，供 LLM 提示词和外部查询使用）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub aliases: AliasMap,
    pub voices: VoiceMap,
}

impl RegistrySnapshot {
    /// 快照内的名称解析（线性扫描，仅用于快照副本）
    pub fn resolve(&self, name: &str) -> Option<&str> {
        if let Some((canonical, _)) = self.voices.get_key_value(name) {
            return Some(canonical.as_str());
        }
        self.aliases
            .iter()
            .find(|(canonical, aliases)| canonical.as_str() == name || aliases.iter().any(|a| a == name))
            .map(|(canonical, _)| canonical.as_str())
    }

    pub fn voice_of(&self, canonical: &str) -> Option<&str> {
        self.voices.get(canonical).map(String::as_str)
    }
}

/// 角色注册表
///
/// 不变量:
/// - 每个别名只映射到一个规范名
/// - 一个规范名不能同时是另一个角色的别名
/// - 每个规范名至多一个音色 ID，后写覆盖先写
#[derive(Debug, Clone, Default)]
pub struct CharacterRegistry {
    aliases: AliasMap,
    voices: VoiceMap,
    /// 名称（规范名或别名）→ 规范名
    index: HashMap<String, String>,
}

impl CharacterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从持久化的两张映射恢复注册表
    ///
    /// 文件被手工编辑导致别名冲突时，按规范名字典序保留先出现的归属，
    /// 其余冲突项只记录告警，不会生成第二个规范条目。
    pub fn from_maps(aliases: AliasMap, voices: VoiceMap) -> Self {
        let mut index: HashMap<String, String> = HashMap::new();

        for canonical in aliases.keys().chain(voices.keys()) {
            index
                .entry(canonical.clone())
                .or_insert_with(|| canonical.clone());
        }

        for (canonical, names) in &aliases {
            for alias in names {
                match index.get(alias) {
                    Some(owner) if owner != canonical => {
                        tracing::warn!(
                            alias = %alias,
                            owner = %owner,
                            ignored = %canonical,
                            "Conflicting alias in registry file, keeping first owner"
                        );
                    }
                    Some(_) => {}
                    None => {
                        index.insert(alias.clone(), canonical.clone());
                    }
                }
            }
        }

        Self {
            aliases,
            voices,
            index,
        }
    }

    /// 解析名称：规范名或任意别名 → 规范名
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.index.get(name).map(String::as_str)
    }

    /// 为规范名添加别名
    ///
    /// 幂等：别名已记录时不产生变更。返回是否产生了变更。
    pub fn add_alias(&mut self, canonical: &str, alias: &str) -> Result<bool, CharacterError> {
        let canonical = canonical.trim();
        let alias = alias.trim();
        if canonical.is_empty() || alias.is_empty() {
            return Err(CharacterError::EmptyName);
        }
        self.ensure_not_alias(canonical)?;

        if let Some(owner) = self.index.get(alias) {
            if owner != canonical {
                return Err(CharacterError::AliasConflict {
                    alias: alias.to_string(),
                    existing: owner.clone(),
                    requested: canonical.to_string(),
                });
            }
        }

        let mut changed = !self.aliases.contains_key(canonical);
        let names = self.aliases.entry(canonical.to_string()).or_default();
        if alias != canonical && !names.iter().any(|a| a == alias) {
            names.push(alias.to_string());
            changed = true;
        }

        self.index
            .entry(canonical.to_string())
            .or_insert_with(|| canonical.to_string());
        self.index.insert(alias.to_string(), canonical.to_string());

        Ok(changed)
    }

    pub fn get_voice(&self, canonical: &str) -> Option<&str> {
        self.voices.get(canonical).map(String::as_str)
    }

    /// 设置规范名的音色（无条件覆盖）。返回是否产生了变更。
    pub fn set_voice(&mut self, canonical: &str, voice_id: &str) -> Result<bool, CharacterError> {
        let canonical = canonical.trim();
        let voice_id = voice_id.trim();
        if canonical.is_empty() {
            return Err(CharacterError::EmptyName);
        }
        if voice_id.is_empty() {
            return Err(CharacterError::EmptyVoiceId);
        }
        self.ensure_not_alias(canonical)?;

        let previous = self
            .voices
            .insert(canonical.to_string(), voice_id.to_string());
        self.index
            .entry(canonical.to_string())
            .or_insert_with(|| canonical.to_string());

        Ok(previous.as_deref() != Some(voice_id))
    }

    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    pub fn voices(&self) -> &VoiceMap {
        &self.voices
    }

    /// 所有规范名（别名表与音色表的并集，有序）
    pub fn characters(&self) -> Vec<String> {
        self.aliases
            .keys()
            .chain(self.voices.keys())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            aliases: self.aliases.clone(),
            voices: self.voices.clone(),
        }
    }

    fn ensure_not_alias(&self, canonical: &str) -> Result<(), CharacterError> {
        match self.index.get(canonical) {
            Some(owner) if owner != canonical => Err(CharacterError::CanonicalIsAlias {
                name: canonical.to_string(),
                owner: owner.clone(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_canonical_and_aliases() {
        let mut registry = CharacterRegistry::new();
        registry.add_alias("哈利波特", "救世主").unwrap();
        registry.add_alias("哈利波特", "大难不死的男孩").unwrap();

        assert_eq!(registry.resolve("哈利波特"), Some("哈利波特"));
        assert_eq!(registry.resolve("救世主"), Some("哈利波特"));
        assert_eq!(registry.resolve("大难不死的男孩"), Some("哈利波特"));
        assert_eq!(registry.resolve("赫敏"), None);
    }

    #[test]
    fn test_add_alias_is_idempotent() {
        let mut once = CharacterRegistry::new();
        once.add_alias("赫敏", "万事通小姐").unwrap();

        let mut twice = CharacterRegistry::new();
        assert!(twice.add_alias("赫敏", "万事通小姐").unwrap());
        assert!(!twice.add_alias("赫敏", "万事通小姐").unwrap());

        assert_eq!(once.snapshot(), twice.snapshot());
        assert_eq!(twice.aliases()["赫敏"], vec!["万事通小姐".to_string()]);
    }

    #[test]
    fn test_alias_cannot_belong_to_two_characters() {
        let mut registry = CharacterRegistry::new();
        registry.add_alias("哈利波特", "波特").unwrap();

        let err = registry.add_alias("詹姆", "波特").unwrap_err();
        assert!(matches!(err, CharacterError::AliasConflict { .. }));
        assert_eq!(registry.resolve("波特"), Some("哈利波特"));
        assert!(!registry.aliases().contains_key("詹姆"));
    }

    #[test]
    fn test_alias_cannot_become_canonical() {
        let mut registry = CharacterRegistry::new();
        registry.add_alias("哈利波特", "救世主").unwrap();

        let err = registry.set_voice("救世主", "v1").unwrap_err();
        assert!(matches!(err, CharacterError::CanonicalIsAlias { .. }));
        let err = registry.add_alias("救世主", "哈利").unwrap_err();
        assert!(matches!(err, CharacterError::CanonicalIsAlias { .. }));
    }

    #[test]
    fn test_set_voice_overwrites_and_registers_canonical() {
        let mut registry = CharacterRegistry::new();
        assert!(registry.set_voice("小明", "V1").unwrap());
        assert!(!registry.set_voice("小明", "V1").unwrap());
        assert!(registry.set_voice("小明", "V2").unwrap());

        assert_eq!(registry.get_voice("小明"), Some("V2"));
        assert_eq!(registry.resolve("小明"), Some("小明"));
        assert_eq!(registry.characters(), vec!["小明".to_string()]);
    }

    #[test]
    fn test_empty_names_rejected() {
        let mut registry = CharacterRegistry::new();
        assert_eq!(registry.add_alias(" ", "a"), Err(CharacterError::EmptyName));
        assert_eq!(registry.set_voice("a", ""), Err(CharacterError::EmptyVoiceId));
    }

    #[test]
    fn test_from_maps_keeps_first_owner_on_conflict() {
        let mut aliases = AliasMap::new();
        aliases.insert("乙".to_string(), vec!["共同".to_string()]);
        aliases.insert("甲".to_string(), vec!["共同".to_string()]);
        let registry = CharacterRegistry::from_maps(aliases, VoiceMap::new());

        // BTreeMap 按字典序遍历，"乙" 先于 "甲"
        let first = if "乙" < "甲" { "乙" } else { "甲" };
        assert_eq!(registry.resolve("共同"), Some(first));
        assert_eq!(registry.resolve("甲"), Some("甲"));
        assert_eq!(registry.resolve("乙"), Some("乙"));
    }

    #[test]
    fn test_snapshot_resolve_matches_registry() {
        let mut registry = CharacterRegistry::new();
        registry.add_alias("萧炎", "炎帝").unwrap();
        registry.set_voice("萧炎", "V3").unwrap();
        registry.set_voice("旁白", "V0").unwrap();

        let snapshot = registry.snapshot();
        for name in ["萧炎", "炎帝", "旁白"] {
            assert_eq!(snapshot.resolve(name), registry.resolve(name));
        }
        assert_eq!(snapshot.resolve("药老"), None);
        assert_eq!(snapshot.voice_of("萧炎"), Some("V3"));
    }
}
