//! Voice Context - 音色目录

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::CatalogError;

/// 单个音色的描述元数据
///
/// 除常用字段外，其余字段原样保留，随目录一起交给 LLM 参考。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// 音色目录：音色 ID → 描述元数据
///
/// 不变量:
/// - 至少包含一个音色
/// - 音色 ID 非空
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VoiceCatalog {
    voices: BTreeMap<String, VoiceProfile>,
}

impl VoiceCatalog {
    pub fn new(voices: BTreeMap<String, VoiceProfile>) -> Result<Self, CatalogError> {
        if voices.is_empty() {
            return Err(CatalogError::Empty);
        }
        if let Some(id) = voices.keys().find(|id| id.trim().is_empty()) {
            return Err(CatalogError::InvalidVoiceId(id.clone()));
        }
        Ok(Self { voices })
    }

    /// 从 JSON 对象解析（`{"voice_id": {...metadata}}`）
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let voices: BTreeMap<String, VoiceProfile> =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::new(voices)
    }

    /// 便于测试的构造：只有 ID，没有元数据
    pub fn from_ids<I, S>(ids: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            ids.into_iter()
                .map(|id| (id.into(), VoiceProfile::default()))
                .collect(),
        )
    }

    pub fn contains(&self, voice_id: &str) -> bool {
        self.voices.contains_key(voice_id)
    }

    pub fn get(&self, voice_id: &str) -> Option<&VoiceProfile> {
        self.voices.get(voice_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.voices.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VoiceProfile)> {
        self.voices.iter()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}
