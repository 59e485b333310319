//! Character Query Handlers

use serde::Serialize;
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::VoiceRegistryPort;
use crate::application::queries::character_queries::{ListCatalogVoices, ListCharacters};
use crate::domain::character::RegistrySnapshot;
use crate::domain::voice::{VoiceCatalog, VoiceProfile};

// ============================================================================
// Response DTOs
// ============================================================================

/// 角色响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterResponse {
    pub name: String,
    pub aliases: Vec<String>,
    pub voice_id: Option<String>,
}

impl CharacterResponse {
    pub fn from_snapshot(canonical: &str, snapshot: &RegistrySnapshot) -> Self {
        Self {
            name: canonical.to_string(),
            aliases: snapshot.aliases.get(canonical).cloned().unwrap_or_default(),
            voice_id: snapshot.voice_of(canonical).map(str::to_string),
        }
    }
}

/// 目录音色响应
#[derive(Debug, Clone, Serialize)]
pub struct CatalogVoiceResponse {
    pub voice_id: String,
    #[serde(flatten)]
    pub profile: VoiceProfile,
}

// ============================================================================
// Handlers
// ============================================================================

/// ListCharacters Handler
pub struct ListCharactersHandler {
    registry: Arc<dyn VoiceRegistryPort>,
}

impl ListCharactersHandler {
    pub fn new(registry: Arc<dyn VoiceRegistryPort>) -> Self {
        Self { registry }
    }

    pub async fn handle(
        &self,
        _query: ListCharacters,
    ) -> Result<Vec<CharacterResponse>, ApplicationError> {
        let snapshot = self.registry.snapshot().await;
        let mut names: Vec<&String> = snapshot
            .aliases
            .keys()
            .chain(snapshot.voices.keys())
            .collect();
        names.sort();
        names.dedup();

        Ok(names
            .into_iter()
            .map(|name| CharacterResponse::from_snapshot(name, &snapshot))
            .collect())
    }
}

/// ListCatalogVoices Handler
pub struct ListCatalogVoicesHandler {
    catalog: Arc<VoiceCatalog>,
}

impl ListCatalogVoicesHandler {
    pub fn new(catalog: Arc<VoiceCatalog>) -> Self {
        Self { catalog }
    }

    pub fn handle(&self, _query: ListCatalogVoices) -> Vec<CatalogVoiceResponse> {
        self.catalog
            .iter()
            .map(|(id, profile)| CatalogVoiceResponse {
                voice_id: id.clone(),
                profile: profile.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::JsonVoiceRegistry;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_list_characters_merges_both_maps() {
        let dir = tempdir().unwrap();
        let registry = Arc::new(JsonVoiceRegistry::open(dir.path()).await.unwrap());
        registry.set_voice("旁白", "V0").await.unwrap();
        registry.add_alias("萧炎", "炎帝").await.unwrap();
        registry.set_voice("萧炎", "V1").await.unwrap();
        registry.add_alias("药老", "药尘").await.unwrap();

        let characters = ListCharactersHandler::new(registry)
            .handle(ListCharacters)
            .await
            .unwrap();

        assert_eq!(characters.len(), 3);
        let xiao_yan = characters.iter().find(|c| c.name == "萧炎").unwrap();
        assert_eq!(xiao_yan.aliases, vec!["炎帝".to_string()]);
        assert_eq!(xiao_yan.voice_id.as_deref(), Some("V1"));
        let yao_lao = characters.iter().find(|c| c.name == "药老").unwrap();
        assert_eq!(yao_lao.voice_id, None);
    }

    #[test]
    fn test_list_catalog_voices() {
        let catalog = Arc::new(
            VoiceCatalog::from_json_str(r#"{"V0": {"name": "解说小明", "gender": "男"}, "V1": {}}"#)
                .unwrap(),
        );
        let voices = ListCatalogVoicesHandler::new(catalog).handle(ListCatalogVoices);

        assert_eq!(voices.len(), 2);
        assert_eq!(voices[0].voice_id, "V0");
        assert_eq!(voices[0].profile.name.as_deref(), Some("解说小明"));
    }
}
