//! Character Command Handlers

use std::sync::Arc;

use crate::application::commands::character_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::VoiceRegistryPort;
use crate::application::queries::handlers::CharacterResponse;
use crate::domain::voice::VoiceCatalog;

async fn load_character(
    registry: &dyn VoiceRegistryPort,
    canonical: &str,
) -> CharacterResponse {
    let snapshot = registry.snapshot().await;
    CharacterResponse::from_snapshot(canonical, &snapshot)
}

/// AddCharacterAlias Handler
pub struct AddCharacterAliasHandler {
    registry: Arc<dyn VoiceRegistryPort>,
}

impl AddCharacterAliasHandler {
    pub fn new(registry: Arc<dyn VoiceRegistryPort>) -> Self {
        Self { registry }
    }

    pub async fn handle(&self, cmd: AddCharacterAlias) -> Result<CharacterResponse, ApplicationError> {
        let canonical = cmd.canonical.trim();
        self.registry.add_alias(canonical, &cmd.alias).await?;

        tracing::info!(canonical = %canonical, alias = %cmd.alias.trim(), "Character alias added");
        Ok(load_character(self.registry.as_ref(), canonical).await)
    }
}

/// SetCharacterVoice Handler
pub struct SetCharacterVoiceHandler {
    registry: Arc<dyn VoiceRegistryPort>,
    catalog: Arc<VoiceCatalog>,
}

impl SetCharacterVoiceHandler {
    pub fn new(registry: Arc<dyn VoiceRegistryPort>, catalog: Arc<VoiceCatalog>) -> Self {
        Self { registry, catalog }
    }

    pub async fn handle(&self, cmd: SetCharacterVoice) -> Result<CharacterResponse, ApplicationError> {
        let canonical = cmd.canonical.trim();
        let voice_id = cmd.voice_id.trim();
        if !self.catalog.contains(voice_id) {
            return Err(ApplicationError::validation(format!(
                "Voice '{}' is not in the catalog",
                voice_id
            )));
        }

        self.registry.set_voice(canonical, voice_id).await?;

        tracing::info!(canonical = %canonical, voice_id = %voice_id, "Character voice set");
        Ok(load_character(self.registry.as_ref(), canonical).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::JsonVoiceRegistry;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_add_alias_and_set_voice() {
        let dir = tempdir().unwrap();
        let registry: Arc<dyn VoiceRegistryPort> =
            Arc::new(JsonVoiceRegistry::open(dir.path()).await.unwrap());
        let catalog = Arc::new(VoiceCatalog::from_ids(["V0", "V1"]).unwrap());

        let added = AddCharacterAliasHandler::new(registry.clone())
            .handle(AddCharacterAlias {
                canonical: "萧炎".to_string(),
                alias: "炎帝".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(added.aliases, vec!["炎帝".to_string()]);
        assert_eq!(added.voice_id, None);

        let handler = SetCharacterVoiceHandler::new(registry.clone(), catalog);
        let updated = handler
            .handle(SetCharacterVoice {
                canonical: "萧炎".to_string(),
                voice_id: "V1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(updated.voice_id.as_deref(), Some("V1"));

        let rejected = handler
            .handle(SetCharacterVoice {
                canonical: "萧炎".to_string(),
                voice_id: "V9".to_string(),
            })
            .await;
        assert!(matches!(rejected, Err(ApplicationError::ValidationError(_))));
        assert_eq!(registry.get_voice("萧炎").await.as_deref(), Some("V1"));
    }

    #[tokio::test]
    async fn test_alias_conflict_is_validation_error() {
        let dir = tempdir().unwrap();
        let registry: Arc<dyn VoiceRegistryPort> =
            Arc::new(JsonVoiceRegistry::open(dir.path()).await.unwrap());
        let handler = AddCharacterAliasHandler::new(registry);

        handler
            .handle(AddCharacterAlias {
                canonical: "萧炎".to_string(),
                alias: "炎帝".to_string(),
            })
            .await
            .unwrap();
        let conflict = handler
            .handle(AddCharacterAlias {
                canonical: "药老".to_string(),
                alias: "炎帝".to_string(),
            })
            .await;
        assert!(matches!(conflict, Err(ApplicationError::ValidationError(_))));
    }
}
