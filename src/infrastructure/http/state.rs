//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    AddCharacterAliasHandler, CancelGenerationHandler, SetCharacterVoiceHandler,
    SubmitGenerationHandler,
    // Query handlers
    GetAudiobookFileHandler, ListCatalogVoicesHandler, ListCharactersHandler,
    QueryGenerationStatusHandler,
    // Ports
    AudioStoragePort, ProjectStorePort, VoiceRegistryPort,
};
use crate::domain::voice::VoiceCatalog;

/// 应用状态
pub struct AppState {
    /// 公开 Base URL，用于拼接下载链接
    pub base_url: String,

    // ========== Command Handlers ==========
    pub submit_generation_handler: SubmitGenerationHandler,
    pub cancel_generation_handler: CancelGenerationHandler,
    pub add_character_alias_handler: AddCharacterAliasHandler,
    pub set_character_voice_handler: SetCharacterVoiceHandler,

    // ========== Query Handlers ==========
    pub query_generation_status_handler: QueryGenerationStatusHandler,
    pub get_audiobook_file_handler: GetAudiobookFileHandler,
    pub list_characters_handler: ListCharactersHandler,
    pub list_catalog_voices_handler: ListCatalogVoicesHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        base_url: impl Into<String>,
        project_store: Arc<dyn ProjectStorePort>,
        registry: Arc<dyn VoiceRegistryPort>,
        storage: Arc<dyn AudioStoragePort>,
        catalog: Arc<VoiceCatalog>,
    ) -> Self {
        Self {
            base_url: base_url.into(),

            // Command handlers
            submit_generation_handler: SubmitGenerationHandler::new(project_store.clone()),
            cancel_generation_handler: CancelGenerationHandler::new(project_store.clone()),
            add_character_alias_handler: AddCharacterAliasHandler::new(registry.clone()),
            set_character_voice_handler: SetCharacterVoiceHandler::new(
                registry.clone(),
                catalog.clone(),
            ),

            // Query handlers
            query_generation_status_handler: QueryGenerationStatusHandler::new(project_store),
            get_audiobook_file_handler: GetAudiobookFileHandler::new(storage),
            list_characters_handler: ListCharactersHandler::new(registry),
            list_catalog_voices_handler: ListCatalogVoicesHandler::new(catalog),
        }
    }
}
