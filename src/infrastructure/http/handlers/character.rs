//! Character Handlers - 角色注册表与音色目录

use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::application::{
    AddCharacterAlias, CatalogVoiceResponse, CharacterResponse, ListCatalogVoices,
    ListCharacters, SetCharacterVoice,
};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddAliasRequest {
    pub name: String,
    pub alias: String,
}

#[derive(Debug, Deserialize)]
pub struct SetVoiceRequest {
    pub name: String,
    pub voice_id: String,
}

/// 列出所有角色
pub async fn list_characters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CharacterResponse>>>, ApiError> {
    let characters = state.list_characters_handler.handle(ListCharacters).await?;
    Ok(Json(ApiResponse::success(characters)))
}

/// 为角色登记别名
pub async fn add_character_alias(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddAliasRequest>,
) -> Result<Json<ApiResponse<CharacterResponse>>, ApiError> {
    let result = state
        .add_character_alias_handler
        .handle(AddCharacterAlias {
            canonical: req.name,
            alias: req.alias,
        })
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// 指定角色音色
pub async fn set_character_voice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetVoiceRequest>,
) -> Result<Json<ApiResponse<CharacterResponse>>, ApiError> {
    let result = state
        .set_character_voice_handler
        .handle(SetCharacterVoice {
            canonical: req.name,
            voice_id: req.voice_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// 音色目录
pub async fn list_catalog_voices(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<CatalogVoiceResponse>>> {
    Json(ApiResponse::success(
        state.list_catalog_voices_handler.handle(ListCatalogVoices),
    ))
}
