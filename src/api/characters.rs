use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use crate::{
    AppState,
    error::{AppError, AppResult},
    middleware::auth::CurrentUser,
    models::character::{Character, CharacterInput},
    utils::body::JsonBody,
};

fn parse_id(raw: &str) -> AppResult<i64> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("Invalid character id: {raw}")))
}

fn character_not_found() -> AppError {
    AppError::NotFound("Character Not Found".into())
}

pub async fn list_characters(State(state): State<AppState>) -> Json<Vec<Character>> {
    Json(state.characters.list())
}

pub async fn get_character(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Character>> {
    let id = parse_id(&id)?;
    state
        .characters
        .get(id)
        .map(Json)
        .ok_or_else(character_not_found)
}

pub async fn create_character(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    JsonBody(payload): JsonBody<CharacterInput>,
) -> AppResult<(StatusCode, Json<Character>)> {
    payload.validate().map_err(AppError::Validation)?;

    let character = state.characters.insert(payload);
    info!(character_id = character.id, user_id = current_user.0.sub, "Character created");

    Ok((StatusCode::CREATED, Json(character)))
}

pub async fn update_character(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<CharacterInput>,
) -> AppResult<Json<Character>> {
    let id = parse_id(&id)?;
    payload.validate().map_err(AppError::Validation)?;

    let character = state
        .characters
        .update(id, payload)
        .ok_or_else(character_not_found)?;
    info!(character_id = id, user_id = current_user.0.sub, "Character updated");

    Ok(Json(character))
}

pub async fn delete_character(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id)?;

    if !state.characters.delete(id) {
        return Err(character_not_found());
    }
    info!(character_id = id, user_id = current_user.0.sub, "Character deleted");

    Ok(StatusCode::NO_CONTENT)
}
