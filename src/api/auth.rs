use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

use crate::{
    AppState,
    error::{AppError, AppResult},
    middleware::auth::bearer_token,
    models::{
        jwt::TokenPair,
        user::{Credentials, User},
    },
    services::auth_service::AuthError,
    utils::body::JsonBody,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    refresh_token: String,
}

#[instrument(skip_all, fields(email = %payload.email))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<Credentials>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state
        .auth_service
        .create_user(&payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip_all, fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<Credentials>,
) -> AppResult<Json<TokenPair>> {
    payload.validate().map_err(AppError::Validation)?;

    let tokens = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(tokens))
}

/// Revokes the presented access token whether or not it still verifies. When
/// it verifies and was not already revoked, the owner's refresh token is
/// cleared as well.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<Value>> {
    let token = bearer_token(&headers).ok_or_else(AppError::endpoint_not_found)?;

    // A revoked token no longer speaks for its owner.
    if state.revoked.is_revoked(token) {
        debug!("Logout with an already revoked token");
        return Ok(Json(json!({ "message": "Logged out" })));
    }

    // The revocation must outlive the token, so a token that no longer
    // verifies is kept for the longest lifetime an access token can have.
    let claims = state.jwt_service.verify_access_token(token).ok();
    let expires_at = claims.as_ref().map(|c| c.exp).unwrap_or_else(|| {
        (chrono::Utc::now() + state.jwt_service.access_ttl()).timestamp()
    });
    state.revoked.revoke(token, expires_at);

    if let Some(claims) = claims {
        if !state.auth_service.revoke_user_session(&claims.email) {
            return Err(AuthError::UserNotFound.into());
        }
        info!(user_id = claims.sub, "User logged out");
    }

    Ok(Json(json!({ "message": "Logged out" })))
}

pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RefreshRequest>,
) -> AppResult<Json<TokenPair>> {
    let tokens = state.auth_service.refresh(&payload.refresh_token)?;
    Ok(Json(tokens))
}
