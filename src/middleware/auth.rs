use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::{
    AppState,
    error::AppError,
    models::jwt::AccessClaims,
    services::jwt_service::TokenError,
};

/// The authenticated principal, stored in request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AccessClaims);

/// Returns the bearer value of the `Authorization` header, if there is a
/// non-empty one.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Missing token → 401. Revoked, expired or forged token → 403.
pub fn authenticate(state: &AppState, token: Option<&str>) -> Result<AccessClaims, AppError> {
    let token = token.ok_or_else(AppError::unauthorized)?;

    if state.revoked.is_revoked(token) {
        debug!("Rejected revoked token");
        return Err(AppError::forbidden());
    }

    state.jwt_service.verify_access_token(token).map_err(|err| {
        match err {
            TokenError::Expired => debug!("Rejected expired token"),
            TokenError::Invalid => warn!("Rejected malformed or forged token"),
            TokenError::Signing(_) => {}
        }
        AppError::forbidden()
    })
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&state, bearer_token(request.headers()))?;

    request.extensions_mut().insert(CurrentUser(claims));

    Ok(next.run(request).await)
}
