use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::{error::AppError, middleware::auth::CurrentUser, models::user::Role};

pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const ANY_ROLE: &[Role] = &[Role::Admin, Role::User];

pub fn authorize(principal: &CurrentUser, allowed: &[Role]) -> bool {
    allowed.contains(&principal.0.role)
}

pub fn require_role(principal: &CurrentUser, allowed: &[Role]) -> Result<(), AppError> {
    if authorize(principal, allowed) {
        Ok(())
    } else {
        debug!(user_id = principal.0.sub, role = ?principal.0.role, ?allowed, "Role not permitted");
        Err(AppError::forbidden())
    }
}

/// Route layer placed inside `auth_middleware`. Rejects before the handler
/// extracts or parses anything from the request.
pub async fn role_middleware(
    State(allowed): State<&'static [Role]>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let current_user = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(AppError::unauthorized)?;
    require_role(current_user, allowed)?;

    Ok(next.run(request).await)
}
