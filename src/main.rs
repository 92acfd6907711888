use std::any::Any;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde_json::json;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod db;
mod error;
mod middleware;
mod models;
mod services;
mod utils;
#[cfg(test)]
mod tests;

use config::Config;
use db::{CharacterStore, RevocationStore, UserStore};
use error::AppError;
use middleware::role::{ADMIN_ONLY, ANY_ROLE, role_middleware};
use models::user::Role;
use services::{auth_service::AuthService, jwt_service::JwtService};

/// Shared handles injected into every handler. The stores are constructed
/// once at startup; clones share the same data.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub jwt_service: JwtService,
    pub revoked: RevocationStore,
    pub characters: CharacterStore,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(jwt_service: JwtService, max_body_bytes: usize) -> Self {
        let users = UserStore::new();

        Self {
            auth_service: AuthService::new(users, jwt_service.clone()),
            jwt_service,
            revoked: RevocationStore::new(),
            characters: CharacterStore::new(),
            max_body_bytes,
        }
    }
}

async fn endpoint_not_found() -> AppError {
    AppError::endpoint_not_found()
}

fn handle_panic(_err: Box<dyn Any + Send + 'static>) -> Response {
    error!("Handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "Internal Server Error" })),
    )
        .into_response()
}

pub fn create_router(state: AppState) -> Router {
    // Create a CORS layer
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    let character_routes = Router::new()
        .route(
            "/characters",
            get(api::characters::list_characters).merge(
                post(api::characters::create_character)
                    .route_layer(from_fn_with_state(ANY_ROLE, role_middleware)),
            ),
        )
        .route(
            "/characters/:id",
            get(api::characters::get_character).merge(
                patch(api::characters::update_character)
                    .delete(api::characters::delete_character)
                    .route_layer(from_fn_with_state(ADMIN_ONLY, role_middleware)),
            ),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/logout", post(api::auth::logout))
        .route("/auth/refresh", post(api::auth::refresh))
        .merge(character_routes)
        .fallback(endpoint_not_found)
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .with_state(state)
}

async fn seed_admin(state: &AppState, config: &Config) {
    let Some(admin) = &config.admin else {
        return;
    };

    match state
        .auth_service
        .create_user_with_role(&admin.email, &admin.password, Role::Admin)
        .await
    {
        Ok(user) => info!(user_id = user.id, "Admin account seeded"),
        Err(e) => error!(error = %e, "Failed to seed admin account"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().inspect_err(|e| error!(error = %e, "Invalid configuration"))?;
    let addr = config.socket_addr()?;

    let state = AppState::new(JwtService::new(&config.jwt_secret), config.max_body_bytes);
    seed_admin(&state, &config).await;

    // Create the router
    let app = create_router(state);

    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
