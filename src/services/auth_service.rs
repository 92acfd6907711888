use std::sync::LazyLock;

use bcrypt::{hash, verify};
use thiserror::Error;
use tokio::task;
use tracing::{info, instrument, warn};

use crate::db::UserStore;
use crate::models::jwt::TokenPair;
use crate::models::user::{Role, User, validate_email, validate_password};
use crate::services::jwt_service::{JwtService, TokenError};

const BCRYPT_COST: u32 = 10;

/// Stand-in hash checked when a login names an unknown email.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash("dummy-password", BCRYPT_COST).ok());

#[derive(Clone)]
pub struct AuthService {
    users: UserStore,
    jwt_service: JwtService,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("email already registered")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

impl AuthService {
    pub fn new(users: UserStore, jwt_service: JwtService) -> Self {
        Self { users, jwt_service }
    }

    /// Registers a user with the default `User` role.
    pub async fn create_user(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.create_user_with_role(email, password, Role::User).await
    }

    #[instrument(skip(self, password))]
    pub async fn create_user_with_role(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AuthError> {
        validate_email(email).map_err(AuthError::Validation)?;
        validate_password(password).map_err(AuthError::Validation)?;

        // Skip the expensive hash when the email is obviously taken; the
        // insert below still decides atomically.
        if self.users.contains(email) {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(password.to_string()).await?;

        self.users
            .insert(email, password_hash, role)
            .ok_or(AuthError::EmailTaken)
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.users.find_by_email(email)
    }

    pub async fn validate_password(&self, user: &User, password: &str) -> Result<bool, AuthError> {
        verify_password(password.to_string(), user.password_hash.clone()).await
    }

    /// Clears the stored refresh token. False if the user does not exist.
    #[instrument(skip(self))]
    pub fn revoke_user_session(&self, email: &str) -> bool {
        let revoked = self.users.set_refresh_token(email, None);
        if !revoked {
            warn!(%email, "Cannot revoke session of unknown user");
        }
        revoked
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let Some(user) = self.users.find_by_email(email) else {
            verify_against_dummy(password.to_string()).await?;
            return Err(AuthError::InvalidCredentials);
        };

        if !self.validate_password(&user, password).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.jwt_service.create_tokens(&user)?;
        self.users
            .set_refresh_token(&user.email, Some(tokens.refresh_token.clone()));

        info!(user_id = user.id, "User logged in");
        Ok(tokens)
    }

    /// Exchanges the user's current refresh token for a new pair. The old
    /// refresh token stops working.
    #[instrument(skip_all)]
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .jwt_service
            .verify_refresh_token(refresh_token)
            .map_err(|e| {
                warn!(error = %e, "Refresh token rejected");
                AuthError::InvalidRefreshToken
            })?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .ok_or(AuthError::InvalidRefreshToken)?;

        let tokens = self.jwt_service.create_tokens(&user)?;
        if !self
            .users
            .rotate_refresh_token(user.id, refresh_token, tokens.refresh_token.clone())
        {
            warn!(user_id = user.id, "Refresh token is not the current one");
            return Err(AuthError::InvalidRefreshToken);
        }

        info!(user_id = user.id, "Tokens refreshed");
        Ok(tokens)
    }
}

async fn hash_password(password: String) -> Result<String, AuthError> {
    task::spawn_blocking(move || hash(password, BCRYPT_COST))
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

async fn verify_password(password: String, password_hash: String) -> Result<bool, AuthError> {
    task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

async fn verify_against_dummy(password: String) -> Result<(), AuthError> {
    task::spawn_blocking(move || {
        if let Some(dummy) = DUMMY_HASH.as_ref() {
            let _ = verify(password, dummy);
        }
    })
    .await
    .map_err(|e| AuthError::PasswordHash(e.to_string()))
}
