// src/services/jwt_service.rs
use crate::models::jwt::{
    ACCESS_TOKEN_TYPE, AccessClaims, REFRESH_TOKEN_TYPE, RefreshClaims, TokenPair,
};
use crate::models::user::{Role, User};

use chrono::Duration;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::Error as JwtError, errors::ErrorKind,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token malformed or signature invalid")]
    Invalid,
    #[error("failed to sign token: {0}")]
    Signing(JwtError),
}

impl From<JwtError> for TokenError {
    fn from(err: JwtError) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        }
    }
}

#[derive(Clone)]
pub struct JwtService {
    keys: Arc<Keys>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

struct Keys {
    enc_key: EncodingKey,
    dec_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret_key: &str) -> Self {
        Self::with_ttls(secret_key, Duration::hours(1), Duration::days(1))
    }

    pub fn with_ttls(secret_key: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let keys = Keys {
            enc_key: EncodingKey::from_secret(secret_key.as_bytes()),
            dec_key: DecodingKey::from_secret(secret_key.as_bytes()),
        };

        Self {
            keys: Arc::new(keys),
            access_ttl,
            refresh_ttl,
        }
    }

    /* ---------- PUBLIC API ---------- */

    /// Signs `{sub, email, role}` with a one hour expiry.
    pub fn issue_access_token(
        &self,
        user_id: i64,
        email: &str,
        role: Role,
    ) -> Result<String, TokenError> {
        self.create_jwt(&AccessClaims::new(user_id, email, role, self.access_ttl))
    }

    /// Signs `{sub}` with a one day expiry.
    pub fn issue_refresh_token(&self, user_id: i64) -> Result<String, TokenError> {
        self.create_jwt(&RefreshClaims::new(user_id, self.refresh_ttl))
    }

    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub fn create_tokens(&self, user: &User) -> Result<TokenPair, TokenError> {
        let access_token = self.issue_access_token(user.id, &user.email, user.role)?;
        let refresh_token = self.issue_refresh_token(user.id)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Checks signature, expiry and token type. Revocation is not consulted
    /// here; the authentication middleware does that.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims = self.decode_jwt::<AccessClaims>(token)?;
        if claims.token_type != ACCESS_TOKEN_TYPE {
            debug!(token_type = %claims.token_type, "Wrong token type for access");
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let claims = self.decode_jwt::<RefreshClaims>(token)?;
        if claims.token_type != REFRESH_TOKEN_TYPE {
            debug!(token_type = %claims.token_type, "Wrong token type for refresh");
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /* ---------- PRIVATE HELPERS ---------- */

    fn create_jwt<T: serde::Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.keys.enc_key).map_err(TokenError::Signing)
    }

    fn decode_jwt<T: serde::de::DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Ok(decode::<T>(token, &self.keys.dec_key, &validation).map(|data| data.claims)?)
    }
}
