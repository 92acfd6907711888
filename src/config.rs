use std::env;
use std::net::SocketAddr;

use dotenv::dotenv;
use thiserror::Error;
use tracing::{info, instrument};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Credentials for an account created with the `Admin` role at startup.
#[derive(Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

/// Process-wide settings, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub max_body_bytes: usize,
    pub admin: Option<AdminSeed>,
}

impl Config {
    /// Reads configuration from the environment (and `.env`, if present).
    ///
    /// | Variable          | Default                      |
    /// |-------------------|------------------------------|
    /// | `JWT_SECRET`      | required                     |
    /// | `HOST`            | `127.0.0.1`                  |
    /// | `PORT`            | `3000`                       |
    /// | `MAX_BODY_BYTES`  | `65536`                      |
    /// | `ADMIN_EMAIL` + `ADMIN_PASSWORD` | no admin seeded |
    #[instrument]
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|secret| !secret.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = parse_var("PORT", DEFAULT_PORT)?;
        let max_body_bytes = parse_var("MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?;

        let admin = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(AdminSeed { email, password }),
            _ => None,
        };

        info!(%host, port, max_body_bytes, seed_admin = admin.is_some(), "Configuration loaded");

        Ok(Self {
            host,
            port,
            jwt_secret,
            max_body_bytes,
            admin,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: "HOST",
                value: self.host.clone(),
            })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
