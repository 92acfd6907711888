pub mod auth;
pub mod characters;
