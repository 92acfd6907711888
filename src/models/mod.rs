pub mod character;
pub mod jwt;
pub mod user;
