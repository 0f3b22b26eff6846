//! Authentication primitives
//!
//! Argon2id password hashing and HS256 bearer tokens. Request-level
//! extraction of the bearer token lives in the API layer.

mod password;
mod token;

pub use password::{hash_password, verify_password};
pub use token::{bearer_token, Claims, TokenIssuer};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

pub type AuthResult<T> = Result<T, AuthError>;
