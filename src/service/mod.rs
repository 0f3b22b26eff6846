//! Business rules
//!
//! [`Service`] sits between the HTTP layer and storage: it validates input,
//! enforces ownership, hashes passwords, issues tokens and coordinates the
//! repository with file storage.

mod habits;
mod social;
mod users;

pub use habits::{HabitChanges, NewHabit};

use std::sync::Arc;
use thiserror::Error;

use crate::auth::{AuthError, TokenIssuer};
use crate::domain::FieldError;
use crate::repository::{Repository, RepositoryError};
use crate::uploads::{FileStorage, FileStorageError};

/// Largest avatar accepted by default (2 MiB)
pub const DEFAULT_MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

/// Cap on user search results
pub const SEARCH_LIMIT: u32 = 40;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Habit not found")]
    HabitNotFound,

    #[error("User does not have permission to access this resource")]
    AccessDenied,

    #[error("Cannot follow yourself")]
    CannotFollowSelf,

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("validation failed")]
    Validation(#[from] FieldError),

    #[error("File size exceeds the {limit_mb}MB limit")]
    FileTooLarge { limit_mb: usize },

    #[error("Invalid file type: {0}. Only jpeg and png are allowed")]
    UnsupportedFileType(String),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Repository(RepositoryError),

    #[error("File storage error: {0}")]
    FileStorage(#[from] FileStorageError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateUsername => ServiceError::DuplicateUsername,
            RepositoryError::DuplicateEmail => ServiceError::DuplicateEmail,
            other => ServiceError::Repository(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Tunables the service needs from configuration
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub max_avatar_bytes: usize,
    pub leaderboard_limit: u32,
    pub explore_limit: u32,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            max_avatar_bytes: DEFAULT_MAX_AVATAR_BYTES,
            leaderboard_limit: 20,
            explore_limit: 20,
        }
    }
}

/// Shared application logic; cheap to clone
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn Repository>,
    storage: Arc<dyn FileStorage>,
    tokens: TokenIssuer,
    options: ServiceOptions,
}

impl Service {
    pub fn new(
        repo: Arc<dyn Repository>,
        storage: Arc<dyn FileStorage>,
        tokens: TokenIssuer,
        options: ServiceOptions,
    ) -> Self {
        Self {
            repo,
            storage,
            tokens,
            options,
        }
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    /// Whether the database answers
    pub async fn database_ok(&self) -> bool {
        match self.repo.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Database ping failed: {}", e);
                false
            }
        }
    }
}
