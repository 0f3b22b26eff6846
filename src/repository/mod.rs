//! Persistence layer
//!
//! [`Repository`] is the seam between business rules and storage. The
//! shipped implementation is [`SqliteRepository`]; tests use the same type
//! over an in-memory database.

mod sqlite;

pub use sqlite::SqliteRepository;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    ExploreEntry, Habit, HabitLog, HabitWithLogs, LeaderboardEntry, PublicUser, User,
    UserCredentials,
};

/// Errors raised by a repository
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Not found: {0}")]
    NotFound(String),

    /// The connection mutex was poisoned by a panicking holder
    #[error("Lock error: {0}")]
    Lock(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Storage operations used by the service layer
#[async_trait]
pub trait Repository: Send + Sync {
    /// Cheap connectivity check for health reporting
    async fn ping(&self) -> RepositoryResult<()>;

    // Users

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> RepositoryResult<User>;

    /// Look up login credentials by username or email
    async fn get_user_credentials(&self, identifier: &str)
        -> RepositoryResult<Option<UserCredentials>>;

    async fn get_user_by_id(&self, user_id: Uuid) -> RepositoryResult<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>>;

    async fn set_user_avatar(&self, user_id: Uuid, avatar_url: Option<&str>)
        -> RepositoryResult<()>;

    /// Delete a user; habits, logs and follow edges go with it
    async fn delete_user(&self, user_id: Uuid) -> RepositoryResult<()>;

    async fn search_users(&self, query: &str, limit: u32) -> RepositoryResult<Vec<PublicUser>>;

    // Habits and logs

    async fn create_habit(
        &self,
        user_id: Uuid,
        name: &str,
        color_hue: i32,
        is_boolean: bool,
    ) -> RepositoryResult<Habit>;

    async fn get_habit(&self, habit_id: Uuid) -> RepositoryResult<Option<Habit>>;

    async fn update_habit(
        &self,
        habit_id: Uuid,
        name: &str,
        color_hue: i32,
        is_boolean: bool,
    ) -> RepositoryResult<Habit>;

    async fn delete_habit(&self, habit_id: Uuid) -> RepositoryResult<()>;

    /// A user's habits, newest first, each with its positive logs by date
    async fn habits_with_logs(&self, user_id: Uuid) -> RepositoryResult<Vec<HabitWithLogs>>;

    async fn habit_with_logs(&self, habit_id: Uuid) -> RepositoryResult<Option<HabitWithLogs>>;

    /// Insert or replace the log for `(habit_id, date)`
    async fn upsert_log(
        &self,
        habit_id: Uuid,
        date: NaiveDate,
        value: i32,
    ) -> RepositoryResult<HabitLog>;

    // Social graph

    /// Idempotent
    async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> RepositoryResult<()>;

    async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> RepositoryResult<()>;

    async fn is_following(&self, follower_id: Uuid, following_id: Uuid) -> RepositoryResult<bool>;

    async fn follower_count(&self, user_id: Uuid) -> RepositoryResult<u64>;

    async fn following_count(&self, user_id: Uuid) -> RepositoryResult<u64>;

    /// Users following `user_id`, most recent first
    async fn followers(&self, user_id: Uuid) -> RepositoryResult<Vec<PublicUser>>;

    /// Users `user_id` follows, most recent first
    async fn following(&self, user_id: Uuid) -> RepositoryResult<Vec<PublicUser>>;

    // Feeds

    async fn leaderboard(&self, limit: u32) -> RepositoryResult<Vec<LeaderboardEntry>>;

    async fn explore(&self, limit: u32) -> RepositoryResult<Vec<ExploreEntry>>;
}
