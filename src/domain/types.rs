//! Core data types
//!
//! JSON field names are camelCase on the wire; dates are `YYYY-MM-DD` and
//! timestamps RFC 3339.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire format for calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// An account as seen by its owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The subset of this user that other people may see
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// A user together with their stored password hash.
///
/// Only produced for the login path; never serialized.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub hashed_password: String,
}

/// A signed-in user and their bearer token.
///
/// Returned by login and cached by the client between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// An account as seen by everyone else
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// A recurring activity a user tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub color_hue: i32,
    /// Done/not-done habit when true, graded (numeric value per day) otherwise
    #[serde(default = "default_is_boolean")]
    pub is_boolean: bool,
    pub created_at: DateTime<Utc>,
}

fn default_is_boolean() -> bool {
    true
}

/// One recorded entry for a habit on a calendar date.
///
/// The stored quantity is `value`. The boolean `status` shape is still
/// accepted on input and emitted on output (`value > 0`) so older clients
/// keep working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "HabitLogRepr", into = "HabitLogRepr")]
pub struct HabitLog {
    pub id: Uuid,
    pub habit_id: Uuid,
    pub date: NaiveDate,
    pub value: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HabitLog {
    /// Whether this entry counts as a completed day
    pub fn is_completed(&self) -> bool {
        self.value > 0
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HabitLogRepr {
    id: Uuid,
    habit_id: Uuid,
    date: NaiveDate,
    #[serde(default)]
    value: Option<i32>,
    #[serde(default)]
    status: Option<bool>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<HabitLogRepr> for HabitLog {
    fn from(repr: HabitLogRepr) -> Self {
        let value = repr
            .value
            .or_else(|| repr.status.map(i32::from))
            .unwrap_or(0);
        Self {
            id: repr.id,
            habit_id: repr.habit_id,
            date: repr.date,
            value,
            created_at: repr.created_at,
            updated_at: repr.updated_at,
        }
    }
}

impl From<HabitLog> for HabitLogRepr {
    fn from(log: HabitLog) -> Self {
        Self {
            id: log.id,
            habit_id: log.habit_id,
            date: log.date,
            value: Some(log.value),
            status: Some(log.value > 0),
            created_at: log.created_at,
            updated_at: log.updated_at,
        }
    }
}

/// A habit with its completed logs, ascending by date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitWithLogs {
    #[serde(flatten)]
    pub habit: Habit,
    #[serde(default)]
    pub logs: Vec<HabitLog>,
}

impl HabitWithLogs {
    pub fn new(habit: Habit, mut logs: Vec<HabitLog>) -> Self {
        logs.sort_by_key(|log| log.date);
        Self { habit, logs }
    }

    /// Whether a completed log exists for `date`
    pub fn is_logged_on(&self, date: NaiveDate) -> bool {
        self.logs
            .iter()
            .any(|log| log.date == date && log.is_completed())
    }

    /// Merge an upserted log, keeping one entry per date and date order.
    ///
    /// Entries whose value drops to zero are removed, matching what the
    /// server returns on the next fetch.
    pub fn merge_log(&mut self, log: HabitLog) {
        self.logs.retain(|existing| existing.date != log.date);
        if log.is_completed() {
            let idx = self.logs.partition_point(|existing| existing.date < log.date);
            self.logs.insert(idx, log);
        }
    }
}

/// Everything a profile page shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub user: User,
    pub habits: Vec<HabitWithLogs>,
    pub is_owner: bool,
    pub followers_count: u64,
    pub following_count: u64,
    pub is_following: bool,
}

/// One row of the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user: PublicUser,
    pub total_logged_days: u64,
    pub habits: Vec<HabitWithLogs>,
}

/// One card of the explore feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExploreEntry {
    pub user: PublicUser,
    pub habit: HabitWithLogs,
}
