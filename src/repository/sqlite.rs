//! SQLite repository
//!
//! A single connection behind a `std::sync::Mutex` (rusqlite's `Connection`
//! is `!Sync`). Statements are short, so the lock is held only for the
//! duration of one query batch and never across an `.await`.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{Repository, RepositoryError, RepositoryResult};
use crate::domain::{
    ExploreEntry, Habit, HabitLog, HabitWithLogs, LeaderboardEntry, PublicUser, User,
    UserCredentials,
};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id              BLOB PRIMARY KEY,
        username        TEXT NOT NULL UNIQUE COLLATE NOCASE,
        email           TEXT NOT NULL UNIQUE COLLATE NOCASE,
        hashed_password TEXT NOT NULL,
        avatar_url      TEXT,
        created_at      TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS habits (
        id         BLOB PRIMARY KEY,
        user_id    BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name       TEXT NOT NULL,
        color_hue  INTEGER NOT NULL CHECK (color_hue BETWEEN 0 AND 360),
        is_boolean INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_habits_user ON habits(user_id);

    CREATE TABLE IF NOT EXISTS habit_logs (
        id         BLOB PRIMARY KEY,
        habit_id   BLOB NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
        log_date   TEXT NOT NULL,
        value      INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (habit_id, log_date)
    );
    CREATE INDEX IF NOT EXISTS idx_logs_updated ON habit_logs(updated_at);

    CREATE TABLE IF NOT EXISTS followers (
        follower_id  BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        following_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at   TEXT NOT NULL,
        PRIMARY KEY (follower_id, following_id),
        CHECK (follower_id <> following_id)
    );
    CREATE INDEX IF NOT EXISTS idx_followers_following ON followers(following_id);
";

const USER_COLUMNS: &str = "id, username, email, avatar_url, created_at";
const HABIT_COLUMNS: &str = "id, user_id, name, color_hue, is_boolean, created_at";
const LOG_COLUMNS: &str = "id, habit_id, log_date, value, created_at, updated_at";

/// SQLite implementation of [`Repository`]
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    /// Open or create the database file at `path`
    pub fn open(path: &Path) -> RepositoryResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        tracing::info!("Opened database at {:?}", path);
        Self::init(conn)
    }

    /// A private database that lives as long as the repository
    pub fn in_memory() -> RepositoryResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> RepositoryResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::Lock(e.to_string()))
    }
}

fn map_unique_violation(err: rusqlite::Error) -> RepositoryError {
    if let rusqlite::Error::SqliteFailure(ref failure, Some(ref message)) = err {
        if failure.code == ErrorCode::ConstraintViolation {
            if message.contains("users.username") {
                return RepositoryError::DuplicateUsername;
            }
            if message.contains("users.email") {
                return RepositoryError::DuplicateEmail;
            }
        }
    }
    RepositoryError::Database(err)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        avatar_url: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn public_user_from_row(row: &Row<'_>) -> rusqlite::Result<PublicUser> {
    Ok(PublicUser {
        id: row.get(0)?,
        username: row.get(1)?,
        avatar_url: row.get(2)?,
    })
}

fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<Habit> {
    Ok(Habit {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        color_hue: row.get(3)?,
        is_boolean: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<HabitLog> {
    Ok(HabitLog {
        id: row.get(0)?,
        habit_id: row.get(1)?,
        date: row.get(2)?,
        value: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn query_habit(conn: &Connection, habit_id: Uuid) -> rusqlite::Result<Option<Habit>> {
    conn.query_row(
        &format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1"),
        params![habit_id],
        habit_from_row,
    )
    .optional()
}

fn query_logs(conn: &Connection, habit_id: Uuid) -> rusqlite::Result<Vec<HabitLog>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {LOG_COLUMNS} FROM habit_logs
         WHERE habit_id = ?1 AND value > 0
         ORDER BY log_date ASC"
    ))?;
    let logs = stmt
        .query_map(params![habit_id], log_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(logs)
}

fn query_habits_with_logs(conn: &Connection, user_id: Uuid) -> rusqlite::Result<Vec<HabitWithLogs>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {HABIT_COLUMNS} FROM habits
         WHERE user_id = ?1
         ORDER BY created_at DESC, rowid DESC"
    ))?;
    let habits = stmt
        .query_map(params![user_id], habit_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    habits
        .into_iter()
        .map(|habit| {
            let logs = query_logs(conn, habit.id)?;
            Ok(HabitWithLogs::new(habit, logs))
        })
        .collect()
}

fn query_public_users(
    conn: &Connection,
    sql: &str,
    user_id: Uuid,
) -> rusqlite::Result<Vec<PublicUser>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let users = stmt
        .query_map(params![user_id], public_user_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(users)
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn ping(&self) -> RepositoryResult<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> RepositoryResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            avatar_url: None,
            created_at: Utc::now(),
        };

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (id, username, email, hashed_password, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user.id, user.username, user.email, hashed_password, user.created_at],
        )
        .map_err(map_unique_violation)?;

        Ok(user)
    }

    async fn get_user_credentials(
        &self,
        identifier: &str,
    ) -> RepositoryResult<Option<UserCredentials>> {
        let conn = self.conn()?;
        let credentials = conn
            .query_row(
                &format!(
                    "SELECT {USER_COLUMNS}, hashed_password FROM users
                     WHERE username = ?1 OR email = ?1"
                ),
                params![identifier],
                |row| {
                    Ok(UserCredentials {
                        user: user_from_row(row)?,
                        hashed_password: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(credentials)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> RepositoryResult<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![user_id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    async fn set_user_avatar(
        &self,
        user_id: Uuid,
        avatar_url: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE users SET avatar_url = ?1 WHERE id = ?2",
            params![avatar_url, user_id],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound(format!("user {user_id}")));
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> RepositoryResult<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound(format!("user {user_id}")));
        }
        Ok(())
    }

    async fn search_users(&self, query: &str, limit: u32) -> RepositoryResult<Vec<PublicUser>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, username, avatar_url FROM users
             WHERE username LIKE ?1 ESCAPE '\\'
             ORDER BY username ASC
             LIMIT ?2",
        )?;
        let users = stmt
            .query_map(params![like_pattern(query), limit], public_user_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    async fn create_habit(
        &self,
        user_id: Uuid,
        name: &str,
        color_hue: i32,
        is_boolean: bool,
    ) -> RepositoryResult<Habit> {
        let habit = Habit {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            color_hue,
            is_boolean,
            created_at: Utc::now(),
        };

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO habits (id, user_id, name, color_hue, is_boolean, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                habit.id,
                habit.user_id,
                habit.name,
                habit.color_hue,
                habit.is_boolean,
                habit.created_at
            ],
        )?;

        Ok(habit)
    }

    async fn get_habit(&self, habit_id: Uuid) -> RepositoryResult<Option<Habit>> {
        let conn = self.conn()?;
        Ok(query_habit(&conn, habit_id)?)
    }

    async fn update_habit(
        &self,
        habit_id: Uuid,
        name: &str,
        color_hue: i32,
        is_boolean: bool,
    ) -> RepositoryResult<Habit> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE habits SET name = ?1, color_hue = ?2, is_boolean = ?3 WHERE id = ?4",
            params![name, color_hue, is_boolean, habit_id],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound(format!("habit {habit_id}")));
        }

        query_habit(&conn, habit_id)?
            .ok_or_else(|| RepositoryError::NotFound(format!("habit {habit_id}")))
    }

    async fn delete_habit(&self, habit_id: Uuid) -> RepositoryResult<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM habits WHERE id = ?1", params![habit_id])?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound(format!("habit {habit_id}")));
        }
        Ok(())
    }

    async fn habits_with_logs(&self, user_id: Uuid) -> RepositoryResult<Vec<HabitWithLogs>> {
        let conn = self.conn()?;
        Ok(query_habits_with_logs(&conn, user_id)?)
    }

    async fn habit_with_logs(&self, habit_id: Uuid) -> RepositoryResult<Option<HabitWithLogs>> {
        let conn = self.conn()?;
        let Some(habit) = query_habit(&conn, habit_id)? else {
            return Ok(None);
        };
        let logs = query_logs(&conn, habit.id)?;
        Ok(Some(HabitWithLogs::new(habit, logs)))
    }

    async fn upsert_log(
        &self,
        habit_id: Uuid,
        date: NaiveDate,
        value: i32,
    ) -> RepositoryResult<HabitLog> {
        let now = Utc::now();
        let conn = self.conn()?;
        let log = conn.query_row(
            &format!(
                "INSERT INTO habit_logs (id, habit_id, log_date, value, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT (habit_id, log_date)
                 DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                 RETURNING {LOG_COLUMNS}"
            ),
            params![Uuid::new_v4(), habit_id, date, value, now],
            log_from_row,
        )?;
        Ok(log)
    }

    async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> RepositoryResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO followers (follower_id, following_id, created_at)
             VALUES (?1, ?2, ?3)",
            params![follower_id, following_id, Utc::now()],
        )?;
        Ok(())
    }

    async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> RepositoryResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM followers WHERE follower_id = ?1 AND following_id = ?2",
            params![follower_id, following_id],
        )?;
        Ok(())
    }

    async fn is_following(&self, follower_id: Uuid, following_id: Uuid) -> RepositoryResult<bool> {
        let conn = self.conn()?;
        let exists = conn.query_row(
            "SELECT EXISTS (
                SELECT 1 FROM followers WHERE follower_id = ?1 AND following_id = ?2
             )",
            params![follower_id, following_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    async fn follower_count(&self, user_id: Uuid) -> RepositoryResult<u64> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM followers WHERE following_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count(n))
    }

    async fn following_count(&self, user_id: Uuid) -> RepositoryResult<u64> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM followers WHERE follower_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count(n))
    }

    async fn followers(&self, user_id: Uuid) -> RepositoryResult<Vec<PublicUser>> {
        let conn = self.conn()?;
        Ok(query_public_users(
            &conn,
            "SELECT u.id, u.username, u.avatar_url
             FROM followers f JOIN users u ON u.id = f.follower_id
             WHERE f.following_id = ?1
             ORDER BY f.created_at DESC, f.rowid DESC",
            user_id,
        )?)
    }

    async fn following(&self, user_id: Uuid) -> RepositoryResult<Vec<PublicUser>> {
        let conn = self.conn()?;
        Ok(query_public_users(
            &conn,
            "SELECT u.id, u.username, u.avatar_url
             FROM followers f JOIN users u ON u.id = f.following_id
             WHERE f.follower_id = ?1
             ORDER BY f.created_at DESC, f.rowid DESC",
            user_id,
        )?)
    }

    async fn leaderboard(&self, limit: u32) -> RepositoryResult<Vec<LeaderboardEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT u.id, u.username, u.avatar_url, COUNT(l.id) AS total
             FROM users u
             JOIN habits h ON h.user_id = u.id
             JOIN habit_logs l ON l.habit_id = h.id AND l.value > 0
             GROUP BY u.id
             ORDER BY total DESC, u.username ASC
             LIMIT ?1",
        )?;
        let ranked = stmt
            .query_map(params![limit], |row| {
                Ok((public_user_from_row(row)?, row.get::<_, i64>(3)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        ranked
            .into_iter()
            .map(|(user, total)| {
                let habits = query_habits_with_logs(&conn, user.id)?;
                Ok(LeaderboardEntry {
                    user,
                    total_logged_days: count(total),
                    habits,
                })
            })
            .collect()
    }

    async fn explore(&self, limit: u32) -> RepositoryResult<Vec<ExploreEntry>> {
        let conn = self.conn()?;

        // SQLite fills bare columns from the row holding the MAX()
        let mut stmt = conn.prepare_cached(
            "SELECT h.user_id, h.id, MAX(l.updated_at) AS last_active
             FROM habit_logs l JOIN habits h ON h.id = l.habit_id
             WHERE l.value > 0
             GROUP BY h.user_id
             ORDER BY last_active DESC
             LIMIT ?1",
        )?;
        let latest = stmt
            .query_map(params![limit], |row| {
                Ok((row.get::<_, Uuid>(0)?, row.get::<_, Uuid>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut entries = Vec::with_capacity(latest.len());
        for (user_id, habit_id) in latest {
            let user = conn
                .query_row(
                    "SELECT id, username, avatar_url FROM users WHERE id = ?1",
                    params![user_id],
                    public_user_from_row,
                )
                .optional()?;
            let habit = query_habit(&conn, habit_id)?;

            if let (Some(user), Some(habit)) = (user, habit) {
                let logs = query_logs(&conn, habit.id)?;
                entries.push(ExploreEntry {
                    user,
                    habit: HabitWithLogs::new(habit, logs),
                });
            }
        }
        Ok(entries)
    }
}
