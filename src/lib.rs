//! # PeakStreak
//!
//! Habit tracking with GitHub-style calendar heatmaps: users log daily
//! habits, follow each other, and compete on a leaderboard.
//!
//! ## Features
//!
//! - **Heatmaps**: one calendar per habit and year, each month drawn as a
//!   rounded blob around its days
//! - **Social**: follows, user search, leaderboard and an explore feed
//! - **Accounts**: Argon2 password hashing, JWT bearer tokens, avatars
//! - **Storage**: embedded SQLite with cascading deletes
//!
//! ## Modules
//!
//! - [`domain`]: Entity types and field validation
//! - [`calendar`]: Heatmap geometry, palette and SVG rendering
//! - [`repository`]: Persistence trait and SQLite implementation
//! - [`uploads`]: Avatar file storage
//! - [`auth`]: Password hashing and bearer tokens
//! - [`service`]: Business rules
//! - [`api`]: REST API server with Axum
//! - [`client`]: HTTP client used by the CLI
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use peakstreak::calendar::{HeatmapLayout, LayoutOptions};
//! use std::collections::HashMap;
//!
//! let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
//! let values = HashMap::from([(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 1)]);
//!
//! let layout = HeatmapLayout::build(2024, today, &values, LayoutOptions::default());
//! for month in &layout.months {
//!     println!("{}: {}", month.label, month.path);
//! }
//! ```

pub mod api;
pub mod auth;
pub mod calendar;
pub mod client;
pub mod config;
pub mod domain;
pub mod repository;
pub mod service;
pub mod uploads;

// Re-export top-level types for convenience
pub use domain::{
    ExploreEntry, Habit, HabitLog, HabitWithLogs, LeaderboardEntry, ProfileData, PublicUser,
    Session, User,
};

pub use calendar::{render_habit_heatmap, HeatmapLayout, LayoutOptions, Palette};

pub use repository::{Repository, RepositoryError, SqliteRepository};

pub use service::{Service, ServiceError, ServiceOptions};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use client::{ApiClient, ClientError, SessionStore};

pub use config::{Config, ConfigError};
