//! PeakStreak Domain Model
//!
//! Entity types shared by the server, the API client and the heatmap
//! renderer, plus the field rules every layer validates against.
//!
//! - **types**: users, habits, logs and the composite profile/feed shapes
//! - **validation**: username, email, password, habit name, hue and value rules

pub mod types;
pub mod validation;

pub use types::{
    ExploreEntry, Habit, HabitLog, HabitWithLogs, LeaderboardEntry, ProfileData, PublicUser,
    Session, User, UserCredentials, DATE_FORMAT,
};
pub use validation::{
    normalize_log_value, validate_color_hue, validate_email, validate_habit_name,
    validate_log_value, validate_password, validate_username, FieldError, MAX_COLOR_HUE,
    MAX_HABIT_NAME_LEN,
};
