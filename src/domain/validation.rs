//! Field validation rules
//!
//! Shared by the API handlers (which reject bad input with 400) and the
//! client (which refuses to send it).

use std::fmt;

/// Longest accepted habit name, in characters
pub const MAX_HABIT_NAME_LEN: usize = 100;

/// Upper bound of the colour wheel
pub const MAX_COLOR_HUE: i32 = 360;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 8;

/// A rule violation for one input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}

pub fn validate_username(username: &str) -> Result<(), FieldError> {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(FieldError::new(
            "username",
            format!("must be between {USERNAME_MIN} and {USERNAME_MAX} characters"),
        ));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(FieldError::new(
            "username",
            "must contain only letters and digits",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), FieldError> {
    let mut parts = email.split('@');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(FieldError::new("email", "must be a valid email address"))
    }
}

pub fn validate_password(password: &str) -> Result<(), FieldError> {
    if password.len() < PASSWORD_MIN {
        return Err(FieldError::new(
            "password",
            format!("must be at least {PASSWORD_MIN} characters"),
        ));
    }
    if !password.chars().all(|c| c.is_ascii_graphic() || c == ' ') {
        return Err(FieldError::new(
            "password",
            "must contain only printable ASCII characters",
        ));
    }
    Ok(())
}

/// Checks a habit name and returns it trimmed
pub fn validate_habit_name(name: &str) -> Result<String, FieldError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new("name", "must not be empty"));
    }
    if trimmed.chars().count() > MAX_HABIT_NAME_LEN {
        return Err(FieldError::new(
            "name",
            format!("must be at most {MAX_HABIT_NAME_LEN} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

pub fn validate_color_hue(hue: i32) -> Result<(), FieldError> {
    if (0..=MAX_COLOR_HUE).contains(&hue) {
        Ok(())
    } else {
        Err(FieldError::new(
            "colorHue",
            format!("must be between 0 and {MAX_COLOR_HUE}"),
        ))
    }
}

pub fn validate_log_value(value: i32) -> Result<(), FieldError> {
    if value < 0 {
        Err(FieldError::new("value", "must not be negative"))
    } else {
        Ok(())
    }
}

/// Boolean habits store 0 or 1; graded habits keep the value as given
pub fn normalize_log_value(is_boolean: bool, value: i32) -> i32 {
    if is_boolean {
        value.clamp(0, 1)
    } else {
        value
    }
}
