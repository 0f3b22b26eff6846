//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON; field names are
//! camelCase on the wire.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================
// AUTH DTOs
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login with either a username or an email address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username", alias = "email")]
    pub identifier: String,
    pub password: String,
}

// ============================================
// HABIT DTOs
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHabitRequest {
    pub name: String,
    pub color_hue: i32,
    #[serde(default = "default_true")]
    pub is_boolean: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHabitRequest {
    pub name: String,
    pub color_hue: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_boolean: Option<bool>,
}

/// Log a day; `status` is the boolean form (`true` = 1, `false` = 0)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogHabitRequest {
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
}

impl LogHabitRequest {
    pub fn for_value(date: NaiveDate, value: i32) -> Self {
        Self {
            date: date.format(crate::domain::DATE_FORMAT).to_string(),
            value: Some(value),
            status: None,
        }
    }

    /// `value` wins over `status`; neither means a completed day
    pub fn resolved_value(&self) -> i32 {
        self.value
            .or_else(|| self.status.map(i32::from))
            .unwrap_or(1)
    }
}

// ============================================
// USER DTOs
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarResponse {
    pub avatar_url: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct HeatmapQuery {
    #[serde(default)]
    pub year: Option<i32>,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// "ok" or "error"
    pub database: String,
}
