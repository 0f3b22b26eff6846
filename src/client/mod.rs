//! PeakStreak REST API Client
//!
//! HTTP client for the PeakStreak API, used by the CLI. Input that the
//! server would reject is caught before sending, and error bodies are
//! decoded into [`ClientError::Api`].

mod session;

pub use session::SessionStore;

use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::api::dto::{
    AvatarResponse, CreateHabitRequest, HealthResponse, LogHabitRequest, LoginRequest,
    SignupRequest, UpdateHabitRequest,
};
use crate::domain::{
    validate_color_hue, validate_email, validate_habit_name, validate_log_value,
    validate_password, validate_username, ExploreEntry, FieldError, Habit, HabitLog,
    LeaderboardEntry, ProfileData, PublicUser, Session, User,
};

/// Largest avatar the client will upload
pub const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when talking to the API
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered with an error status
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    Validation(#[from] FieldError),

    #[error("File size exceeds the {limit_mb}MB limit")]
    FileTooLarge { limit_mb: usize },

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Session file error: {0}")]
    Session(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// HTTP status of an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: BTreeMap<String, String>,
}

/// Client for one PeakStreak server; carries the bearer token once logged in
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn user_path(username: &str, rest: &str) -> String {
        format!("/users/{}{}", urlencoding::encode(username), rest)
    }

    /// Attach the bearer token; fails when there is none
    fn authed(&self, request: RequestBuilder) -> ClientResult<RequestBuilder> {
        let token = self.token.as_deref().ok_or(ClientError::NotLoggedIn)?;
        Ok(request.bearer_auth(token))
    }

    /// Attach the bearer token when there is one
    fn maybe_authed(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(request: RequestBuilder) -> ClientResult<Response> {
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::error_from(response).await)
        }
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<T> {
        Ok(Self::send(request).await?.json().await?)
    }

    async fn send_empty(request: RequestBuilder) -> ClientResult<()> {
        let response = Self::send(request).await?;
        if response.status() != StatusCode::NO_CONTENT {
            tracing::debug!("Expected 204, got {}", response.status());
        }
        Ok(())
    }

    async fn error_from(response: Response) -> ClientError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();

        let message = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) if body.details.is_empty() => body.error,
            Ok(body) => {
                let details: Vec<String> = body
                    .details
                    .iter()
                    .map(|(field, message)| format!("{field}: {message}"))
                    .collect();
                format!("{} ({})", body.error, details.join(", "))
            }
            Err(_) => format!("Request failed with status {status}"),
        };

        ClientError::Api { status, message }
    }

    // ============================================
    // AUTH
    // ============================================

    pub async fn health(&self) -> ClientResult<HealthResponse> {
        Self::send_json(self.client.get(self.url("/health"))).await
    }

    pub async fn signup(&self, username: &str, email: &str, password: &str) -> ClientResult<User> {
        let username = username.trim();
        let email = email.trim();
        validate_username(username)?;
        validate_email(email)?;
        validate_password(password)?;

        let body = SignupRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        Self::send_json(self.client.post(self.url("/auth/signup")).json(&body)).await
    }

    /// Log in and keep the returned token on this client
    pub async fn login(&mut self, identifier: &str, password: &str) -> ClientResult<Session> {
        let body = LoginRequest {
            identifier: identifier.trim().to_string(),
            password: password.to_string(),
        };
        let session: Session =
            Self::send_json(self.client.post(self.url("/auth/login")).json(&body)).await?;
        self.token = Some(session.token.clone());
        Ok(session)
    }

    // ============================================
    // ACCOUNT
    // ============================================

    pub async fn me(&self) -> ClientResult<User> {
        Self::send_json(self.authed(self.client.get(self.url("/me")))?).await
    }

    pub async fn delete_account(&self) -> ClientResult<()> {
        Self::send_empty(self.authed(self.client.delete(self.url("/me")))?).await
    }

    /// Upload a JPEG or PNG avatar; returns its public URL
    pub async fn upload_avatar(&self, file_name: &str, data: Vec<u8>) -> ClientResult<String> {
        if data.len() > MAX_AVATAR_BYTES {
            return Err(ClientError::FileTooLarge {
                limit_mb: MAX_AVATAR_BYTES / (1024 * 1024),
            });
        }

        let mime = infer::get(&data)
            .map(|kind| kind.mime_type())
            .unwrap_or("application/octet-stream");
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = reqwest::multipart::Form::new().part("avatar", part);

        let response: AvatarResponse =
            Self::send_json(self.authed(self.client.post(self.url("/me/avatar")))?.multipart(form))
                .await?;
        Ok(response.avatar_url)
    }

    // ============================================
    // USERS
    // ============================================

    pub async fn search_users(&self, query: &str) -> ClientResult<Vec<PublicUser>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let request = self
            .client
            .get(self.url("/users/search"))
            .query(&[("q", query)]);
        Self::send_json(request).await
    }

    /// Profile data; owner/follow flags reflect the token, if any
    pub async fn profile(&self, username: &str) -> ClientResult<ProfileData> {
        let request = self.client.get(self.url(&Self::user_path(username, "")));
        Self::send_json(self.maybe_authed(request)).await
    }

    pub async fn followers(&self, username: &str) -> ClientResult<Vec<PublicUser>> {
        let url = self.url(&Self::user_path(username, "/followers"));
        Self::send_json(self.client.get(url)).await
    }

    pub async fn following(&self, username: &str) -> ClientResult<Vec<PublicUser>> {
        let url = self.url(&Self::user_path(username, "/following"));
        Self::send_json(self.client.get(url)).await
    }

    pub async fn follow(&self, username: &str) -> ClientResult<()> {
        let url = self.url(&Self::user_path(username, "/follow"));
        Self::send_empty(self.authed(self.client.post(url))?).await
    }

    pub async fn unfollow(&self, username: &str) -> ClientResult<()> {
        let url = self.url(&Self::user_path(username, "/follow"));
        Self::send_empty(self.authed(self.client.delete(url))?).await
    }

    pub async fn leaderboard(&self) -> ClientResult<Vec<LeaderboardEntry>> {
        Self::send_json(self.client.get(self.url("/leaderboard"))).await
    }

    pub async fn explore(&self) -> ClientResult<Vec<ExploreEntry>> {
        Self::send_json(self.client.get(self.url("/explore"))).await
    }

    // ============================================
    // HABITS
    // ============================================

    pub async fn create_habit(
        &self,
        name: &str,
        color_hue: i32,
        is_boolean: bool,
    ) -> ClientResult<Habit> {
        let name = validate_habit_name(name)?;
        validate_color_hue(color_hue)?;

        let body = CreateHabitRequest {
            name,
            color_hue,
            is_boolean,
        };
        Self::send_json(self.authed(self.client.post(self.url("/habits")))?.json(&body)).await
    }

    pub async fn update_habit(
        &self,
        habit_id: Uuid,
        name: &str,
        color_hue: i32,
        is_boolean: Option<bool>,
    ) -> ClientResult<Habit> {
        let name = validate_habit_name(name)?;
        validate_color_hue(color_hue)?;

        let body = UpdateHabitRequest {
            name,
            color_hue,
            is_boolean,
        };
        let url = self.url(&format!("/habits/{habit_id}"));
        Self::send_json(self.authed(self.client.put(url))?.json(&body)).await
    }

    pub async fn delete_habit(&self, habit_id: Uuid) -> ClientResult<()> {
        let url = self.url(&format!("/habits/{habit_id}"));
        Self::send_empty(self.authed(self.client.delete(url))?).await
    }

    /// Record `value` for `date`; 0 clears the day
    pub async fn log_habit(
        &self,
        habit_id: Uuid,
        date: NaiveDate,
        value: i32,
    ) -> ClientResult<HabitLog> {
        validate_log_value(value)?;

        let body = LogHabitRequest::for_value(date, value);
        let url = self.url(&format!("/habits/{habit_id}/logs"));
        Self::send_json(self.authed(self.client.post(url))?.json(&body)).await
    }

    /// SVG heatmap as rendered by the server
    pub async fn heatmap(&self, habit_id: Uuid, year: Option<i32>) -> ClientResult<String> {
        let mut request = self
            .client
            .get(self.url(&format!("/habits/{habit_id}/heatmap")));
        if let Some(year) = year {
            request = request.query(&[("year", year)]);
        }
        Ok(Self::send(request).await?.text().await?)
    }
}
