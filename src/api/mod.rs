//! PeakStreak REST API
//!
//! HTTP API layer for PeakStreak, built with Axum.
//!
//! # Endpoints
//!
//! ## Auth
//! - `POST /api/auth/signup` - Create an account
//! - `POST /api/auth/login` - Get a bearer token
//!
//! ## Account (bearer token required)
//! - `GET /api/me` - The signed-in user
//! - `DELETE /api/me` - Delete the account
//! - `POST /api/me/avatar` - Upload an avatar
//!
//! ## Users
//! - `GET /api/users/search?q=` - Search by username
//! - `GET /api/users/:username` - Profile data (token optional)
//! - `GET /api/users/:username/followers`
//! - `GET /api/users/:username/following`
//! - `POST /api/users/:username/follow` - Follow (token required)
//! - `DELETE /api/users/:username/follow` - Unfollow (token required)
//!
//! ## Habits (bearer token required, except the heatmap)
//! - `POST /api/habits` - Create a habit
//! - `PUT /api/habits/:habit_id` - Update a habit
//! - `DELETE /api/habits/:habit_id` - Delete a habit
//! - `POST /api/habits/:habit_id/logs` - Log a day
//! - `GET /api/habits/:habit_id/heatmap?year=` - SVG heatmap
//!
//! ## Discovery
//! - `GET /api/leaderboard`
//! - `GET /api/explore`
//!
//! ## Health
//! - `GET /api/health`
//!
//! Avatars are served under the configured public prefix and every other
//! path falls through to the frontend build.
//!
//! # Example
//!
//! ```rust,ignore
//! use peakstreak::api::{serve, ApiConfig, AppState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = build_service()?;
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::new(service, config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let api_routes = Router::new()
        .route("/health", get(routes::health::health))
        // Auth routes
        .route("/auth/signup", post(routes::auth::signup))
        .route("/auth/login", post(routes::auth::login))
        // Account routes
        .route(
            "/me",
            get(routes::me::get_me).delete(routes::me::delete_me),
        )
        .route(
            "/me/avatar",
            post(routes::me::upload_avatar)
                .layer(DefaultBodyLimit::max(config.avatar_body_limit())),
        )
        // User routes
        .route("/users/search", get(routes::users::search))
        .route("/users/:username", get(routes::users::profile))
        .route("/users/:username/followers", get(routes::users::followers))
        .route("/users/:username/following", get(routes::users::following))
        .route(
            "/users/:username/follow",
            post(routes::users::follow).delete(routes::users::unfollow),
        )
        // Discovery routes
        .route("/leaderboard", get(routes::discover::leaderboard))
        .route("/explore", get(routes::discover::explore))
        // Habit routes
        .route("/habits", post(routes::habits::create_habit))
        .route(
            "/habits/:habit_id",
            put(routes::habits::update_habit).delete(routes::habits::delete_habit),
        )
        .route("/habits/:habit_id/logs", post(routes::habits::log_habit))
        .route("/habits/:habit_id/heatmap", get(routes::habits::heatmap))
        .fallback(routes::spa::api_not_found);

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api", api_routes)
        .nest_service(&config.avatar_prefix, ServeDir::new(&config.avatar_dir))
        .fallback_service(routes::spa::frontend(&config.static_dir))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
        .with_state(shared_state)
}

/// CORS for the configured origins; any origin when none are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("PeakStreak API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("PeakStreak API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::service;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x02\0\0\0";

    struct TestApp {
        router: Router,
        _avatars: TempDir,
        _frontend: TempDir,
    }

    fn create_test_app() -> TestApp {
        let (service, avatars) = service();

        let frontend = tempfile::tempdir().unwrap();
        std::fs::write(frontend.path().join("index.html"), "<html>peakstreak</html>").unwrap();
        std::fs::write(frontend.path().join("app.js"), "console.log(1)").unwrap();

        let config = ApiConfig {
            static_dir: frontend.path().to_path_buf(),
            avatar_dir: avatars.path().to_path_buf(),
            ..ApiConfig::default()
        };

        TestApp {
            router: build_router(AppState::new(service, config)),
            _avatars: avatars,
            _frontend: frontend,
        }
    }

    impl TestApp {
        async fn send(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn call(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.send(request).await;
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }

        /// Sign up and log in; returns (user id, token)
        async fn register(&self, name: &str) -> (String, String) {
            let (status, user) = self
                .call(
                    Method::POST,
                    "/api/auth/signup",
                    None,
                    Some(json!({
                        "username": name,
                        "email": format!("{name}@example.com"),
                        "password": "password123",
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);

            let (status, session) = self
                .call(
                    Method::POST,
                    "/api/auth/login",
                    None,
                    Some(json!({"username": name, "password": "password123"})),
                )
                .await;
            assert_eq!(status, StatusCode::OK);

            (
                user["id"].as_str().unwrap().to_string(),
                session["token"].as_str().unwrap().to_string(),
            )
        }

        async fn create_habit(&self, token: &str, name: &str) -> String {
            let (status, habit) = self
                .call(
                    Method::POST,
                    "/api/habits",
                    Some(token),
                    Some(json!({"name": name, "colorHue": 140, "isBoolean": true})),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            habit["id"].as_str().unwrap().to_string()
        }
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_test_app();
        let (status, body) = app.call(Method::GET, "/api/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(body["uptimeSeconds"].is_u64());
    }

    #[tokio::test]
    async fn test_signup_and_login() {
        let app = create_test_app();
        let (user_id, token) = app.register("alice").await;

        let (status, me) = app.call(Method::GET, "/api/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["id"], user_id.as_str());
        assert_eq!(me["username"], "alice");
        assert!(me.get("hashedPassword").is_none());

        let (status, body) = app
            .call(
                Method::POST,
                "/api/auth/signup",
                None,
                Some(json!({
                    "username": "alice",
                    "email": "other@example.com",
                    "password": "password123",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Username already exists");

        let (status, body) = app
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"identifier": "alice@example.com", "password": "nope-nope"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");
    }

    #[tokio::test]
    async fn test_bad_payloads() {
        let app = create_test_app();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/signup")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.send(request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Invalid request payload");

        let (status, body) = app
            .call(
                Method::POST,
                "/api/auth/signup",
                None,
                Some(json!({"username": "al", "email": "al@example.com", "password": "password123"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation failed");
        assert!(body["details"]["username"].is_string());
    }

    #[tokio::test]
    async fn test_auth_header_errors() {
        let app = create_test_app();

        let (status, body) = app.call(Method::GET, "/api/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "authorization header required");

        let request = Request::builder()
            .uri("/api/me")
            .header(header::AUTHORIZATION, "Token abc")
            .body(Body::empty())
            .unwrap();
        assert_eq!(app.send(request).await.status(), StatusCode::UNAUTHORIZED);

        let (status, body) = app
            .call(Method::GET, "/api/me", Some("not.a.jwt"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid or expired token");
    }

    #[tokio::test]
    async fn test_habit_lifecycle() {
        let app = create_test_app();
        let (_, alice) = app.register("alice").await;
        let (_, bob) = app.register("bob").await;
        let habit_id = app.create_habit(&alice, "Run").await;

        let (status, log) = app
            .call(
                Method::POST,
                &format!("/api/habits/{habit_id}/logs"),
                Some(&alice),
                Some(json!({"date": "2024-03-05", "status": true})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(log["date"], "2024-03-05");
        assert_eq!(log["value"], 1);
        assert_eq!(log["status"], true);

        let (status, body) = app
            .call(
                Method::POST,
                &format!("/api/habits/{habit_id}/logs"),
                Some(&alice),
                Some(json!({"date": "05-03-2024", "value": 1})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid date format, please use YYYY-MM-DD");

        let (status, _) = app
            .call(
                Method::PUT,
                &format!("/api/habits/{habit_id}"),
                Some(&bob),
                Some(json!({"name": "Mine now", "colorHue": 10})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, habit) = app
            .call(
                Method::PUT,
                &format!("/api/habits/{habit_id}"),
                Some(&alice),
                Some(json!({"name": "Run 5k", "colorHue": 10})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(habit["name"], "Run 5k");
        assert_eq!(habit["colorHue"], 10);

        let (status, body) = app
            .call(Method::DELETE, "/api/habits/xyz", Some(&alice), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid habit ID format");

        let (status, _) = app
            .call(
                Method::DELETE,
                &format!("/api/habits/{habit_id}"),
                Some(&alice),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = app
            .call(
                Method::DELETE,
                &format!("/api/habits/{habit_id}"),
                Some(&alice),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Habit not found");
    }

    #[tokio::test]
    async fn test_heatmap_is_svg() {
        let app = create_test_app();
        let (_, alice) = app.register("alice").await;
        let habit_id = app.create_habit(&alice, "Read").await;

        let request = Request::builder()
            .uri(format!("/api/habits/{habit_id}/heatmap?year=2023"))
            .body(Body::empty())
            .unwrap();
        let response = app.send(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "image/svg+xml"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let svg = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(svg.contains("<title>Read 2023</title>"));
    }

    #[tokio::test]
    async fn test_profile_and_follows() {
        let app = create_test_app();
        let (alice_id, alice) = app.register("alice").await;
        let (_, bob) = app.register("bob").await;
        app.create_habit(&alice, "Read").await;

        let (status, body) = app
            .call(Method::POST, "/api/users/alice/follow", Some(&alice), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Cannot follow yourself");

        let (status, _) = app
            .call(Method::POST, "/api/users/alice/follow", Some(&bob), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, profile) = app
            .call(Method::GET, "/api/users/alice", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["user"]["id"], alice_id.as_str());
        assert_eq!(profile["isOwner"], false);
        assert_eq!(profile["isFollowing"], false);
        assert_eq!(profile["followersCount"], 1);
        assert_eq!(profile["habits"].as_array().unwrap().len(), 1);

        let (_, as_bob) = app
            .call(Method::GET, "/api/users/alice", Some(&bob), None)
            .await;
        assert_eq!(as_bob["isFollowing"], true);

        let (_, own) = app
            .call(Method::GET, "/api/users/alice", Some(&alice), None)
            .await;
        assert_eq!(own["isOwner"], true);

        let (_, followers) = app
            .call(Method::GET, "/api/users/alice/followers", None, None)
            .await;
        assert_eq!(followers[0]["username"], "bob");

        let (status, _) = app
            .call(Method::DELETE, "/api/users/alice/follow", Some(&bob), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = app
            .call(Method::GET, "/api/users/ghost", None, None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "User not found");
    }

    #[tokio::test]
    async fn test_search_and_feeds() {
        let app = create_test_app();
        let (_, alice) = app.register("alice").await;
        app.register("alina").await;
        let habit_id = app.create_habit(&alice, "Read").await;
        app.call(
            Method::POST,
            &format!("/api/habits/{habit_id}/logs"),
            Some(&alice),
            Some(json!({"date": "2024-01-02", "value": 1})),
        )
        .await;

        let (status, found) = app
            .call(Method::GET, "/api/users/search?q=ali", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found.as_array().unwrap().len(), 2);

        let (_, empty) = app
            .call(Method::GET, "/api/users/search?q=", None, None)
            .await;
        assert_eq!(empty, json!([]));

        let (_, board) = app.call(Method::GET, "/api/leaderboard", None, None).await;
        assert_eq!(board[0]["user"]["username"], "alice");
        assert_eq!(board[0]["totalLoggedDays"], 1);

        let (_, feed) = app.call(Method::GET, "/api/explore", None, None).await;
        assert_eq!(feed[0]["habit"]["id"], habit_id.as_str());
    }

    #[tokio::test]
    async fn test_avatar_upload_and_serving() {
        let app = create_test_app();
        let (_, alice) = app.register("alice").await;

        let mut body = Vec::new();
        body.extend_from_slice(
            b"--BOUNDARY\r\nContent-Disposition: form-data; name=\"avatar\"; filename=\"me.png\"\r\nContent-Type: image/png\r\n\r\n",
        );
        body.extend_from_slice(PNG);
        body.extend_from_slice(b"\r\n--BOUNDARY--\r\n");

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/me/avatar")
            .header(header::AUTHORIZATION, format!("Bearer {alice}"))
            .header(
                header::CONTENT_TYPE,
                "multipart/form-data; boundary=BOUNDARY",
            )
            .body(Body::from(body))
            .unwrap();
        let response = app.send(request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        let url = json["avatarUrl"].as_str().unwrap().to_string();
        assert!(url.starts_with("/uploads/avatars/"));

        let served = app
            .send(Request::builder().uri(&url).body(Body::empty()).unwrap())
            .await;
        assert_eq!(served.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(served.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], PNG);
    }

    #[tokio::test]
    async fn test_delete_account() {
        let app = create_test_app();
        let (_, alice) = app.register("alice").await;

        let (status, _) = app.call(Method::DELETE, "/api/me", Some(&alice), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = app.call(Method::GET, "/api/me", Some(&alice), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid or expired token");
    }

    #[tokio::test]
    async fn test_deleted_account_token_cannot_write() {
        let app = create_test_app();
        let (_, alice) = app.register("alice").await;
        let (status, _) = app.call(Method::DELETE, "/api/me", Some(&alice), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = app
            .call(
                Method::POST,
                "/api/habits",
                Some(&alice),
                Some(json!({"name": "Read", "colorHue": 40, "isBoolean": true})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid or expired token");
    }

    #[tokio::test]
    async fn test_unknown_api_path_is_json_404() {
        let app = create_test_app();
        let (status, body) = app.call(Method::GET, "/api/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "No route for /api/nope");
    }

    #[tokio::test]
    async fn test_frontend_fallback() {
        let app = create_test_app();

        for (uri, expected) in [
            ("/app.js", "console.log(1)"),
            ("/@alice", "<html>peakstreak</html>"),
            ("/", "<html>peakstreak</html>"),
        ] {
            let response = app
                .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await;
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert_eq!(&bytes[..], expected.as_bytes(), "{uri}");
        }
    }
}
