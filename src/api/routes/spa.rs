//! Frontend and fallback routes
//!
//! Paths outside `/api` serve the built single-page app: an existing file is
//! returned as is, anything else gets `index.html` so client-side routes such
//! as `/@username` work on reload. Unknown `/api` paths get a JSON 404.

use axum::extract::OriginalUri;
use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

use crate::api::error::ApiError;

/// Fallback for unmatched `/api/*` requests
pub async fn api_not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

/// Static file service with an `index.html` fallback
pub fn frontend(static_dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(static_dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(static_dir.join("index.html")))
}
