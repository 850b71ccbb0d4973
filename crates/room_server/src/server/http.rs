//! Plain HTTP endpoints: the game page, static assets, puzzle generation
//! and statistics.

use super::core::AppState;
use crate::rooms::RoomStats;
use crate::trail::{self, GenerateRequest, Puzzle};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::{Component, Path as FsPath};
use tracing::{debug, warn};

/// Served at `/` when the static directory has no `index.html`.
const FALLBACK_INDEX: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Emoji Trail</title>
</head>
<body>
  <h1>Emoji Trail</h1>
  <p>The game client is not installed. Put <code>index.html</code> and its assets in the static directory.</p>
</body>
</html>
"#;

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let path = state.config.static_directory.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Html(page),
        Err(e) => {
            debug!("📄 No index page at {}: {}, serving fallback", path.display(), e);
            Html(FALLBACK_INDEX.to_string())
        }
    }
}

/// `GET /static/*path`
///
/// Only plain relative paths are served; anything that could leave the
/// static directory is a 404.
pub async fn static_file(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    let path = path.trim_start_matches('/');
    let requested = FsPath::new(path);
    let is_plain = requested
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    if path.is_empty() || !is_plain {
        warn!("🚫 Rejected static path {:?}", path);
        return StatusCode::NOT_FOUND.into_response();
    }

    let full_path = state.config.static_directory.join(requested);
    match tokio::fs::read(&full_path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type(requested))], bytes).into_response(),
        Err(e) => {
            debug!("📄 Static file {} not served: {}", full_path.display(), e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

fn content_type(path: &FsPath) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// `POST /generate`
pub async fn generate(
    Json(request): Json<GenerateRequest>,
) -> Result<Json<Puzzle>, (StatusCode, Json<serde_json::Value>)> {
    let puzzle = trail::generate(request.level, &mut rand::thread_rng()).map_err(|e| {
        debug!("🧩 Refusing puzzle: {}", e);
        (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": e.to_string() })))
    })?;
    Ok(Json(puzzle))
}

/// `GET /stats`
pub async fn stats(State(state): State<AppState>) -> Json<RoomStats> {
    Json(state.room_manager.stats().await)
}
