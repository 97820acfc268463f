use std::path::{Component, Path as FsPath, PathBuf};

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Resolve a requested media path under the uploads dir. Returns None for
/// anything but plain relative components (".." traversal, absolute paths,
/// drive prefixes), so the result can never escape `uploads_dir`.
fn resolve_media_path(uploads_dir: &FsPath, requested: &str) -> Option<PathBuf> {
    let relative = FsPath::new(requested);
    if requested.is_empty()
        || !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(uploads_dir.join(relative))
}

/// GET /media/{*path} — serve user-uploaded images from the uploads dir.
pub async fn serve(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> AppResult<Response> {
    let full =
        resolve_media_path(state.config.uploads_path(), &path).ok_or(AppError::NotFound)?;

    let data = match std::fs::read(&full) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(AppError::NotFound),
        Err(e) => return Err(AppError::Internal(format!("reading upload: {}", e))),
    };

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        data,
    )
        .into_response())
}
