use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use rust_embed::Embed;

/// Compiled-in static files (CSS emitted by build.rs). Immutable per build,
/// so clients may cache them for a day.
const CACHE_CONTROL: &str = "public, max-age=86400";

#[derive(Embed)]
#[folder = "assets/"]
struct StaticAssets;

/// GET /assets/{*path}
pub async fn serve(Path(path): Path<String>) -> Response {
    let Some(file) = StaticAssets::get(&path) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
        ],
        file.data.to_vec(),
    )
        .into_response()
}
