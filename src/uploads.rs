use std::path::Path;

use crate::error::{AppError, AppResult};

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Store an uploaded image under `uploads_dir/subdir` with a fresh UUID
/// filename, keeping only the (allow-listed) extension from the original
/// name. Returns the path relative to the uploads dir, as stored in the DB
/// and served from /media.
pub fn save_image(
    uploads_dir: &Path,
    subdir: &str,
    original_name: &str,
    data: &[u8],
) -> AppResult<String> {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or_else(|| AppError::BadRequest("Image file has no extension".into()))?;

    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unsupported image type: .{}",
            ext
        )));
    }
    if data.is_empty() {
        return Err(AppError::BadRequest("Image file is empty".into()));
    }

    let dir = uploads_dir.join(subdir);
    std::fs::create_dir_all(&dir)
        .map_err(|e| AppError::Internal(format!("creating upload dir: {}", e)))?;

    let filename = format!("{}.{}", uuid::Uuid::now_v7(), ext);
    std::fs::write(dir.join(&filename), data)
        .map_err(|e| AppError::Internal(format!("writing upload: {}", e)))?;

    Ok(format!("{}/{}", subdir, filename))
}
