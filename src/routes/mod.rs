use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::{AppError, AppResult};

pub mod api;
pub mod assets;
pub mod auth;
pub mod home;
pub mod media;
pub mod posts;
pub mod profile;
pub mod search;

pub(crate) struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Drain a multipart form into text fields and uploaded files. Browsers
/// submit empty file inputs as a part with an empty filename; those are
/// treated as absent.
pub(crate) async fn collect_multipart(
    mut multipart: Multipart,
) -> AppResult<(HashMap<String, String>, HashMap<String, UploadedFile>)> {
    let mut texts = HashMap::new();
    let mut files = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed form data: {}", e)))?
    {
        let name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        match field.file_name().map(|f| f.to_string()) {
            Some(filename) => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Malformed form data: {}", e)))?;
                if !filename.is_empty() && !data.is_empty() {
                    files.insert(
                        name,
                        UploadedFile {
                            filename,
                            data: data.to_vec(),
                        },
                    );
                }
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Malformed form data: {}", e)))?;
                texts.insert(name, text);
            }
        }
    }

    Ok((texts, files))
}

