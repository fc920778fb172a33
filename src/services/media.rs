use std::path::Path;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use tokio::fs;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const IMAGE_DIR: &str = "recipes";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

/// Accepts raw base64 or a `data:image/<type>;base64,<payload>` URI.
/// The image type is taken from the decoded bytes, not from the declared mime type.
pub fn decode_image(payload: &str) -> AppResult<DecodedImage> {
    let payload = payload.trim();
    let data = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (meta, data) = rest
                .split_once(',')
                .ok_or_else(|| AppError::BadRequest("Malformed image data URI".into()))?;
            if !meta.ends_with(";base64") {
                return Err(AppError::BadRequest("Image must be base64 encoded".into()));
            }
            data
        }
        None => payload,
    };

    if data.is_empty() {
        return Err(AppError::BadRequest("Image is required".into()));
    }

    let bytes = STANDARD
        .decode(data)
        .map_err(|_| AppError::BadRequest("Image is not valid base64".into()))?;
    let extension = sniff_extension(&bytes)
        .ok_or_else(|| AppError::BadRequest("Unsupported image format".into()))?;

    Ok(DecodedImage { bytes, extension })
}

fn sniff_extension(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// Writes the image under `media_root` and returns its path relative to the root.
pub async fn store_image(media_root: &str, image: &DecodedImage) -> AppResult<String> {
    let dir = Path::new(media_root).join(IMAGE_DIR);
    fs::create_dir_all(&dir)
        .await
        .map_err(|err| AppError::Internal(err.into()))?;

    let file_name = format!("{}.{}", Uuid::new_v4(), image.extension);
    fs::write(dir.join(&file_name), &image.bytes)
        .await
        .map_err(|err| AppError::Internal(err.into()))?;

    Ok(format!("{IMAGE_DIR}/{file_name}"))
}

pub async fn remove_image(media_root: &str, relative: &str) {
    if let Err(err) = fs::remove_file(Path::new(media_root).join(relative)).await {
        tracing::warn!(error = %err, path = relative, "failed to remove image");
    }
}

/// Passes `result` through, removing the freshly stored image when it is an
/// error so a failed write or commit leaves no orphaned file behind.
pub async fn discard_on_error<T>(
    media_root: &str,
    stored: Option<&str>,
    result: AppResult<T>,
) -> AppResult<T> {
    if result.is_err() {
        if let Some(relative) = stored {
            remove_image(media_root, relative).await;
        }
    }
    result
}

pub fn image_url(relative: &str) -> String {
    format!("/media/{relative}")
}
