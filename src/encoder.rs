//! Turns a local photo into an inline base64 payload.
//!
//! Sources larger than [`MAX_UPLOAD_BYTES`] are refused before anything is
//! read or encoded. Only PNG, JPEG and WEBP are accepted.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{ImageMime, UploadedImage};

/// Hard ceiling on upload size (4 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 4 * 1024 * 1024;

/// Errors that can occur while loading an upload.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Image is too large. Please upload an image smaller than 4MB.")]
    SizeLimitExceeded { size: u64, limit: u64 },

    #[error("Unsupported image type. Please upload a PNG, JPEG, or WEBP image.")]
    UnsupportedFormat,

    #[error("Failed to load image. Please try again.")]
    Read(#[from] std::io::Error),
}

fn check_size(size: u64) -> Result<(), ImageError> {
    if size > MAX_UPLOAD_BYTES {
        warn!(size, limit = MAX_UPLOAD_BYTES, "rejecting oversized upload");
        return Err(ImageError::SizeLimitExceeded {
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

/// Encode an in-memory image. The preview is a `data:` URI of the same bytes.
pub fn encode_bytes(bytes: &[u8]) -> Result<UploadedImage, ImageError> {
    check_size(bytes.len() as u64)?;
    let mime = ImageMime::sniff(bytes).ok_or(ImageError::UnsupportedFormat)?;
    let base64 = STANDARD.encode(bytes);

    Ok(UploadedImage {
        preview: format!("data:{};base64,{}", mime, base64),
        base64,
        size_bytes: bytes.len() as u64,
        mime,
    })
}

/// Read and encode an image file.
///
/// The size limit is checked against the file's metadata, so an oversized
/// file is never read.
pub async fn encode_file(path: impl AsRef<Path>) -> Result<UploadedImage, ImageError> {
    let path = path.as_ref();
    let metadata = tokio::fs::metadata(path).await?;
    check_size(metadata.len())?;

    let bytes = tokio::fs::read(path).await?;
    // The file may have grown between stat and read.
    check_size(bytes.len() as u64)?;
    let mime = ImageMime::sniff(&bytes).ok_or(ImageError::UnsupportedFormat)?;

    let absolute = tokio::fs::canonicalize(path).await?;
    debug!(path = %absolute.display(), size = bytes.len(), %mime, "encoded upload");

    Ok(UploadedImage {
        base64: STANDARD.encode(&bytes),
        preview: format!("file://{}", absolute.display()),
        size_bytes: bytes.len() as u64,
        mime,
    })
}
