//! Image payloads exchanged between the encoder, the clients and the studios.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// Image formats accepted for upload.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageMime {
    Png,
    Jpeg,
    Webp,
}

impl ImageMime {
    /// Sniff the format from the leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageMime::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageMime::Jpeg)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageMime::Webp)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMime::Png => "image/png",
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Webp => "image/webp",
        }
    }
}

impl std::fmt::Display for ImageMime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A photo selected by the user, ready to be inlined into a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// Base64 of the raw file bytes, without a `data:` prefix.
    pub base64: String,
    /// Displayable reference to the source (`file://` or `data:` URI).
    pub preview: String,
    pub size_bytes: u64,
    pub mime: ImageMime,
}

/// An image returned by the generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub base64: String,
    pub mime_type: String,
}

impl GeneratedImage {
    pub const DEFAULT_MIME: &'static str = "image/png";

    pub fn new(base64: impl Into<String>) -> Self {
        Self {
            base64: base64.into(),
            mime_type: Self::DEFAULT_MIME.to_string(),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Inline reference suitable for an `<img src>` or any data-URI aware viewer.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }

    /// Decode the payload back into raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.base64.as_bytes())
    }

    /// Write the decoded image to `path`.
    pub async fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let bytes = self
            .decode()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        tokio::fs::write(path, bytes).await
    }
}
