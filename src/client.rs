//! Core client trait and error types.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::model::{GeneratedImage, UploadedImage};

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("credential missing: please set GEMINI_API_KEY to use this feature.")]
    CredentialMissing,

    /// The endpoint answered with a non-success status.
    #[error("Remote error (HTTP {status})")]
    Remote { status: u16, body: Value },

    /// The endpoint answered with a non-success status and a body that isn't JSON.
    #[error("HTTP {status}: {body}")]
    UnexpectedBody { status: u16, body: String },

    /// The endpoint answered 2xx but the expected fields were absent.
    #[error("Malformed response")]
    Malformed { body: Value },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// The two remote capabilities the studios depend on.
#[async_trait]
pub trait StudioClient: Send + Sync {
    /// Ask the vision model for a description of the face in `image`.
    async fn describe_face(&self, image: &UploadedImage) -> Result<String, ClientError>;

    /// Generate exactly one image for `prompt`.
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ClientError>;
}
