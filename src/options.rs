//! Model, transport and credential configuration.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

use crate::client::ClientError;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";
pub const TIMEOUT_VAR: &str = "GEMINI_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_VISION_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-002";

/// Which models to call and where.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOptions {
    /// API root, without a trailing slash.
    pub base_url: String,

    /// Vision-capable text model used for face descriptions.
    pub vision_model: String,

    /// Image model used for generation.
    pub image_model: String,

    /// Overrides the instruction sent alongside the photo.
    pub describe_instruction: Option<String>,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            describe_instruction: None,
        }
    }
}

impl ModelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_vision_model(mut self, model: impl Into<String>) -> Self {
        self.vision_model = model.into();
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }
}

/// Transport configuration options.
///
/// Controls how requests are sent over the network.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportOptions {
    /// Request timeout. If None, the HTTP client's default applies.
    pub timeout: Option<Duration>,
    /// HTTP proxy URL.
    pub proxy: Option<String>,
    /// Additional HTTP headers to send with every request.
    pub headers: HashMap<String, String>,
}

impl TransportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy = Some(proxy_url.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// Everything needed to build a client.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// `None` when no usable key was configured.
    pub api_key: Option<String>,
    pub models: ModelOptions,
    pub transport: TransportOptions,
}

impl Config {
    /// Build a config around `api_key`. A blank key counts as missing.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: sanitize_key(Some(api_key.into())),
            ..Self::default()
        }
    }

    pub fn with_models(mut self, models: ModelOptions) -> Self {
        self.models = models;
        self
    }

    pub fn with_transport(mut self, transport: TransportOptions) -> Self {
        self.transport = transport;
        self
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = sanitize_key(lookup(API_KEY_VAR));
        if api_key.is_none() {
            warn!("{} is not set; face analysis and image generation will fail", API_KEY_VAR);
        }

        let mut models = ModelOptions::default();
        if let Some(url) = lookup(BASE_URL_VAR).filter(|u| !u.trim().is_empty()) {
            models = models.with_base_url(url.trim());
        }

        let mut transport = TransportOptions::default();
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ClientError::Config(format!("{} must be a whole number of seconds, got {:?}", TIMEOUT_VAR, raw))
            })?;
            transport = transport.with_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            api_key,
            models,
            transport,
        })
    }
}

fn sanitize_key(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}
