//! Google Gemini API client implementation.
//!
//! Face descriptions go through `:generateContent` on a vision-capable
//! model; image generation is delegated to the Imagen `:predict` types in
//! [`crate::api::imagen`]. The API key travels as the `key` query parameter.
//! See: <https://ai.google.dev/api/rest>

use async_trait::async_trait;
use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::api::imagen::{first_image, PredictRequest};
use crate::client::{ClientError, StudioClient};
use crate::http::{redact_for_log, ReqwestTransport, Transport};
use crate::model::{GeneratedImage, UploadedImage};
use crate::options::{Config, ModelOptions};

/// Instruction sent with every photo.
pub const DESCRIBE_INSTRUCTION: &str = "Describe the main person's facial features in detail. \
Focus on hair color and style, eye color, face shape, specific features like nose and mouth, \
and any distinctive elements such as glasses, beard, freckles, or facial expression. \
Provide a concise but comprehensive description suitable for an artist to recreate the likeness.";

/// MIME tag on the inline photo, whatever its actual format.
pub const INLINE_MIME_TYPE: &str = "image/jpeg";

/// Gemini client, generic over the HTTP transport.
#[derive(Debug, Clone)]
pub struct GeminiClient<T = ReqwestTransport> {
    api_key: Option<String>,
    models: ModelOptions,
    transport: T,
}

impl GeminiClient<ReqwestTransport> {
    /// Create a client backed by `reqwest`.
    pub fn new(config: Config) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(config.transport)?;
        Ok(Self::with_transport(config.api_key, config.models, transport))
    }

    /// Create a client from `GEMINI_*` environment variables.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(Config::from_env()?)
    }
}

impl<T: Transport> GeminiClient<T> {
    pub fn with_transport(api_key: Option<String>, models: ModelOptions, transport: T) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            models,
            transport,
        }
    }

    pub fn models(&self) -> &ModelOptions {
        &self.models
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn credential(&self) -> Result<&str, ClientError> {
        self.api_key.as_deref().ok_or(ClientError::CredentialMissing)
    }

    fn endpoint(&self, model: &str, method: &str, key: &str) -> String {
        format!("{}/models/{}:{}?key={}", self.models.base_url, model, method, key)
    }

    /// POST `body` and return the decoded JSON reply, mapping non-2xx to `Remote`.
    async fn call(&self, url: &str, body: Value) -> Result<Value, ClientError> {
        let reply = self.transport.post_json(url, &body).await?;

        if !reply.is_success() {
            let body = match serde_json::from_slice::<Value>(&reply.body) {
                Ok(body) => body,
                Err(_) => {
                    let text = String::from_utf8_lossy(&reply.body).trim().to_string();
                    error!(status = reply.status, body = %text, "request failed with a non-JSON body");
                    return Err(ClientError::UnexpectedBody {
                        status: reply.status,
                        body: if text.is_empty() { "empty response".to_string() } else { text },
                    });
                }
            };
            error!(status = reply.status, body = %redact_for_log(&body), "request failed");
            return Err(ClientError::Remote {
                status: reply.status,
                body,
            });
        }

        Ok(serde_json::from_slice(&reply.body)?)
    }
}

#[async_trait]
impl<T: Transport> StudioClient for GeminiClient<T> {
    async fn describe_face(&self, image: &UploadedImage) -> Result<String, ClientError> {
        let key = self.credential()?;
        let instruction = self
            .models
            .describe_instruction
            .as_deref()
            .unwrap_or(DESCRIBE_INSTRUCTION);

        let request = GeminiRequest::describe(instruction, image);
        let url = self.endpoint(&self.models.vision_model, "generateContent", key);
        info!(model = %self.models.vision_model, size = image.size_bytes, "requesting face description");

        let body = self.call(&url, serde_json::to_value(&request)?).await?;
        first_text(body)
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ClientError> {
        let key = self.credential()?;

        let request = PredictRequest::single(prompt);
        let url = self.endpoint(&self.models.image_model, "predict", key);
        info!(model = %self.models.image_model, prompt_len = prompt.len(), "requesting image");

        let body = self.call(&url, serde_json::to_value(&request)?).await?;
        first_image(body)
    }
}

/// Pull the first non-blank, non-thought text part out of the first candidate.
pub fn first_text(body: Value) -> Result<String, ClientError> {
    let parsed = match serde_json::from_value::<GeminiResponse>(body.clone()) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!(error = %e, body = %redact_for_log(&body), "face description response has no candidates");
            return Err(ClientError::Malformed { body });
        }
    };

    let text = parsed.candidates.head.content.and_then(|content| {
        content
            .parts
            .into_iter()
            .filter(|part| !part.thought.unwrap_or_default())
            .filter_map(|part| part.text)
            .find(|text| !text.trim().is_empty())
    });

    match text {
        Some(text) => Ok(text),
        None => {
            error!(body = %redact_for_log(&body), "face description response has no text part");
            Err(ClientError::Malformed { body })
        }
    }
}

// --- Gemini API Request/Response Types ---

#[derive(Debug, Clone, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

impl<'a> GeminiRequest<'a> {
    fn describe(instruction: &'a str, image: &'a UploadedImage) -> Self {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: GeminiRole::User,
                parts: vec![
                    GeminiPart::Text { text: instruction },
                    GeminiPart::InlineData {
                        inline_data: InlineData {
                            mime_type: INLINE_MIME_TYPE,
                            data: &image.base64,
                        },
                    },
                ],
            }],
        }
    }
}

#[derive(Debug, Copy, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum GeminiRole {
    User,
}

#[derive(Debug, Clone, Serialize)]
struct GeminiContent<'a> {
    role: GeminiRole,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
enum GeminiPart<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: NonEmpty<GeminiCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
    thought: Option<bool>,
}
