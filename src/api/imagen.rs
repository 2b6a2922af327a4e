//! Imagen `:predict` request and response types.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::client::ClientError;
use crate::http::redact_for_log;
use crate::model::GeneratedImage;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PredictRequest<'a> {
    instances: Vec<PredictInstance<'a>>,
    parameters: PredictParameters,
}

impl<'a> PredictRequest<'a> {
    /// One prompt, one sample.
    pub(crate) fn single(prompt: &'a str) -> Self {
        Self {
            instances: vec![PredictInstance { prompt }],
            parameters: PredictParameters { sample_count: 1 },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct PredictInstance<'a> {
    prompt: &'a str,
}

#[derive(Debug, Copy, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct PredictResponse {
    predictions: NonEmpty<Prediction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

/// Take the first prediction's image, checking that it actually decodes.
pub fn first_image(body: Value) -> Result<GeneratedImage, ClientError> {
    let prediction = match serde_json::from_value::<PredictResponse>(body.clone()) {
        Ok(parsed) => parsed.predictions.head,
        Err(e) => {
            error!(error = %e, body = %redact_for_log(&body), "image response has no predictions");
            return Err(ClientError::Malformed { body });
        }
    };

    let encoded = match prediction.bytes_base64_encoded {
        Some(encoded) if !encoded.is_empty() => encoded,
        _ => {
            error!(body = %redact_for_log(&body), "image prediction carries no bytes");
            return Err(ClientError::Malformed { body });
        }
    };

    if let Err(e) = STANDARD.decode(encoded.as_bytes()) {
        error!(error = %e, "image prediction is not valid base64");
        return Err(ClientError::Malformed { body });
    }

    let image = GeneratedImage::new(encoded);
    Ok(match prediction.mime_type.filter(|m| !m.is_empty()) {
        Some(mime) => image.with_mime_type(mime),
        None => image,
    })
}
