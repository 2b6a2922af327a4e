//! HTTP transport used to reach the generative endpoints.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;

use crate::client::ClientError;
use crate::options::TransportOptions;

/// Inline payloads longer than this are elided from debug logs.
const LOG_INLINE_LIMIT: usize = 64;

/// Status and raw body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: Bytes,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can POST a JSON body and hand back the reply.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, ClientError>;
}

/// Production transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    options: TransportOptions,
}

impl ReqwestTransport {
    pub fn new(options: TransportOptions) -> Result<Self, ClientError> {
        let client = build_http_client(&options)?;
        Ok(Self { client, options })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, ClientError> {
        tracing::debug!("POST {}", redact_url(url));

        let mut req = self.client.post(url).header(CONTENT_TYPE, "application/json");
        req = add_extra_headers(req, &self.options);

        // reqwest errors carry the request URL, and the URL carries the key.
        let response = req
            .json_logged(body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status().as_u16();
        let body = response
            .bytes_logged()
            .await
            .map_err(reqwest::Error::without_url)?;

        Ok(HttpReply { status, body })
    }
}

/// Build a configured HTTP client from transport options.
pub fn build_http_client(transport_options: &TransportOptions) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder();

    if let Some(t) = transport_options.timeout {
        builder = builder.timeout(t);
    }
    if let Some(proxy_url) = &transport_options.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
    }

    builder.build()
}

/// Add extra headers to a request if specified in transport options.
pub fn add_extra_headers(
    mut request: RequestBuilder,
    transport_options: &TransportOptions,
) -> RequestBuilder {
    for (key, value) in &transport_options.headers {
        request = request.header(key, value);
    }
    request
}

/// Replace the value of the `key` query parameter so URLs are safe to log.
///
/// Anything that doesn't parse as a URL is cut at the query string.
pub fn redact_url(url: &str) -> String {
    let mut parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return url.split('?').next().unwrap_or_default().to_string(),
    };
    if parsed.query().is_none() {
        return parsed.to_string();
    }

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "REDACTED".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}

/// Copy of `value` with long inline image payloads replaced by a length marker.
pub fn redact_for_log(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s)
                            if (k == "data" || k == "bytesBase64Encoded")
                                && s.len() > LOG_INLINE_LIMIT =>
                        {
                            Value::String(format!("<{} base64 chars elided>", s.len()))
                        }
                        other => redact_for_log(other),
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_for_log).collect()),
        other => other.clone(),
    }
}

/// Extension trait for RequestBuilder that logs request body.
pub trait RequestBuilderExt {
    /// Set JSON request body and log it. Returns the RequestBuilder for chaining.
    fn json_logged(self, json: &Value) -> Self;
}

impl RequestBuilderExt for RequestBuilder {
    fn json_logged(self, json: &Value) -> Self {
        if let Ok(req_body) = serde_json::to_string_pretty(&redact_for_log(json)) {
            tracing::debug!("API request body ({} bytes):\n{}", req_body.len(), req_body);
        }

        self.json(json)
    }
}

/// Extension trait for Response that logs response body.
#[async_trait]
pub trait ResponseExt {
    /// Read the full body and log it. Consumes the response.
    async fn bytes_logged(self) -> Result<Bytes, reqwest::Error>;
}

#[async_trait]
impl ResponseExt for reqwest::Response {
    async fn bytes_logged(self) -> Result<Bytes, reqwest::Error> {
        let bytes = self.bytes().await?;

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(json) => tracing::debug!("API response ({} bytes):\n{}", bytes.len(), redact_for_log(&json)),
            Err(_) => {
                if let Ok(text) = std::str::from_utf8(&bytes) {
                    tracing::debug!("API response ({} bytes):\n{}", text.len(), text);
                }
            }
        }

        Ok(bytes)
    }
}
