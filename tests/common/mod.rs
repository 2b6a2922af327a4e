#![allow(dead_code)]

use async_trait::async_trait;
use likeness::client::ClientError;
use likeness::http::{HttpReply, Transport};
use likeness::options::ModelOptions;
use likeness::GeminiClient;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Records every POST and answers from a queue of canned replies.
#[derive(Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<Result<HttpReply, ClientError>>>>,
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockTransport {
    pub fn new(replies: Vec<HttpReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().map(Ok).collect())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A transport whose only reply is a transport-level failure.
    pub fn failing() -> Self {
        let err = serde_json::from_str::<Value>("{").unwrap_err();
        let transport = Self::default();
        transport
            .replies
            .lock()
            .unwrap()
            .push_back(Err(ClientError::Parse(err)));
        transport
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, ClientError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), body.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Config("No more mock replies".to_string())))
    }
}

pub fn json_reply(status: u16, body: Value) -> HttpReply {
    HttpReply::new(status, serde_json::to_vec(&body).unwrap())
}

pub fn client(transport: MockTransport) -> GeminiClient<MockTransport> {
    GeminiClient::with_transport(
        Some("test-key".to_string()),
        ModelOptions::default().with_base_url("https://api.test/v1beta"),
        transport,
    )
}

pub fn keyless_client(transport: MockTransport) -> GeminiClient<MockTransport> {
    GeminiClient::with_transport(None, ModelOptions::default(), transport)
}

/// PNG signature followed by `len` filler bytes.
pub fn png_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.resize(8 + len, 0);
    bytes
}

pub fn jpeg_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.resize(4 + len, 0);
    bytes
}
