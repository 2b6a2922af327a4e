mod common;

use async_trait::async_trait;
use common::{client, json_reply, keyless_client, png_bytes, MockTransport};
use likeness::client::{ClientError, StudioClient};
use likeness::session::{generate_playground, generate_portrait};
use likeness::studio::{Rejected, PLAYGROUND_FAILURE};
use likeness::http::HttpReply;
use likeness::{Config, GeminiClient, GeneratedImage, ModelOptions, Session, TransportOptions, UploadedImage};
use serde_json::json;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn describe_reply(text: &str) -> HttpReply {
    json_reply(
        200,
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }),
    )
}

fn image_reply(b64: &str) -> HttpReply {
    json_reply(200, json!({ "predictions": [{ "bytesBase64Encoded": b64 }] }))
}

#[tokio::test]
async fn test_portrait_round_trip() {
    let transport = MockTransport::new(vec![describe_reply("brown eyes"), image_reply("AAAA")]);
    let mut session = Session::new(client(transport.clone()));

    session.upload_bytes(&png_bytes(16)).unwrap();
    session.analyze_face().await.unwrap();
    assert_eq!(session.portrait.description(), "brown eyes");

    session.portrait.set_scene("as a knight");
    session.generate_portrait().await.unwrap();

    let image = session.portrait.generated_image().unwrap();
    assert_eq!(image.data_uri(), "data:image/png;base64,AAAA");
    assert_eq!(session.portrait.visible_error(), None);

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].1["instances"][0]["prompt"], "brown eyes. as a knight");
}

#[tokio::test]
async fn test_upload_file_then_analyze() {
    let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    file.write_all(&png_bytes(64)).unwrap();

    let transport = MockTransport::new(vec![describe_reply("freckles, green eyes")]);
    let mut session = Session::new(client(transport));

    session.upload_file(file.path()).await.unwrap();
    assert!(session.portrait.can_analyze());
    session.analyze_face().await.unwrap();
    assert_eq!(session.portrait.description(), "freckles, green eyes");
}

#[tokio::test]
async fn test_oversized_upload_makes_no_request() {
    let file = tempfile::NamedTempFile::new().unwrap();
    file.as_file().set_len(likeness::MAX_UPLOAD_BYTES + 1).unwrap();

    let transport = MockTransport::new(vec![]);
    let mut session = Session::new(client(transport.clone()));

    session.upload_file(file.path()).await.unwrap();
    assert!(session.portrait.image().is_none());
    assert_eq!(
        session.portrait.visible_error(),
        Some("Image is too large. Please upload an image smaller than 4MB.")
    );
    assert_eq!(session.analyze_face().await, Err(Rejected::MissingImage));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_missing_credential_settles_immediately() {
    let transport = MockTransport::new(vec![]);
    let mut session = Session::new(keyless_client(transport.clone()));

    session.upload_bytes(&png_bytes(16)).unwrap();
    session.analyze_face().await.unwrap();
    let error = session.portrait.analysis().err().unwrap();
    assert!(error.starts_with("credential missing"));

    session.playground.set_prompt("a lighthouse");
    session.generate_playground().await.unwrap();
    let error = session.playground.generation().err().unwrap();
    assert!(error.starts_with("credential missing"));

    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_remote_error_message_surfaces() {
    let transport = MockTransport::new(vec![json_reply(
        400,
        json!({ "error": { "code": 400, "message": "API key not valid. Please pass a valid API key." } }),
    )]);
    let mut session = Session::new(client(transport));

    session.playground.set_prompt("a lighthouse");
    session.generate_playground().await.unwrap();
    assert_eq!(
        session.playground.visible_error(),
        Some("API key not valid. Please pass a valid API key.")
    );
}

#[tokio::test]
async fn test_empty_predictions_use_default_message() {
    let transport = MockTransport::new(vec![json_reply(200, json!({ "predictions": [] }))]);
    let mut session = Session::new(client(transport));

    session.playground.set_prompt("a lighthouse");
    session.generate_playground().await.unwrap();
    assert_eq!(
        session.playground.visible_error(),
        Some(PLAYGROUND_FAILURE.default_message)
    );
}

#[tokio::test]
async fn test_transport_failure_is_prefixed() {
    let mut session = Session::new(client(MockTransport::failing()));

    session.upload_bytes(&png_bytes(16)).unwrap();
    session.analyze_face().await.unwrap();
    let error = session.portrait.visible_error().unwrap();
    assert!(error.starts_with("Error analyzing face: "));
    assert!(error.ends_with("Check the logs for details."));
}

#[tokio::test]
async fn test_non_json_error_body_is_prefixed() {
    let transport = MockTransport::new(vec![HttpReply::new(502, "<html>Bad Gateway</html>")]);
    let mut session = Session::new(client(transport));

    session.playground.set_prompt("a lighthouse");
    session.generate_playground().await.unwrap();
    assert_eq!(
        session.playground.visible_error(),
        Some("Error generating image: HTTP 502: <html>Bad Gateway</html>. Check the logs for details.")
    );
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_unreachable_endpoint_never_reveals_key() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let config = Config::new("SECRET-KEY-123")
        .with_models(ModelOptions::new().with_base_url("http://127.0.0.1:1/v1beta"))
        .with_transport(TransportOptions::new().with_timeout(Duration::from_secs(5)));
    let mut session = Session::new(GeminiClient::new(config).unwrap());

    session.playground.set_prompt("a lighthouse");
    session.generate_playground().await.unwrap();
    let message = session.playground.visible_error().unwrap();
    assert!(message.starts_with("Error generating image: "), "{}", message);
    assert!(message.ends_with("Check the logs for details."), "{}", message);
    assert!(!message.contains("SECRET-KEY-123"), "{}", message);

    session.upload_bytes(&png_bytes(16)).unwrap();
    session.analyze_face().await.unwrap();
    let message = session.portrait.visible_error().unwrap();
    assert!(message.starts_with("Error analyzing face: "), "{}", message);
    assert!(!message.contains("SECRET-KEY-123"), "{}", message);

    let logs = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("key=REDACTED"));
    assert!(!logs.contains("SECRET-KEY-123"));
}

#[tokio::test]
async fn test_rejected_trigger_sends_nothing() {
    let transport = MockTransport::new(vec![]);
    let mut session = Session::new(client(transport.clone()));

    assert_eq!(session.analyze_face().await, Err(Rejected::MissingImage));
    assert_eq!(session.generate_portrait().await, Err(Rejected::MissingDescription));
    assert_eq!(session.generate_playground().await, Err(Rejected::MissingPrompt));
    assert_eq!(transport.calls(), 0);
}

/// Blocks each request until the test releases it.
struct GatedClient {
    gate: tokio::sync::Semaphore,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl StudioClient for GatedClient {
    async fn describe_face(&self, _image: &UploadedImage) -> Result<String, ClientError> {
        Err(ClientError::Config("not used".to_string()))
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ClientError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let _permit = self.gate.acquire().await.unwrap();
        Ok(GeneratedImage::new("AAAA"))
    }
}

#[tokio::test]
async fn test_studios_run_concurrently() {
    let client = Arc::new(GatedClient {
        gate: tokio::sync::Semaphore::new(0),
        prompts: Mutex::new(Vec::new()),
    });
    let mut session = Session::new(GatedStudio(client.clone()));
    session.portrait.set_description("brown eyes");
    session.portrait.set_scene("as a knight");
    session.playground.set_prompt("a lighthouse");

    let (client_ref, portrait, playground) = session.split();
    let release = async {
        while client.prompts.lock().unwrap().len() < 2 {
            tokio::task::yield_now().await;
        }
        client.gate.add_permits(2);
    };

    let (a, b, _) = tokio::join!(
        generate_portrait(client_ref, portrait),
        generate_playground(client_ref, playground),
        release
    );
    assert_eq!(a, Ok(()));
    assert_eq!(b, Ok(()));

    let prompts = client.prompts.lock().unwrap().clone();
    assert!(prompts.contains(&"brown eyes. as a knight".to_string()));
    assert!(prompts.contains(&"a lighthouse".to_string()));
    assert!(session.portrait.generated_image().is_some());
    assert!(session.playground.generated_image().is_some());
}

/// Shares one gated client between the test and the session.
struct GatedStudio(Arc<GatedClient>);

#[async_trait]
impl StudioClient for GatedStudio {
    async fn describe_face(&self, image: &UploadedImage) -> Result<String, ClientError> {
        self.0.describe_face(image).await
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ClientError> {
        self.0.generate_image(prompt).await
    }
}
