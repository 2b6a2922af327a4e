//! Drives the studios against a [`StudioClient`].
//!
//! Each operation is `begin_*` → one request → `finish_*`, run inside a span
//! tagged with a fresh operation id. The portrait and playground studios
//! borrow disjointly, so both can be in flight at once via [`Session::split`].

use std::path::Path;

use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::client::StudioClient;
use crate::encoder;
use crate::studio::{PlaygroundStudio, PortraitStudio, Rejected};

/// Both studios plus the client that serves them.
///
/// # Example
/// ```no_run
/// use likeness::{GeminiClient, Session};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut session = Session::new(GeminiClient::from_env()?);
///
///     session.upload_file("me.jpg").await?;
///     session.analyze_face().await?;
///     session.portrait.set_scene("as a knight in a misty forest");
///     session.generate_portrait().await?;
///
///     if let Some(image) = session.portrait.generated_image() {
///         image.save("portrait.png").await?;
///     }
///     Ok(())
/// }
/// ```
pub struct Session<C: StudioClient> {
    client: C,
    pub portrait: PortraitStudio,
    pub playground: PlaygroundStudio,
}

impl<C: StudioClient> Session<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            portrait: PortraitStudio::new(),
            playground: PlaygroundStudio::new(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Borrow the client and both studios separately.
    pub fn split(&mut self) -> (&C, &mut PortraitStudio, &mut PlaygroundStudio) {
        (&self.client, &mut self.portrait, &mut self.playground)
    }

    /// Load a photo from disk into the portrait studio.
    pub async fn upload_file(&mut self, path: impl AsRef<Path>) -> Result<(), Rejected> {
        if self.portrait.is_busy() {
            return Err(Rejected::Busy);
        }
        let result = encoder::encode_file(path).await;
        self.portrait.apply_upload(result)
    }

    /// Load a photo from memory into the portrait studio.
    pub fn upload_bytes(&mut self, bytes: &[u8]) -> Result<(), Rejected> {
        if self.portrait.is_busy() {
            return Err(Rejected::Busy);
        }
        self.portrait.apply_upload(encoder::encode_bytes(bytes))
    }

    pub async fn analyze_face(&mut self) -> Result<(), Rejected> {
        analyze_face(&self.client, &mut self.portrait).await
    }

    pub async fn generate_portrait(&mut self) -> Result<(), Rejected> {
        generate_portrait(&self.client, &mut self.portrait).await
    }

    pub async fn generate_playground(&mut self) -> Result<(), Rejected> {
        generate_playground(&self.client, &mut self.playground).await
    }

    pub fn reset_portrait(&mut self) -> Result<(), Rejected> {
        self.portrait.reset()
    }

    pub fn reset_playground(&mut self) -> Result<(), Rejected> {
        self.playground.reset()
    }
}

/// Describe the face in the studio's current photo.
pub async fn analyze_face<C>(client: &C, studio: &mut PortraitStudio) -> Result<(), Rejected>
where
    C: StudioClient + ?Sized,
{
    let image = studio.begin_analysis()?;

    async {
        let result = client.describe_face(&image).await;
        studio.finish_analysis(result);
    }
    .instrument(info_span!("analyze_face", op_id = %Uuid::new_v4()))
    .await;

    Ok(())
}

/// Generate a portrait from the studio's description and scene.
pub async fn generate_portrait<C>(client: &C, studio: &mut PortraitStudio) -> Result<(), Rejected>
where
    C: StudioClient + ?Sized,
{
    let prompt = studio.begin_generation()?;

    async {
        let result = client.generate_image(&prompt).await;
        studio.finish_generation(result);
    }
    .instrument(info_span!("generate_portrait", op_id = %Uuid::new_v4()))
    .await;

    Ok(())
}

/// Generate an image from the playground prompt.
pub async fn generate_playground<C>(client: &C, studio: &mut PlaygroundStudio) -> Result<(), Rejected>
where
    C: StudioClient + ?Sized,
{
    let prompt = studio.begin_generation()?;

    async {
        let result = client.generate_image(&prompt).await;
        studio.finish_generation(result);
    }
    .instrument(info_span!("generate_playground", op_id = %Uuid::new_v4()))
    .await;

    Ok(())
}
