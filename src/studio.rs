//! Per-studio UI state as plain data plus transitions.
//!
//! Every async operation is split into `begin_*`, which validates the
//! trigger and moves the operation to [`OperationState::InFlight`], and
//! `finish_*`, which settles it with the client's result. A refused trigger
//! returns [`Rejected`] and leaves the state untouched.
//!
//! Errors are stamped with a studio-local counter. Starting any operation or
//! settling one successfully advances `quiet_since`, which hides every error
//! stamped before it.

use thiserror::Error;
use tracing::{error, info, warn};

use crate::client::ClientError;
use crate::encoder::ImageError;
use crate::model::{GeneratedImage, UploadedImage};
use crate::normalize::{client_error_message, FailureText};

pub const ANALYSIS_FAILURE: FailureText = FailureText {
    default_message: "Face analysis failed. The model couldn't describe the face or the response was empty. Try a different image or ensure the face is clear.",
    transport_prefix: "Error analyzing face",
};

pub const PORTRAIT_FAILURE: FailureText = FailureText {
    default_message: "Portrait generation failed. The model couldn't generate an image or the response was empty. Try adjusting your prompts.",
    transport_prefix: "Error generating portrait",
};

pub const PLAYGROUND_FAILURE: FailureText = FailureText {
    default_message: "Image generation failed. The model couldn't generate an image or the response was empty. Try a different prompt.",
    transport_prefix: "Error generating image",
};

/// Why a trigger was refused.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Rejected {
    #[error("Please upload an image first.")]
    MissingImage,

    #[error("Please analyze a face or manually enter a description first.")]
    MissingDescription,

    #[error("Please enter a scene or style prompt.")]
    MissingScene,

    #[error("Please enter a prompt.")]
    MissingPrompt,

    #[error("An operation is already in progress.")]
    Busy,
}

/// Lifecycle of a single async operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState<T> {
    Idle,
    InFlight,
    Settled(Result<T, String>),
}

impl<T> Default for OperationState<T> {
    fn default() -> Self {
        OperationState::Idle
    }
}

impl<T> OperationState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, OperationState::Idle)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, OperationState::InFlight)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, OperationState::Settled(_))
    }

    pub fn ok(&self) -> Option<&T> {
        match self {
            OperationState::Settled(Ok(value)) => Some(value),
            _ => None,
        }
    }

    pub fn err(&self) -> Option<&str> {
        match self {
            OperationState::Settled(Err(message)) => Some(message),
            _ => None,
        }
    }
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Upload a photo, describe the face, then paint it into a scene.
#[derive(Debug, Clone, Default)]
pub struct PortraitStudio {
    image: Option<UploadedImage>,
    description: String,
    scene: String,
    analysis: OperationState<String>,
    generation: OperationState<GeneratedImage>,
    upload_error: Option<String>,

    clock: u64,
    quiet_since: u64,
    upload_at: u64,
    analysis_at: u64,
    generation_at: u64,
}

impl PortraitStudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        self.image.as_ref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn scene(&self) -> &str {
        &self.scene
    }

    pub fn analysis(&self) -> &OperationState<String> {
        &self.analysis
    }

    pub fn generation(&self) -> &OperationState<GeneratedImage> {
        &self.generation
    }

    pub fn generated_image(&self) -> Option<&GeneratedImage> {
        self.generation.ok()
    }

    pub fn is_busy(&self) -> bool {
        self.analysis.is_in_flight() || self.generation.is_in_flight()
    }

    pub fn can_analyze(&self) -> bool {
        self.image.is_some() && !self.analysis.is_in_flight()
    }

    pub fn can_generate(&self) -> bool {
        self.prompt().is_some() && !self.generation.is_in_flight()
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn quiet(&mut self) {
        self.quiet_since = self.tick();
    }

    /// Record the outcome of loading a new photo.
    ///
    /// A successful upload invalidates the description, the generated
    /// portrait and any error. A failed one drops the pending image only.
    pub fn apply_upload(&mut self, result: Result<UploadedImage, ImageError>) -> Result<(), Rejected> {
        if self.is_busy() {
            return Err(Rejected::Busy);
        }

        match result {
            Ok(image) => {
                info!(size = image.size_bytes, mime = %image.mime, "photo uploaded");
                self.image = Some(image);
                self.description.clear();
                self.analysis = OperationState::Idle;
                self.generation = OperationState::Idle;
                self.upload_error = None;
                self.quiet();
            }
            Err(e) => {
                error!(error = ?e, "photo upload failed");
                self.image = None;
                self.upload_error = Some(e.to_string());
                self.upload_at = self.tick();
            }
        }
        Ok(())
    }

    /// Replace the description, e.g. when the user edits it by hand.
    pub fn set_description(&mut self, text: impl Into<String>) {
        self.description = text.into();
        self.invalidate_generation();
    }

    pub fn set_scene(&mut self, text: impl Into<String>) {
        self.scene = text.into();
        self.invalidate_generation();
    }

    fn invalidate_generation(&mut self) {
        if self.generation.is_settled() {
            self.generation = OperationState::Idle;
        }
    }

    /// The generation prompt, once both description and scene are filled in.
    pub fn prompt(&self) -> Option<String> {
        if is_blank(&self.description) || is_blank(&self.scene) {
            return None;
        }
        Some(format!("{}. {}", self.description, self.scene))
    }

    /// Start face analysis. Returns the image to send.
    pub fn begin_analysis(&mut self) -> Result<UploadedImage, Rejected> {
        if self.analysis.is_in_flight() {
            return Err(Rejected::Busy);
        }
        let image = self.image.clone().ok_or(Rejected::MissingImage)?;

        self.analysis = OperationState::InFlight;
        self.description.clear();
        self.invalidate_generation();
        self.quiet();
        Ok(image)
    }

    pub fn finish_analysis(&mut self, result: Result<String, ClientError>) {
        if !self.analysis.is_in_flight() {
            warn!("face analysis settled without being in flight; ignoring");
            return;
        }

        match result {
            Ok(text) => {
                info!(len = text.len(), "face analysis succeeded");
                self.description = text.clone();
                self.analysis = OperationState::Settled(Ok(text));
                self.quiet();
            }
            Err(e) => {
                let message = client_error_message(&e, &ANALYSIS_FAILURE);
                error!(error = ?e, %message, "face analysis failed");
                self.analysis = OperationState::Settled(Err(message));
                self.analysis_at = self.tick();
            }
        }
    }

    /// Start portrait generation. Returns the prompt to send.
    pub fn begin_generation(&mut self) -> Result<String, Rejected> {
        if self.generation.is_in_flight() {
            return Err(Rejected::Busy);
        }
        if is_blank(&self.description) {
            return Err(Rejected::MissingDescription);
        }
        if is_blank(&self.scene) {
            return Err(Rejected::MissingScene);
        }
        let prompt = format!("{}. {}", self.description, self.scene);

        self.generation = OperationState::InFlight;
        self.quiet();
        Ok(prompt)
    }

    pub fn finish_generation(&mut self, result: Result<GeneratedImage, ClientError>) {
        if !self.generation.is_in_flight() {
            warn!("portrait generation settled without being in flight; ignoring");
            return;
        }

        match result {
            Ok(image) => {
                info!(mime = %image.mime_type, "portrait generated");
                self.generation = OperationState::Settled(Ok(image));
                self.quiet();
            }
            Err(e) => {
                let message = client_error_message(&e, &PORTRAIT_FAILURE);
                error!(error = ?e, %message, "portrait generation failed");
                self.generation = OperationState::Settled(Err(message));
                self.generation_at = self.tick();
            }
        }
    }

    /// The error that should currently be on screen, if any.
    pub fn visible_error(&self) -> Option<&str> {
        if self.generation.ok().is_some() {
            return None;
        }

        let analysis = if is_blank(&self.description) {
            self.analysis.err().map(|m| (m, self.analysis_at))
        } else {
            None
        };

        [
            self.upload_error.as_deref().map(|m| (m, self.upload_at)),
            analysis,
            self.generation.err().map(|m| (m, self.generation_at)),
        ]
        .into_iter()
        .flatten()
        .filter(|(_, at)| *at > self.quiet_since)
        .max_by_key(|(_, at)| *at)
        .map(|(message, _)| message)
    }

    /// Return to the empty state.
    pub fn reset(&mut self) -> Result<(), Rejected> {
        if self.is_busy() {
            return Err(Rejected::Busy);
        }
        *self = Self::default();
        Ok(())
    }
}

/// Free-form prompt straight to the image model.
#[derive(Debug, Clone, Default)]
pub struct PlaygroundStudio {
    prompt: String,
    generation: OperationState<GeneratedImage>,
}

impl PlaygroundStudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn generation(&self) -> &OperationState<GeneratedImage> {
        &self.generation
    }

    pub fn generated_image(&self) -> Option<&GeneratedImage> {
        self.generation.ok()
    }

    pub fn is_busy(&self) -> bool {
        self.generation.is_in_flight()
    }

    pub fn can_generate(&self) -> bool {
        !is_blank(&self.prompt) && !self.generation.is_in_flight()
    }

    pub fn set_prompt(&mut self, text: impl Into<String>) {
        self.prompt = text.into();
        if self.generation.is_settled() {
            self.generation = OperationState::Idle;
        }
    }

    /// Start generation. Returns the prompt to send.
    pub fn begin_generation(&mut self) -> Result<String, Rejected> {
        if self.generation.is_in_flight() {
            return Err(Rejected::Busy);
        }
        if is_blank(&self.prompt) {
            return Err(Rejected::MissingPrompt);
        }

        self.generation = OperationState::InFlight;
        Ok(self.prompt.clone())
    }

    pub fn finish_generation(&mut self, result: Result<GeneratedImage, ClientError>) {
        if !self.generation.is_in_flight() {
            warn!("playground generation settled without being in flight; ignoring");
            return;
        }

        self.generation = match result {
            Ok(image) => {
                info!(mime = %image.mime_type, "playground image generated");
                OperationState::Settled(Ok(image))
            }
            Err(e) => {
                let message = client_error_message(&e, &PLAYGROUND_FAILURE);
                error!(error = ?e, %message, "playground generation failed");
                OperationState::Settled(Err(message))
            }
        };
    }

    pub fn visible_error(&self) -> Option<&str> {
        self.generation.err()
    }

    pub fn reset(&mut self) -> Result<(), Rejected> {
        if self.is_busy() {
            return Err(Rejected::Busy);
        }
        *self = Self::default();
        Ok(())
    }
}
