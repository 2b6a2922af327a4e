//! # likeness
//!
//! Client core for a two-studio portrait app backed by Google's generative
//! language API.
//!
//! - The **portrait studio** takes a photo, asks a Gemini vision model to
//!   describe the face, combines that description with a scene prompt, and
//!   asks Imagen to paint the result.
//! - The **playground studio** sends a free-form prompt straight to Imagen.
//!
//! ## Architecture
//!
//! 1. [`encoder`] turns a photo into an inline base64 [`UploadedImage`].
//! 2. [`StudioClient`] is the seam to the remote endpoints;
//!    [`GeminiClient`] implements it over a pluggable [`http::Transport`].
//! 3. [`studio`] holds each studio's state as plain data with
//!    `begin_*` / `finish_*` transitions.
//! 4. [`normalize`] reduces every failure to one displayable string.
//! 5. [`Session`] ties a client to both studios.
//!
//! Logging goes through `tracing`; install a subscriber in your binary to
//! see it.

pub mod api;
pub mod client;
pub mod encoder;
pub mod http;
pub mod model;
pub mod normalize;
pub mod options;
pub mod session;
pub mod studio;

pub use api::GeminiClient;
pub use client::{ClientError, StudioClient};
pub use encoder::{ImageError, MAX_UPLOAD_BYTES};
pub use model::{GeneratedImage, ImageMime, UploadedImage};
pub use options::{Config, ModelOptions, TransportOptions};
pub use session::Session;
pub use studio::{OperationState, PlaygroundStudio, PortraitStudio, Rejected};
