//! Wire formats and the client for Google's generative language API.
//!
//! `gemini` covers `:generateContent` (face descriptions) and owns the
//! [`GeminiClient`]; `imagen` covers `:predict` (image generation).

pub mod gemini;
pub mod imagen;

pub use gemini::GeminiClient;
