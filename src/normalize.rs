//! Reduces arbitrary failure values to a single displayable message.
//!
//! Remote error bodies are inconsistent: the message may sit under
//! `error.message`, at the top level, or the body may be a bare string.
//! Whatever comes back, callers only ever get a non-empty `String`.

use serde_json::Value;
use tracing::warn;

use crate::client::ClientError;

/// Fallback used when the caller's own default is blank.
pub const UNKNOWN_ERROR: &str = "An unknown error occurred";

/// Key carried by serialized UI elements. Such values are markup, not messages.
pub const ELEMENT_MARKER: &str = "$$typeof";

/// Returns `true` if `value` is a serialized UI element rather than data.
pub fn is_element(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.contains_key(ELEMENT_MARKER))
}

fn non_blank(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.trim().is_empty())
}

fn fallback(default_message: &str) -> String {
    if default_message.trim().is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        default_message.to_string()
    }
}

/// Extract a human-readable message from `value`, or return `default_message`.
pub fn error_message(value: &Value, default_message: &str) -> String {
    if is_element(value) {
        warn!(error_object = %value, "received an element-like value as an error; using default message");
        return fallback(default_message);
    }

    if let Some(nested) = value.get("error").and_then(|e| e.get("message")) {
        if let Some(message) = non_blank(nested) {
            return message.to_string();
        }
        if is_element(nested) {
            warn!(error_object = %nested, "element-like value in error.message; using default message");
            return fallback(default_message);
        }
    }

    if let Some(top) = value.get("message") {
        if let Some(message) = non_blank(top) {
            return message.to_string();
        }
        if is_element(top) {
            warn!(error_object = %top, "element-like value in message; using default message");
            return fallback(default_message);
        }
    }

    if let Some(message) = non_blank(value) {
        return message.to_string();
    }

    warn!(error_object = %value, "unrecognized error format or empty message; using default message");
    fallback(default_message)
}

/// Wording used when an operation fails.
#[derive(Debug, Clone, Copy)]
pub struct FailureText {
    /// Shown when the remote body carries no usable message.
    pub default_message: &'static str,
    /// Prefix for transport-level failures, e.g. "Error analyzing face".
    pub transport_prefix: &'static str,
}

/// Render a client failure for display.
pub fn client_error_message(err: &ClientError, text: &FailureText) -> String {
    match err {
        ClientError::Remote { body, .. } | ClientError::Malformed { body } => {
            error_message(body, text.default_message)
        }
        ClientError::CredentialMissing => err.to_string(),
        ClientError::Http(_)
        | ClientError::Parse(_)
        | ClientError::UnexpectedBody { .. }
        | ClientError::Config(_) => {
            let detail = error_message(&Value::String(err.to_string()), UNKNOWN_ERROR);
            format!("{}: {}. Check the logs for details.", text.transport_prefix, detail)
        }
    }
}
