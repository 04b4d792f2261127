//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding or encoding messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message is not a JSON object")]
    NotAnObject,

    #[error("Message has no event name")]
    MissingEvent,

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Malformed payload for event {0}")]
    MalformedPayload(&'static str),
}
