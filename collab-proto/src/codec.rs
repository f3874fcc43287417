//! Text encoding for chat WebSocket frames.
//!
//! Frames travel as JSON text. Decoding is lenient in one direction only: a
//! server frame whose `type` is missing or unknown is read as a plain chat
//! message when it has that shape, matching how the web client treats them.

use serde_json::Value;

use crate::frame::{ClientFrame, IncomingMessage, ServerFrame};

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text is not valid JSON.
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    /// The JSON is valid but matches no known frame shape.
    #[error("unrecognized frame: {0}")]
    Unrecognized(String),
}

/// Encodes a server frame as JSON text.
///
/// # Errors
///
/// Returns `CodecError::Json` if serialization fails.
pub fn encode_server(frame: &ServerFrame) -> Result<String, CodecError> {
    Ok(serde_json::to_string(frame)?)
}

/// Decodes a server frame, falling back to the plain message shape.
///
/// # Errors
///
/// Returns `CodecError::Json` for invalid JSON and
/// `CodecError::Unrecognized` when neither a tagged frame nor a plain
/// message fits.
pub fn decode_server(text: &str) -> Result<ServerFrame, CodecError> {
    let value: Value = serde_json::from_str(text)?;
    let tag = value.get("type").and_then(Value::as_str).map(str::to_owned);

    if let Some(tag) = tag.as_deref()
        && ServerFrame::TAGS.contains(&tag)
    {
        return serde_json::from_value(value)
            .map_err(|e| CodecError::Unrecognized(format!("bad {tag} frame: {e}")));
    }

    serde_json::from_value::<IncomingMessage>(value)
        .map(ServerFrame::NewMessage)
        .map_err(|e| CodecError::Unrecognized(format!("type {tag:?}: {e}")))
}

/// Encodes a client frame as JSON text.
///
/// # Errors
///
/// Returns `CodecError::Json` if serialization fails.
pub fn encode_client(frame: &ClientFrame) -> Result<String, CodecError> {
    Ok(serde_json::to_string(frame)?)
}

/// Decodes a client frame.
///
/// # Errors
///
/// Returns `CodecError::Json` for invalid JSON and
/// `CodecError::Unrecognized` when the object is neither a control frame nor
/// a plain message.
pub fn decode_client(text: &str) -> Result<ClientFrame, CodecError> {
    let value: Value = serde_json::from_str(text)?;
    serde_json::from_value(value).map_err(|e| CodecError::Unrecognized(e.to_string()))
}
