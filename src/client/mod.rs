//! Native Query Client
//!
//! Async HTTP client for the engine's native query endpoint, plus result
//! flattening and TSV export. See [`NativeClient`] for usage.

mod error;
mod export;
mod native;

pub use error::{ClientError, ClientResult};
pub use export::{export_tsv, to_rows};
pub use native::NativeClient;

/// Best-effort extraction of a server error message from a response body.
///
/// Engine errors usually arrive as JSON with an `error` tag and an
/// optional longer `errorMessage`; anything else falls back to the raw
/// body text.
pub(crate) fn extract_error_message(body: &str) -> String {
    if let Ok(doc) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = doc.get("errorMessage").and_then(|v| v.as_str()) {
            return message.to_string();
        }
        if let Some(message) = doc.get("error").and_then(|v| v.as_str()) {
            return message.to_string();
        }
    }
    body.trim().to_string()
}
