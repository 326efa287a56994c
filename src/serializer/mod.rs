//! Response serialization subsystem.
//!
//! # Data Flow
//! ```text
//! handler → Payload (UnserializedBody extension, negotiated Content-Type)
//!     → middleware runs next, then Serializer::process
//!     → accepts()? (content-type gating)
//!     → jsonp.rs / json.rs encode the structured body
//!     → response with textual body
//! ```
//!
//! # Design Decisions
//! - Serializers are immutable and shared via `Arc`; all per-request state
//!   (the callback name in particular) lives on the stack of `process`
//! - A non-matching content type is a pass-through, never an error
//! - Encoding failures are terminal; no partial body is emitted
//! - NaN and infinite floats are encoding failures, not `null`

pub mod callback;
pub(crate) mod finite;
pub mod json;
pub mod jsonp;
pub mod registry;

use std::fmt::Debug;

use axum::{
    body::Body,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use thiserror::Error;

use crate::http::body::ResponseBodyExt;
use crate::observability::metrics;

pub use callback::{is_valid_callback, Callback};
pub use json::Json;
pub use jsonp::Jsonp;
pub use registry::SerializerChain;

/// Errors raised while serializing a response.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// An error response carried no structured body to re-encode.
    #[error("serializer could not retrieve unserialized body (status {status})")]
    BodyUnavailable { status: u16 },

    /// The structured body could not be encoded as JSON.
    #[error("could not serialize content: {0}")]
    SerializationFailed(#[source] serde_json::Error),

    /// The configured callback header is not a legal header name.
    #[error("invalid callback header name: {0}")]
    InvalidHeaderName(String),
}

impl SerializeError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SerializeError::BodyUnavailable { .. } => "body_unavailable",
            SerializeError::SerializationFailed(_) => "serialization_failed",
            SerializeError::InvalidHeaderName(_) => "invalid_header_name",
        }
    }
}

impl IntoResponse for SerializeError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, "Could not serialize response").into_response()
    }
}

/// Capability contract shared by all response serializers.
pub trait Serializer: Send + Sync + Debug {
    /// Name used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// Content types this serializer produces.
    fn mime_types(&self) -> &[String];

    /// Returns true if the response's content type is one this serializer handles.
    fn accepts(&self, response: &Response) -> bool {
        content_type_of(response)
            .map(|ct| matches_mime(ct, self.mime_types()))
            .unwrap_or(false)
    }

    /// Serialize `response` for the request carrying `request` headers.
    fn process(&self, request: &HeaderMap, response: Response) -> Result<Response, SerializeError>;
}

/// The raw `Content-Type` header of a response, if readable.
pub fn content_type_of(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
}

/// Compare the media type of `content_type` (parameters stripped) against
/// `mime_types`, ignoring ASCII case.
pub fn matches_mime(content_type: &str, mime_types: &[String]) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim();

    mime_types
        .iter()
        .any(|m| m.eq_ignore_ascii_case(media_type))
}

/// Replace the body of `response` with the encoded form of its unserialized body.
///
/// Responses without an unserialized body are returned unchanged.
pub fn encode_response<F>(
    serializer: &'static str,
    response: Response,
    encode: F,
) -> Result<Response, SerializeError>
where
    F: FnOnce(&Value) -> Result<String, SerializeError>,
{
    let value = match response.unserialized_body() {
        Some(body) => body.to_value().map_err(SerializeError::SerializationFailed)?,
        None => {
            tracing::debug!(serializer, "No unserialized body, passing response through");
            metrics::record_passthrough(serializer);
            return Ok(response);
        }
    };

    let text = encode(&value)?;
    Ok(response
        .with_body(Body::from(text))
        .without_unserialized_body())
}

/// Serialize a JSON value to compact text.
pub(crate) fn to_json(value: &Value) -> Result<String, SerializeError> {
    serde_json::to_string(value).map_err(SerializeError::SerializationFailed)
}
