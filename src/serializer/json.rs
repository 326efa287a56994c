//! Plain JSON response serializer.

use axum::{http::HeaderMap, response::Response};

use crate::config::schema::JsonConfig;
use crate::observability::metrics;
use crate::serializer::{encode_response, to_json, SerializeError, Serializer};

pub const DEFAULT_MIME_TYPES: &[&str] = &["application/json"];

/// Serializes structured response bodies to JSON. Status codes are left alone.
#[derive(Debug, Clone)]
pub struct Json {
    mime_types: Vec<String>,
}

impl Json {
    pub fn new() -> Self {
        Self {
            mime_types: DEFAULT_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn with_mime_types(mime_types: Vec<String>) -> Self {
        Self { mime_types }
    }

    pub fn from_config(config: &JsonConfig) -> Self {
        Self::with_mime_types(config.mime_types.clone())
    }
}

impl Default for Json {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer for Json {
    fn name(&self) -> &'static str {
        "json"
    }

    fn mime_types(&self) -> &[String] {
        &self.mime_types
    }

    fn process(&self, _request: &HeaderMap, response: Response) -> Result<Response, SerializeError> {
        if !self.accepts(&response) {
            return Ok(response);
        }

        let response = encode_response(self.name(), response, to_json)?;
        metrics::record_response(self.name(), false);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::body::Payload;
    use axum::body::to_bytes;
    use axum::http::{HeaderValue, StatusCode};
    use axum::response::IntoResponse;
    use serde_json::json;

    #[tokio::test]
    async fn test_json_keeps_status() {
        let response = Payload::new(json!({"error": "Not Found"}))
            .with_status(StatusCode::NOT_FOUND)
            .into_response();

        let response = Json::new().process(&HeaderMap::new(), response).unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"{"error":"Not Found"}"#);
    }

    #[test]
    fn test_json_ignores_javascript() {
        let response = Payload::new(json!({"key": "value"}))
            .with_status(StatusCode::NOT_FOUND)
            .with_content_type(HeaderValue::from_static("application/javascript"))
            .into_response();

        let response = Json::new().process(&HeaderMap::new(), response).unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
