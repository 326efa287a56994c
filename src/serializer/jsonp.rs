//! JSONP response serializer.
//!
//! # Responsibilities
//! - Gate on the negotiated content type (`application/javascript`, `text/javascript`)
//! - Resolve the callback name from the request header
//! - Fold error statuses into the body and answer with 200, since script-tag
//!   clients cannot observe HTTP status codes
//! - Encode the body as JSON, wrapped in `callback(...)` when a valid callback exists

use axum::{
    http::{HeaderMap, HeaderName, StatusCode},
    response::Response,
};
use serde_json::Value;

use crate::config::schema::JsonpConfig;
use crate::http::body::{ResponseBodyExt, UnserializedBody};
use crate::observability::metrics;
use crate::serializer::callback::Callback;
use crate::serializer::{encode_response, to_json, SerializeError, Serializer};

/// Body key holding the original status of a rewritten error response.
pub const HTTP_STATUS_KEY: &str = "HttpStatus";

pub const DEFAULT_CALLBACK_HEADER: &str = "X-Callback";

pub const DEFAULT_MIME_TYPES: &[&str] = &["application/javascript", "text/javascript"];

/// Serializes structured response bodies to JSONP.
#[derive(Debug, Clone)]
pub struct Jsonp {
    callback_header: HeaderName,
    mime_types: Vec<String>,
}

impl Jsonp {
    /// Create a serializer reading the callback from `X-Callback`.
    pub fn new() -> Self {
        Self {
            callback_header: HeaderName::from_static("x-callback"),
            mime_types: default_mime_types(),
        }
    }

    /// Create a serializer with a custom callback header and, optionally,
    /// a custom mime-type allow-list.
    pub fn with_config(
        callback_header: &str,
        mime_types: Option<Vec<String>>,
    ) -> Result<Self, SerializeError> {
        let callback_header = HeaderName::try_from(callback_header)
            .map_err(|_| SerializeError::InvalidHeaderName(callback_header.to_string()))?;

        Ok(Self {
            callback_header,
            mime_types: mime_types.unwrap_or_else(default_mime_types),
        })
    }

    pub fn from_config(config: &JsonpConfig) -> Result<Self, SerializeError> {
        Self::with_config(&config.callback_header, Some(config.mime_types.clone()))
    }

    pub fn callback_header(&self) -> &HeaderName {
        &self.callback_header
    }

    /// Resolve the callback for one request. `None` means plain JSON output.
    pub fn resolve_callback(&self, request: &HeaderMap) -> Option<Callback> {
        Callback::from_headers(request, &self.callback_header)
    }

    /// Encode `body` as JSON and wrap it in `callback` if one is given.
    pub fn serialize_with(
        &self,
        body: &Value,
        callback: Option<&Callback>,
    ) -> Result<String, SerializeError> {
        let json = to_json(body)?;
        Ok(match callback {
            Some(cb) => cb.wrap(&json),
            None => json,
        })
    }

    /// Rewrite a non-200 response: record the original status in the body
    /// and answer with 200.
    fn normalize_error(&self, response: Response) -> Result<Response, SerializeError> {
        let status = response.status();
        let mut body = response
            .unserialized_body()
            .ok_or(SerializeError::BodyUnavailable {
                status: status.as_u16(),
            })?
            .to_value()
            .map_err(SerializeError::SerializationFailed)?;

        match body.as_object_mut() {
            Some(map) if !map.is_empty() => {
                map.entry(HTTP_STATUS_KEY)
                    .or_insert_with(|| Value::from(status.as_u16()));
            }
            _ => {
                tracing::debug!(status = status.as_u16(), "Body is empty or not an object, status not recorded");
            }
        }

        tracing::debug!(status = status.as_u16(), "Rewriting error status to 200 for JSONP");
        metrics::record_status_rewrite(status.as_u16());

        Ok(response
            .with_status(StatusCode::OK)
            .with_unserialized_body(UnserializedBody::from_value(body)))
    }
}

impl Default for Jsonp {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer for Jsonp {
    fn name(&self) -> &'static str {
        "jsonp"
    }

    fn mime_types(&self) -> &[String] {
        &self.mime_types
    }

    fn process(&self, request: &HeaderMap, response: Response) -> Result<Response, SerializeError> {
        if !self.accepts(&response) {
            return Ok(response);
        }

        let callback = self.resolve_callback(request);

        let response = if response.status() != StatusCode::OK {
            self.normalize_error(response)?
        } else {
            response
        };

        let response = encode_response(self.name(), response, |body| {
            self.serialize_with(body, callback.as_ref())
        })?;

        metrics::record_response(self.name(), callback.is_some());
        tracing::debug!(
            callback = callback.as_ref().map(Callback::as_str),
            "Serialized JSONP response"
        );
        Ok(response)
    }
}

fn default_mime_types() -> Vec<String> {
    DEFAULT_MIME_TYPES.iter().map(|m| m.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::body::Payload;
    use axum::body::to_bytes;
    use axum::http::{header, HeaderValue};
    use axum::response::IntoResponse;
    use serde_json::json;
    use std::collections::HashMap;

    fn request_with_callback(cb: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-callback", HeaderValue::from_static(cb));
        headers
    }

    fn jsonp_payload(body: Value, status: StatusCode) -> Response {
        Payload::new(body)
            .with_status(status)
            .with_content_type(HeaderValue::from_static("application/javascript"))
            .into_response()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_serialize_without_callback() {
        let serializer = Jsonp::new();
        let body = json!({"key": "value", "another key": "second value"});
        assert_eq!(
            serializer.serialize_with(&body, None).unwrap(),
            r#"{"key":"value","another key":"second value"}"#
        );
    }

    #[test]
    fn test_serialize_with_callback() {
        let serializer = Jsonp::new();
        let cb = Callback::parse("someFunction").unwrap();
        let body = json!({"key": "value", "next": "another value"});
        assert_eq!(
            serializer.serialize_with(&body, Some(&cb)).unwrap(),
            r#"someFunction({"key":"value","next":"another value"})"#
        );
    }

    #[test]
    fn test_with_config() {
        let serializer = Jsonp::with_config("X-Jsonp-Fn", None).unwrap();
        assert_eq!(serializer.callback_header().as_str(), "x-jsonp-fn");
        assert_eq!(serializer.mime_types(), default_mime_types().as_slice());

        let serializer =
            Jsonp::with_config("X-Callback", Some(vec!["application/x-javascript".into()])).unwrap();
        assert_eq!(serializer.mime_types(), ["application/x-javascript".to_string()]);

        let err = Jsonp::with_config("bad header", None).unwrap_err();
        assert!(matches!(err, SerializeError::InvalidHeaderName(_)));
    }

    #[test]
    fn test_resolve_callback_uses_configured_header() {
        let serializer = Jsonp::with_config("X-Jsonp-Fn", None).unwrap();
        assert_eq!(serializer.resolve_callback(&request_with_callback("cb")), None);

        let mut headers = HeaderMap::new();
        headers.insert("x-jsonp-fn", HeaderValue::from_static("cb"));
        assert_eq!(serializer.resolve_callback(&headers).unwrap().as_str(), "cb");
    }

    #[tokio::test]
    async fn test_error_status_folded_into_body() {
        let serializer = Jsonp::new();
        let response = jsonp_payload(
            json!({"error": "Internal Server Error"}),
            StatusCode::INTERNAL_SERVER_ERROR,
        );

        let response = serializer
            .process(&request_with_callback("someFunction"), response)
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_text(response).await,
            r#"someFunction({"error":"Internal Server Error","HttpStatus":500})"#
        );
    }

    #[tokio::test]
    async fn test_existing_http_status_not_overwritten() {
        let serializer = Jsonp::new();
        let response = jsonp_payload(
            json!({"error": "Gone", "HttpStatus": 410}),
            StatusCode::NOT_FOUND,
        );

        let response = serializer.process(&HeaderMap::new(), response).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, r#"{"error":"Gone","HttpStatus":410}"#);
    }

    #[tokio::test]
    async fn test_empty_error_body_not_augmented() {
        let serializer = Jsonp::new();

        let response = jsonp_payload(json!({}), StatusCode::BAD_REQUEST);
        let response = serializer.process(&request_with_callback("cb"), response).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "cb({})");

        let response = jsonp_payload(json!(["a", "b"]), StatusCode::BAD_REQUEST);
        let response = serializer.process(&HeaderMap::new(), response).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, r#"["a","b"]"#);
    }

    #[tokio::test]
    async fn test_success_body_untouched() {
        let serializer = Jsonp::new();
        let response = jsonp_payload(json!({"key": "value"}), StatusCode::OK);

        let response = serializer.process(&HeaderMap::new(), response).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/javascript"
        );
        assert_eq!(body_text(response).await, r#"{"key":"value"}"#);
    }

    #[tokio::test]
    async fn test_raw_success_response_passes_through() {
        let serializer = Jsonp::new();
        let response = (
            [(header::CONTENT_TYPE, "text/javascript")],
            "already serialized",
        )
            .into_response();

        let response = serializer.process(&HeaderMap::new(), response).unwrap();
        assert_eq!(body_text(response).await, "already serialized");
    }

    #[test]
    fn test_raw_error_response_is_body_unavailable() {
        let serializer = Jsonp::new();
        let response = (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "application/javascript")],
            "boom",
        )
            .into_response();

        let err = serializer
            .process(&request_with_callback("someFunction"), response)
            .unwrap_err();
        assert!(matches!(err, SerializeError::BodyUnavailable { status: 500 }));
    }

    #[tokio::test]
    async fn test_other_content_type_untouched() {
        let serializer = Jsonp::new();
        let response = Payload::new(json!({"username": "jsonp"}))
            .with_status(StatusCode::NOT_FOUND)
            .with_content_type(HeaderValue::from_static("application/xml"))
            .into_response();

        let response = serializer.process(&request_with_callback("cb"), response).unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.unserialized_body().is_some());
        assert_eq!(body_text(response).await, "");
    }

    #[test]
    fn test_non_finite_body_is_serialization_failure() {
        let serializer = Jsonp::new();
        let response = Payload::new(HashMap::from([("ratio", f64::NAN)]))
            .with_content_type(HeaderValue::from_static("text/javascript"))
            .into_response();

        let err = serializer
            .process(&request_with_callback("someFunction"), response)
            .unwrap_err();
        assert!(matches!(err, SerializeError::SerializationFailed(_)));
    }

    #[tokio::test]
    async fn test_serialized_response_not_encoded_twice() {
        let serializer = Jsonp::new();
        let request = request_with_callback("cb");
        let response = jsonp_payload(json!({"key": "value"}), StatusCode::OK);

        let response = serializer.process(&request, response).unwrap();
        assert!(response.unserialized_body().is_none());

        let response = serializer.process(&request, response).unwrap();
        assert_eq!(body_text(response).await, r#"cb({"key":"value"})"#);
    }

    #[test]
    fn test_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Jsonp>();
    }
}
