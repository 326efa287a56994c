//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderValue, Request, StatusCode},
    middleware,
    response::Response,
    routing::get,
    Router,
};
use http_body_util::BodyExt;
use serde::{ser::Error as _, Serialize};
use serde_json::{json, Value};

use jsonp_middleware::http::{serializer_middleware, Payload};
use jsonp_middleware::Serializer;

/// A string of raw bytes that only encodes when it is valid UTF-8.
pub struct RawText(pub &'static [u8]);

impl Serialize for RawText {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match std::str::from_utf8(self.0) {
            Ok(text) => serializer.serialize_str(text),
            Err(e) => Err(S::Error::custom(e)),
        }
    }
}

pub fn javascript() -> HeaderValue {
    HeaderValue::from_static("application/javascript")
}

fn payload(body: Value, status: StatusCode, content_type: HeaderValue) -> Payload {
    Payload::new(body)
        .with_status(status)
        .with_content_type(content_type)
}

/// Router with fixed handlers wrapped by `serializer`.
pub fn app(serializer: Arc<dyn Serializer>) -> Router {
    Router::new()
        .route(
            "/ok",
            get(|| async { payload(json!({"key": "value"}), StatusCode::OK, javascript()) }),
        )
        .route(
            "/error",
            get(|| async {
                payload(
                    json!({"error": "Internal Server Error"}),
                    StatusCode::INTERNAL_SERVER_ERROR,
                    javascript(),
                )
            }),
        )
        .route(
            "/xml",
            get(|| async {
                payload(
                    json!({"username": "jsonp"}),
                    StatusCode::NOT_FOUND,
                    HeaderValue::from_static("application/xml"),
                )
            }),
        )
        .route(
            "/raw-error",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [("content-type", "application/javascript")],
                    "not structured",
                )
            }),
        )
        .route(
            "/malformed",
            get(|| async {
                Payload::new(BTreeMap::from([("key", RawText(b"\xB1\x31"))]))
                    .with_content_type(javascript())
            }),
        )
        .route(
            "/not-finite",
            get(|| async {
                Payload::new(BTreeMap::from([("ratio", f64::NAN)])).with_content_type(javascript())
            }),
        )
        .layer(middleware::from_fn_with_state(serializer, serializer_middleware))
}

pub fn get_request(uri: &str, callback: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cb) = callback {
        builder = builder.header("X-Callback", cb);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
