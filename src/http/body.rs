//! Structured response bodies.
//!
//! Handlers return a [`Payload`], which leaves the raw body empty and stores
//! the structured value as an [`UnserializedBody`] response extension. A
//! serializer further down the response path turns it into text.
//!
//! # Design Decisions
//! - Whether a response can supply a structured body is a typed, optional
//!   property: `response.unserialized_body()` returns `Option`
//! - Encoding to `serde_json::Value` is deferred until a serializer needs it,
//!   so encoding failures surface inside the serializer stage
//! - Floats must be finite; NaN or infinity fails the encode

use std::fmt;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::serializer::finite::Finite;

type Encoder = dyn Fn() -> Result<Value, serde_json::Error> + Send + Sync;

/// The pre-serialization representation of a response payload.
#[derive(Clone)]
pub struct UnserializedBody {
    encode: Arc<Encoder>,
}

impl UnserializedBody {
    /// Store any serializable value.
    pub fn new<T>(body: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Self {
            encode: Arc::new(move || serde_json::to_value(Finite(&body))),
        }
    }

    /// Store an already-built JSON value.
    pub fn from_value(value: Value) -> Self {
        Self::new(value)
    }

    /// Encode the body into a JSON value.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        (self.encode)()
    }
}

impl fmt::Debug for UnserializedBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnserializedBody").finish_non_exhaustive()
    }
}

/// Builder-style accessors over a response, each returning the new version.
pub trait ResponseBodyExt: Sized {
    fn unserialized_body(&self) -> Option<&UnserializedBody>;
    fn with_unserialized_body(self, body: UnserializedBody) -> Self;
    fn without_unserialized_body(self) -> Self;
    fn with_status(self, status: StatusCode) -> Self;
    fn with_body(self, body: Body) -> Self;
}

impl ResponseBodyExt for Response {
    fn unserialized_body(&self) -> Option<&UnserializedBody> {
        self.extensions().get::<UnserializedBody>()
    }

    fn with_unserialized_body(mut self, body: UnserializedBody) -> Self {
        self.extensions_mut().insert(body);
        self
    }

    fn without_unserialized_body(mut self) -> Self {
        self.extensions_mut().remove::<UnserializedBody>();
        self
    }

    fn with_status(mut self, status: StatusCode) -> Self {
        *self.status_mut() = status;
        self
    }

    fn with_body(self, body: Body) -> Self {
        let (mut parts, _) = self.into_parts();
        // The old length no longer describes the new body.
        parts.headers.remove(header::CONTENT_LENGTH);
        Response::from_parts(parts, body)
    }
}

/// A structured handler result awaiting serialization.
#[derive(Debug, Clone)]
pub struct Payload {
    status: StatusCode,
    content_type: HeaderValue,
    body: UnserializedBody,
}

impl Payload {
    pub fn new<T>(body: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Self {
            status: StatusCode::OK,
            content_type: HeaderValue::from_static("application/json"),
            body: UnserializedBody::new(body),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Set the negotiated content type. Serializers gate on this value.
    pub fn with_content_type(mut self, content_type: HeaderValue) -> Self {
        self.content_type = content_type;
        self
    }
}

impl IntoResponse for Payload {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = self.status;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, self.content_type);
        response.with_unserialized_body(self.body)
    }
}
