//! JSONP response serialization middleware for axum/tower pipelines.
//!
//! Handlers return a [`Payload`](http::Payload): a structured body plus the
//! negotiated content type. After the handler runs, a [`Serializer`] turns
//! the structured body into text. The [`Jsonp`] serializer wraps the JSON in
//! the callback named by the `X-Callback` request header and folds error
//! statuses into the body, since script-tag clients never see status codes.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod serializer;

pub use config::schema::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use serializer::{
    is_valid_callback, Callback, Json, Jsonp, SerializeError, Serializer, SerializerChain,
};
