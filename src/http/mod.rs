//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → handlers.rs (produce Payload with negotiated Content-Type)
//!     → body.rs (UnserializedBody stored on the response)
//!     → middleware.rs (serializer chain rewrites the body)
//!     → Send to client
//! ```

pub mod body;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use body::{Payload, ResponseBodyExt, UnserializedBody};
pub use middleware::{chain_middleware, serializer_middleware, SerializerLayer, SharedChain};
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::HttpServer;
