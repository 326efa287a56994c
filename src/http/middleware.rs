//! Serializer middleware.
//!
//! Runs the rest of the pipeline first, then hands the response to a
//! serializer together with the request headers captured on the way in.
//! Fatal serializer errors are logged and turned into a 500.

use std::sync::Arc;
use std::task::{Context, Poll};

use arc_swap::ArcSwap;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::http::request::RequestIdExt;
use crate::observability::metrics;
use crate::serializer::{SerializeError, Serializer, SerializerChain};

/// A serializer chain that can be replaced while requests are in flight.
pub type SharedChain = Arc<ArcSwap<SerializerChain>>;

/// Middleware for `axum::middleware::from_fn_with_state` running a single serializer.
pub async fn serializer_middleware(
    State(serializer): State<Arc<dyn Serializer>>,
    request: Request,
    next: Next,
) -> Response {
    let headers = request.headers().clone();
    let response = next.run(request).await;
    finish(serializer.process(&headers, response), &headers)
}

/// Middleware for `axum::middleware::from_fn_with_state` running the whole chain.
///
/// The chain is loaded once per request, so a reload never changes the
/// serializers halfway through a response.
pub async fn chain_middleware(
    State(chain): State<SharedChain>,
    request: Request,
    next: Next,
) -> Response {
    let chain = chain.load_full();
    let headers = request.headers().clone();
    let response = next.run(request).await;
    finish(chain.process(&headers, response), &headers)
}

fn finish(result: Result<Response, SerializeError>, request: &HeaderMap) -> Response {
    match result {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(
                request_id = %request.request_id(),
                kind = e.kind(),
                error = %e,
                "Response serialization failed"
            );
            metrics::record_error(e.kind());
            e.into_response()
        }
    }
}

/// Tower layer applying a serializer to every response of the wrapped service.
#[derive(Debug, Clone)]
pub struct SerializerLayer {
    serializer: Arc<dyn Serializer>,
}

impl SerializerLayer {
    pub fn new<S: Serializer + 'static>(serializer: S) -> Self {
        Self {
            serializer: Arc::new(serializer),
        }
    }

    pub fn from_arc(serializer: Arc<dyn Serializer>) -> Self {
        Self { serializer }
    }
}

impl<S> Layer<S> for SerializerLayer {
    type Service = SerializerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SerializerService {
            inner,
            serializer: self.serializer.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SerializerService<S> {
    inner: S,
    serializer: Arc<dyn Serializer>,
}

impl<S, B> Service<axum::http::Request<B>> for SerializerService<S>
where
    S: Service<axum::http::Request<B>, Response = Response>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: axum::http::Request<B>) -> Self::Future {
        let headers = request.headers().clone();
        let serializer = self.serializer.clone();
        let future = self.inner.call(request);

        Box::pin(async move {
            let response = future.await?;
            Ok(finish(serializer.process(&headers, response), &headers))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::body::Payload;
    use crate::serializer::Jsonp;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, HeaderValue, StatusCode};
    use serde_json::json;
    use std::convert::Infallible;
    use tower::{service_fn, ServiceExt};

    #[tokio::test]
    async fn test_layer_wraps_inner_service() {
        let inner = service_fn(|_req: axum::http::Request<Body>| async {
            Ok::<_, Infallible>(
                Payload::new(json!({"error": "Not Found"}))
                    .with_status(StatusCode::NOT_FOUND)
                    .with_content_type(HeaderValue::from_static("application/javascript"))
                    .into_response(),
            )
        });
        let service = SerializerLayer::new(Jsonp::new()).layer(inner);

        let request = axum::http::Request::builder()
            .header("X-Callback", "handle")
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"handle({"error":"Not Found","HttpStatus":404})"#);
    }

    #[tokio::test]
    async fn test_layer_maps_error_to_500() {
        let inner = service_fn(|_req: axum::http::Request<Body>| async {
            Ok::<_, Infallible>(
                (
                    StatusCode::BAD_GATEWAY,
                    [(header::CONTENT_TYPE, "application/javascript")],
                    "upstream failed",
                )
                    .into_response(),
            )
        });
        let service = SerializerLayer::new(Jsonp::new()).layer(inner);

        let request = axum::http::Request::builder().body(Body::empty()).unwrap();
        let response = service.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_stacked_layers_encode_once() {
        let inner = service_fn(|_req: axum::http::Request<Body>| async {
            Ok::<_, Infallible>(
                Payload::new(json!({"error": "Not Found"}))
                    .with_status(StatusCode::NOT_FOUND)
                    .with_content_type(HeaderValue::from_static("application/javascript"))
                    .into_response(),
            )
        });
        let service = SerializerLayer::new(Jsonp::new())
            .layer(SerializerLayer::new(Jsonp::new()).layer(inner));

        let request = axum::http::Request::builder()
            .header("X-Callback", "handle")
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"handle({"error":"Not Found","HttpStatus":404})"#);
    }
}
