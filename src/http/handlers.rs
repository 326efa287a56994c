//! Demo handlers returning structured payloads.
//!
//! Content type selection here is demo wiring: the first `Accept` entry the
//! serializer chain can produce wins, falling back to `application/json`.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::http::body::Payload;
use crate::http::middleware::SharedChain;

#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub id: u32,
    pub name: &'static str,
}

const ITEMS: &[Item] = &[
    Item { id: 1, name: "apple" },
    Item { id: 2, name: "pear" },
];

/// Pick the response content type from the request's `Accept` header.
pub fn pick_content_type(headers: &HeaderMap, accept_types: &[String]) -> HeaderValue {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    accept
        .split(',')
        .map(|entry| entry.split(';').next().unwrap_or_default().trim())
        .find_map(|wanted| {
            accept_types
                .iter()
                .find(|t| t.eq_ignore_ascii_case(wanted))
                .and_then(|t| HeaderValue::from_str(t).ok())
        })
        .unwrap_or_else(|| HeaderValue::from_static("application/json"))
}

fn negotiated(chain: &SharedChain, headers: &HeaderMap, payload: Payload) -> Payload {
    let accept_types = chain.load().accept_types();
    payload.with_content_type(pick_content_type(headers, &accept_types))
}

pub async fn health(State(chain): State<SharedChain>, headers: HeaderMap) -> Payload {
    negotiated(&chain, &headers, Payload::new(json!({"status": "ok"})))
}

pub async fn get_item(
    State(chain): State<SharedChain>,
    Path(id): Path<u32>,
    headers: HeaderMap,
) -> Payload {
    let payload = match ITEMS.iter().find(|item| item.id == id) {
        Some(item) => Payload::new(item.clone()),
        None => Payload::new(json!({"error": "Not Found"})).with_status(StatusCode::NOT_FOUND),
    };
    negotiated(&chain, &headers, payload)
}

pub async fn fail(State(chain): State<SharedChain>, headers: HeaderMap) -> Payload {
    let payload = Payload::new(json!({"error": "Internal Server Error"}))
        .with_status(StatusCode::INTERNAL_SERVER_ERROR);
    negotiated(&chain, &headers, payload)
}

/// A response that already carries its final bytes.
pub async fn raw(State(chain): State<SharedChain>, headers: HeaderMap) -> Response {
    let accept_types = chain.load().accept_types();
    let content_type = pick_content_type(&headers, &accept_types);
    ([(header::CONTENT_TYPE, content_type)], "raw payload").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types() -> Vec<String> {
        vec![
            "application/json".into(),
            "application/javascript".into(),
            "text/javascript".into(),
        ]
    }

    #[test]
    fn test_pick_content_type() {
        let mut headers = HeaderMap::new();
        assert_eq!(pick_content_type(&headers, &types()), "application/json");

        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html, text/javascript;q=0.9, */*"),
        );
        assert_eq!(pick_content_type(&headers, &types()), "text/javascript");

        headers.insert(header::ACCEPT, HeaderValue::from_static("application/xml"));
        assert_eq!(pick_content_type(&headers, &types()), "application/json");
    }
}
