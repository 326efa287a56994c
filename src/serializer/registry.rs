//! Ordered chain of response serializers.
//!
//! # Design Decisions
//! - First serializer whose content type matches wins
//! - The chain itself is immutable; reloads build a new chain and swap it in

use std::sync::Arc;

use axum::{http::HeaderMap, response::Response};

use crate::config::schema::SerializerConfig;
use crate::serializer::{Json, Jsonp, SerializeError, Serializer};

#[derive(Debug, Clone, Default)]
pub struct SerializerChain {
    serializers: Vec<Arc<dyn Serializer>>,
}

impl SerializerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the `[json, jsonp]` chain from configuration.
    pub fn from_config(config: &SerializerConfig) -> Result<Self, SerializeError> {
        Ok(Self::new()
            .register(Json::from_config(&config.json))
            .register(Jsonp::from_config(&config.jsonp)?))
    }

    /// Append a serializer to the end of the chain.
    pub fn register<S: Serializer + 'static>(mut self, serializer: S) -> Self {
        self.serializers.push(Arc::new(serializer));
        self
    }

    pub fn serializers(&self) -> &[Arc<dyn Serializer>] {
        &self.serializers
    }

    /// Every content type some serializer in the chain can produce, in
    /// registration order, without duplicates.
    pub fn accept_types(&self) -> Vec<String> {
        let mut types: Vec<String> = Vec::new();
        for mime in self.serializers.iter().flat_map(|s| s.mime_types()) {
            if !types.iter().any(|t| t.eq_ignore_ascii_case(mime)) {
                types.push(mime.clone());
            }
        }
        types
    }

    /// Run the first serializer that accepts the response.
    pub fn process(&self, request: &HeaderMap, response: Response) -> Result<Response, SerializeError> {
        match self.serializers.iter().find(|s| s.accepts(&response)) {
            Some(serializer) => serializer.process(request, response),
            None => Ok(response),
        }
    }
}
