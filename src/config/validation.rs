//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, header names and mime types
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let jsonp = &config.serializer.jsonp;
    if HeaderName::try_from(jsonp.callback_header.as_str()).is_err() {
        errors.push(ValidationError::new(
            "serializer.jsonp.callback_header",
            format!("'{}' is not a valid header name", jsonp.callback_header),
        ));
    }

    check_mime_types("serializer.jsonp.mime_types", &jsonp.mime_types, &mut errors);
    check_mime_types(
        "serializer.json.mime_types",
        &config.serializer.json.mime_types,
        &mut errors,
    );

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be greater than zero",
        ));
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_mime_types(field: &str, mime_types: &[String], errors: &mut Vec<ValidationError>) {
    if mime_types.is_empty() {
        errors.push(ValidationError::new(field, "must list at least one mime type"));
    }

    for mime in mime_types {
        let well_formed = match mime.split_once('/') {
            Some((ty, sub)) => {
                !ty.is_empty() && !sub.is_empty() && !mime.contains(';') && !mime.contains(char::is_whitespace)
            }
            None => false,
        };
        if !well_formed {
            errors.push(ValidationError::new(
                field,
                format!("'{}' is not a type/subtype mime type", mime),
            ));
        }
    }
}
