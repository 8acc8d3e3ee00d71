//! Configuration errors.
//!
//! Any of these aborts start-up, or rejects a reload while the current
//! policy stays in force. None of them is ever reported to a client.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::validation::ValidationError;
use crate::security::DnError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid properties in {path}: {source}")]
    Properties {
        path: PathBuf,
        #[source]
        source: java_properties::PropertiesError,
    },

    #[error("property {key} must be 'true' or 'false', got '{value}'")]
    InvalidBoolean { key: String, value: String },

    #[error("property {key} is not a valid distinguished name '{value}': {source}")]
    InvalidPrincipal {
        key: String,
        value: String,
        #[source]
        source: DnError,
    },

    #[error("cannot resolve allowed host '{host}': {source}")]
    UnresolvableHost {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {key}: {reason}")]
    Invalid { key: String, reason: String },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
