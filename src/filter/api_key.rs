//! API key authorization.
//!
//! # Design Decisions
//! - The key travels as a named string parameter of the request
//! - Exempted methods are checked first, before the parameter shape
//! - A `*` entry grants a key every method

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde_json::Value;

use crate::filter::{AccessDeniedReason, Filter, FilterResult};
use crate::rpc::{MessageContext, ParamsShape, Request};
use crate::security::ApiKey;

/// Default name of the parameter carrying the API key.
pub const DEFAULT_API_KEY_PARAMETER_NAME: &str = "apiKey";

/// Method entry granting a key access to every method.
pub const ANY_METHOD: &str = "*";

/// Admits requests that carry a key allowed to call the requested method.
#[derive(Clone)]
pub struct ApiKeyFilter {
    key_map: HashMap<ApiKey, HashSet<String>>,
    exempted_methods: HashSet<String>,
    parameter_name: String,
}

impl ApiKeyFilter {
    /// Create a filter reading the key from [`DEFAULT_API_KEY_PARAMETER_NAME`].
    pub fn new(
        key_map: HashMap<ApiKey, HashSet<String>>,
        exempted_methods: HashSet<String>,
    ) -> Self {
        Self {
            key_map,
            exempted_methods,
            parameter_name: DEFAULT_API_KEY_PARAMETER_NAME.to_string(),
        }
    }

    /// Read the key from a different named parameter.
    pub fn with_parameter_name(mut self, name: impl Into<String>) -> Self {
        self.parameter_name = name.into();
        self
    }

    pub fn key_map(&self) -> &HashMap<ApiKey, HashSet<String>> {
        &self.key_map
    }

    pub fn exempted_methods(&self) -> &HashSet<String> {
        &self.exempted_methods
    }

    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }
}

impl fmt::Debug for ApiKeyFilter {
    // key values stay out of logs
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyFilter")
            .field("keys", &self.key_map.len())
            .field("exempted_methods", &self.exempted_methods)
            .field("parameter_name", &self.parameter_name)
            .finish()
    }
}

impl Filter for ApiKeyFilter {
    fn evaluate(&self, request: &Request, _context: &MessageContext) -> FilterResult {
        let method = request.method();

        if self.exempted_methods.contains(method) {
            return FilterResult::ALLOWED;
        }

        if request.params_shape() != ParamsShape::Named {
            return AccessDeniedReason::ApiKeyRequiresNamedParam.into();
        }

        let key = match request.params().get(&self.parameter_name) {
            Some(Value::String(value)) => ApiKey::new(value.as_str()),
            _ => return AccessDeniedReason::MissingApiKey.into(),
        };

        let Some(allowed_methods) = self.key_map.get(&key) else {
            return AccessDeniedReason::ApiKeyDenied.into();
        };

        if allowed_methods.contains(ANY_METHOD) || allowed_methods.contains(method) {
            FilterResult::ALLOWED
        } else {
            AccessDeniedReason::ApiKeyDenied.into()
        }
    }

    fn name(&self) -> &'static str {
        "api_key"
    }
}
