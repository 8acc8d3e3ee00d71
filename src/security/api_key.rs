//! API key value type.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An opaque API key. Two keys are equal when their string values are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap an existing key value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Issue a new random key (UUID v4 text form).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ApiKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ApiKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_value_equality() {
        assert_eq!(ApiKey::new("9cd19267"), ApiKey::from("9cd19267"));
        assert_ne!(ApiKey::new("9cd19267"), ApiKey::new("b9f89662"));

        let mut set = HashSet::new();
        set.insert(ApiKey::new("9cd19267"));
        assert!(set.contains(&ApiKey::from(String::from("9cd19267"))));
    }

    #[test]
    fn test_generate_is_unique() {
        let a = ApiKey::generate();
        let b = ApiKey::generate();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }
}
