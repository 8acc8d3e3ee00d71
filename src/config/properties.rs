//! Flat key/value properties.
//!
//! Text in the Java `.properties` format is read with the
//! `java-properties` crate; inline TOML tables are flattened into the
//! same keys by the loader.

use std::collections::BTreeMap;

use java_properties::{PropertiesError, PropertiesIter};

use crate::config::ConfigError;

/// An ordered set of string properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `.properties` text. Later duplicates override earlier ones.
    pub fn parse(text: &str) -> Result<Self, PropertiesError> {
        let mut props = Self::new();
        PropertiesIter::new_with_encoding(text.as_bytes(), encoding_rs::UTF_8)
            .read_into(|key, value| props.insert(key, value))?;
        Ok(props)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Copy every entry of `other` into this set, overriding existing keys.
    pub fn merge(&mut self, other: Properties) {
        self.entries.extend(other.entries);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// The trimmed value, or `None` when absent or blank.
    pub fn get_non_blank(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    /// The value, or `default` when absent or blank.
    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.get_non_blank(key).unwrap_or(default).to_string()
    }

    /// A boolean value; `true`/`false` in any case, `default` when absent or blank.
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get_non_blank(key) {
            None => Ok(default),
            Some(v) if v.eq_ignore_ascii_case("true") => Ok(true),
            Some(v) if v.eq_ignore_ascii_case("false") => Ok(false),
            Some(v) => Err(ConfigError::InvalidBoolean {
                key: key.to_string(),
                value: v.to_string(),
            }),
        }
    }

    /// Entries whose key starts with `prefix`, yielded as (suffix, value).
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.entries
            .range(prefix.to_string()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(move |(k, v)| (&k[prefix.len()..], v.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Self::new();
        for (k, v) in iter {
            props.insert(k, v);
        }
        props
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policy_file() {
        let props = Properties::parse(
            "# access policy\n\
             access.https.require=true\n\
             access.hosts.allow : 127.0.0.1 ::1\n\
             access.https.clientCertPrincipal=cn=Jöhn Doe,ou=people\n\
             access.apiKeys.exemptedMethods=ws.getName \\\n    ws.getTime\n\
             access.empty=\n",
        )
        .unwrap();

        assert_eq!(props.len(), 5);
        assert_eq!(props.get("access.https.require"), Some("true"));
        assert_eq!(props.get("access.hosts.allow"), Some("127.0.0.1 ::1"));
        assert_eq!(
            props.get("access.https.clientCertPrincipal"),
            Some("cn=Jöhn Doe,ou=people")
        );
        assert_eq!(
            props.get("access.apiKeys.exemptedMethods"),
            Some("ws.getName ws.getTime")
        );
        assert_eq!(props.get_non_blank("access.empty"), None);
    }

    #[test]
    fn test_get_bool() {
        let props: Properties = [("a", "TRUE"), ("b", " false "), ("c", "yes"), ("d", "")]
            .into_iter()
            .collect();
        assert!(props.get_bool("a", false).unwrap());
        assert!(!props.get_bool("b", true).unwrap());
        assert!(props.get_bool("d", true).unwrap());
        assert!(props.get_bool("missing", true).unwrap());
        assert!(matches!(
            props.get_bool("c", true),
            Err(ConfigError::InvalidBoolean { .. })
        ));
    }

    #[test]
    fn test_with_prefix() {
        let props: Properties = [
            ("access.apiKeys.map.k1", "a b"),
            ("access.apiKeys.map.k2", "*"),
            ("access.apiKeys.require", "true"),
            ("other.apiKeys.map.k3", "c"),
        ]
        .into_iter()
        .collect();

        let entries: Vec<_> = props.with_prefix("access.apiKeys.map.").collect();
        assert_eq!(entries, vec![("k1", "a b"), ("k2", "*")]);
    }
}
