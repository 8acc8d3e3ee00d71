//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::access::CompositeFilterConfig;
use crate::config::schema::{AccessConfig, GatewayConfig};
use crate::config::validation::validate_config;
use crate::config::{ConfigError, Properties};

/// Load and validate the gateway configuration from a TOML file.
pub fn load_gateway_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: GatewayConfig = toml::from_str(&content).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Read a `.properties` file.
pub fn load_properties(path: &Path) -> Result<Properties, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Properties::parse(&content).map_err(|source| ConfigError::Properties {
        path: path.to_path_buf(),
        source,
    })
}

/// Build the access policy from its sources: the properties file first,
/// then inline entries on top.
pub fn load_access_config(access: &AccessConfig) -> Result<CompositeFilterConfig, ConfigError> {
    let mut props = match &access.properties_path {
        Some(path) => load_properties(Path::new(path))?,
        None => Properties::new(),
    };
    props.merge(inline_properties(&access.prefix, &access.properties));

    CompositeFilterConfig::from_properties_with_prefix(&access.prefix, &props)
}

/// Flatten an inline TOML table into prefixed properties.
pub fn inline_properties(prefix: &str, table: &toml::Table) -> Properties {
    let mut props = Properties::new();
    flatten_into(&mut props, prefix, table);
    props
}

fn flatten_into(props: &mut Properties, prefix: &str, table: &toml::Table) {
    for (key, value) in table {
        let key = format!("{prefix}{key}");
        match value {
            toml::Value::Table(nested) => flatten_into(props, &format!("{key}."), nested),
            toml::Value::Array(items) => {
                let joined: Vec<String> = items.iter().map(scalar_string).collect();
                props.insert(key, joined.join(" "));
            }
            other => props.insert(key, scalar_string(other)),
        }
    }
}

fn scalar_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::security::ApiKey;

    #[test]
    fn test_inline_properties_flatten() {
        let table: toml::Table = toml::from_str(
            r#"
            https.require = false
            hosts.allow = "127.0.0.1 ::1"
            apiKeys.exemptedMethods = ["ws.getName", "ws.getTime"]

            [apiKeys.map]
            k1 = "sso.login sso.logout"
            k2 = ["*"]
            "#,
        )
        .unwrap();

        let props = inline_properties("access.", &table);
        assert_eq!(props.get("access.https.require"), Some("false"));
        assert_eq!(props.get("access.hosts.allow"), Some("127.0.0.1 ::1"));
        assert_eq!(props.get("access.apiKeys.exemptedMethods"), Some("ws.getName ws.getTime"));
        assert_eq!(props.get("access.apiKeys.map.k1"), Some("sso.login sso.logout"));
        assert_eq!(props.get("access.apiKeys.map.k2"), Some("*"));
    }

    #[test]
    fn test_inline_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "access.https.require=true").unwrap();
        writeln!(file, "access.apiKeys.map.k1=sso.login").unwrap();

        let mut access = AccessConfig {
            properties_path: Some(file.path().to_string_lossy().into_owned()),
            ..AccessConfig::default()
        };
        access.properties = toml::from_str("https.require = false").unwrap();

        let config = load_access_config(&access).unwrap();
        assert!(!config.https.require);
        assert!(config.api_keys.map.contains_key(&ApiKey::new("k1")));
    }

    #[test]
    fn test_missing_properties_file() {
        let access = AccessConfig {
            properties_path: Some("/nonexistent/access.properties".to_string()),
            ..AccessConfig::default()
        };
        assert!(matches!(load_access_config(&access), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_malformed_properties_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "access.hosts.allow=\\uZZZZ").unwrap();

        assert!(matches!(
            load_properties(file.path()),
            Err(ConfigError::Properties { .. })
        ));
    }

    #[test]
    fn test_load_gateway_config_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[listener]\nbind_address = \"nowhere\"").unwrap();

        assert!(matches!(
            load_gateway_config(file.path()),
            Err(ConfigError::Validation(errors)) if errors.len() == 1
        ));
    }

    #[test]
    fn test_load_gateway_config_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[listener").unwrap();
        assert!(matches!(load_gateway_config(file.path()), Err(ConfigError::Toml { .. })));
    }
}
