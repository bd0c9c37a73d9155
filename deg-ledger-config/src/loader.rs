// Settings file loaders
//
// Host processes usually hand the recorder a flat string map. These helpers
// produce that map from a JSON or TOML table so the same `RecorderConfig::parse`
// path is used either way.

use crate::{ConfigError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Supported settings file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            _ => None,
        }
    }
}

/// Load a settings file, detecting the format from its extension
pub fn load_settings(path: impl AsRef<Path>) -> Result<HashMap<String, String>> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ConfigError::LoadError("No file extension found".to_string()))?;
    let format = FileFormat::from_extension(ext)
        .ok_or_else(|| ConfigError::LoadError(format!("Unsupported format: {}", ext)))?;

    let content = fs::read_to_string(path)?;
    let settings = parse_settings(&content, format)?;
    debug!(path = %path.display(), keys = settings.len(), "Loaded recorder settings");
    Ok(settings)
}

/// Parse settings content into a flat string map.
///
/// Scalars are stringified, arrays of scalars become comma-separated lists
/// (so `actions = ["on_confirm", "on_status"]` works), nested tables are
/// rejected.
pub fn parse_settings(content: &str, format: FileFormat) -> Result<HashMap<String, String>> {
    let value: Value = match format {
        FileFormat::Json => serde_json::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("JSON parse error: {}", e)))?,
        FileFormat::Toml => {
            let table: toml::Table = toml::from_str(content)
                .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;
            serde_json::to_value(table).map_err(|e| ConfigError::ParseError(e.to_string()))?
        }
    };

    let Value::Object(object) = value else {
        return Err(ConfigError::ParseError(
            "settings must be a table of key/value pairs".to_string(),
        ));
    };

    object
        .into_iter()
        .map(|(key, value)| {
            let value = stringify(&key, value)?;
            Ok((key, value))
        })
        .collect()
}

fn stringify(key: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Array(_) | Value::Object(_) => Err(ConfigError::ParseError(format!(
                    "nested value in list `{}`",
                    key
                ))),
                other => stringify(key, other),
            })
            .collect::<Result<Vec<_>>>()
            .map(|items| items.join(",")),
        Value::Object(_) => Err(ConfigError::ParseError(format!(
            "nested table `{}` is not supported",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_format_detection() {
        assert_eq!(FileFormat::from_extension("json"), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_extension("TOML"), Some(FileFormat::Toml));
        assert_eq!(FileFormat::from_extension("yaml"), None);
    }

    #[test]
    fn test_parse_json_settings() {
        let settings = parse_settings(
            r#"{"ledgerHost": "https://ledger", "retryCount": 2, "enabled": true, "actions": ["on_confirm", "on_status"]}"#,
            FileFormat::Json,
        )
        .unwrap();

        assert_eq!(settings["ledgerHost"], "https://ledger");
        assert_eq!(settings["retryCount"], "2");
        assert_eq!(settings["enabled"], "true");
        assert_eq!(settings["actions"], "on_confirm,on_status");
    }

    #[test]
    fn test_parse_toml_settings() {
        let settings = parse_settings(
            "ledgerHost = \"https://ledger\"\nasyncTimeout = 1500\nrole = \"BUYER_DISCOM\"\n",
            FileFormat::Toml,
        )
        .unwrap();

        assert_eq!(settings["asyncTimeout"], "1500");
        assert_eq!(settings["role"], "BUYER_DISCOM");
    }

    #[test]
    fn test_nested_tables_rejected() {
        let result = parse_settings(r#"{"signing": {"keyId": "k"}}"#, FileFormat::Json);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));

        let result = parse_settings("[1, 2]", FileFormat::Json);
        assert!(result.is_err());
    }
}
