//! Configuration file loading for portrait.
//!
//! Reads `portrait.config.json` from the current working directory.
//! Also provides JSON Schema generation for editor autocompletion.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "portrait.config.json";

/// Top-level portrait configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PortraitConfig {
    /// JSON Schema reference (for editor autocompletion).
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Extraction configuration.
    #[serde(default)]
    pub extract: ExtractConfig,
}

/// Configuration for the `extract` command. Every field may be overridden
/// on the command line.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractConfig {
    /// Glob patterns of source files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<String>>,

    /// Directory generated files are written to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ConfigFormat>,

    /// Interpolation delimiters, e.g. `["${", "}"]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiters: Option<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    Js,
    Json,
}

/// Load `portrait.config.json` from the given directory (or CWD if None).
pub fn load_config(dir: Option<&Path>) -> PortraitConfig {
    let base = dir
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let config_path = base.join(CONFIG_FILE);

    if !config_path.exists() {
        return PortraitConfig::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {}", config_path.display(), e);
            PortraitConfig::default()
        }),
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", config_path.display(), e);
            PortraitConfig::default()
        }
    }
}

pub fn parse_config(content: &str) -> Result<PortraitConfig, serde_json::Error> {
    serde_json::from_str(content)
}

/// JSON Schema for `portrait.config.json`.
pub const PORTRAIT_CONFIG_SCHEMA: &str = r#"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "title": "Portrait Configuration",
  "description": "Configuration file for portrait - component metadata extraction",
  "type": "object",
  "properties": {
    "$schema": {
      "type": "string",
      "description": "JSON Schema reference for editor autocompletion"
    },
    "extract": {
      "type": "object",
      "description": "Extraction configuration",
      "properties": {
        "patterns": {
          "type": "array",
          "description": "Glob patterns of component sources",
          "items": { "type": "string" },
          "examples": [["src/**/*.vue"], ["src/**/*.vue", "src/**/*.ts"]]
        },
        "outDir": {
          "type": "string",
          "description": "Directory generated metadata files are written to"
        },
        "format": {
          "type": "string",
          "description": "Output format",
          "enum": ["js", "json"]
        },
        "delimiters": {
          "type": "array",
          "description": "Template interpolation delimiters",
          "items": { "type": "string" },
          "minItems": 2,
          "maxItems": 2
        }
      },
      "additionalProperties": false
    }
  },
  "additionalProperties": false
}"#;

/// Write the JSON Schema to `node_modules/.portrait/portrait.config.schema.json`.
pub fn write_schema(dir: Option<&Path>) -> std::io::Result<PathBuf> {
    let base = dir
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let schema_dir = base.join("node_modules/.portrait");
    std::fs::create_dir_all(&schema_dir)?;
    let schema_path = schema_dir.join("portrait.config.schema.json");
    std::fs::write(&schema_path, PORTRAIT_CONFIG_SCHEMA)?;
    Ok(schema_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"{
  "$schema": "./node_modules/.portrait/portrait.config.schema.json",
  "extract": {
    "patterns": ["src/**/*.vue"],
    "outDir": "meta",
    "format": "json",
    "delimiters": ["${", "}"]
  }
}"#,
        )
        .unwrap();
        assert!(config.schema.is_some());
        let extract = config.extract;
        assert_eq!(extract.patterns.unwrap(), ["src/**/*.vue"]);
        assert_eq!(extract.out_dir, Some(PathBuf::from("meta")));
        assert_eq!(extract.format, Some(ConfigFormat::Json));
        assert_eq!(extract.delimiters, Some(("${".to_string(), "}".to_string())));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("{}").unwrap();
        assert!(config.extract.patterns.is_none());
        assert!(config.extract.format.is_none());
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(parse_config(r#"{ "extract": { "format": "yaml" } }"#).is_err());
    }

    #[test]
    fn test_schema_is_valid_json() {
        let schema: serde_json::Value = serde_json::from_str(PORTRAIT_CONFIG_SCHEMA).unwrap();
        assert_eq!(schema["properties"]["extract"]["properties"]["format"]["enum"][1], "json");
    }

    #[test]
    fn test_load_missing_config() {
        let dir = std::env::temp_dir().join("portrait-config-missing");
        let config = load_config(Some(&dir));
        assert!(config.extract.out_dir.is_none());
    }
}
