// src/format.rs

//! Config format classification and parsing.
//!
//! Two text formats reach the bootstrap:
//! - `key=value` properties lines (local `.properties` files, and most
//!   centrally published blobs)
//! - YAML mappings (local `.yml`/`.yaml` files, and the rest of the blobs)
//!
//! The coordination store holds opaque text with no declared content type,
//! so remote payloads are classified by inspection. Both classifiers are
//! pure functions, independent of any I/O.

use crate::config::ConfigMap;
use crate::error::BootstrapError;
use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// The two config formats the bootstrap understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Properties,
    Yaml,
}

/// A properties entry: `key = value` with an alphanumeric/dashed key.
static PROPERTIES_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*[A-Za-z0-9_.\-]+[ \t]*=").expect("properties line pattern")
});

/// Select the parser from a file path's extension (the substring after the
/// last `.`). Anything other than `properties`, `yml` or `yaml` is a fatal
/// configuration error.
pub fn classify_extension(path: &Path) -> Result<ConfigFormat, BootstrapError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    match extension {
        "properties" => Ok(ConfigFormat::Properties),
        "yml" | "yaml" => Ok(ConfigFormat::Yaml),
        other => Err(BootstrapError::UnsupportedFormat {
            path: path.display().to_string(),
            extension: other.to_string(),
        }),
    }
}

/// Classify an opaque text payload.
///
/// Properties iff every non-blank, non-comment line looks like `key=value`;
/// anything else is treated as YAML. A payload with no content lines
/// classifies as properties (and parses to an empty map).
pub fn classify_payload(text: &str) -> ConfigFormat {
    let mut content_lines = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('!'));

    // Empty payloads classify as properties; callers reject the empty map
    // later when required keys are checked.
    if content_lines.all(|line| PROPERTIES_LINE.is_match(line)) {
        ConfigFormat::Properties
    } else {
        ConfigFormat::Yaml
    }
}

/// Parse text in the given format into a flat string map.
pub fn parse(format: ConfigFormat, text: &str) -> Result<ConfigMap> {
    match format {
        ConfigFormat::Properties => Ok(parse_properties(text)),
        ConfigFormat::Yaml => parse_yaml(text),
    }
}

/// Parse `key=value` lines.
///
/// Blank lines and `#`/`!` comments are skipped. Keys and values are
/// trimmed; a later duplicate key overwrites an earlier one.
pub fn parse_properties(text: &str) -> ConfigMap {
    let mut map = ConfigMap::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            map.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    map
}

/// Parse a YAML document into a flat string map.
///
/// The document must be a mapping. Nested mappings are flattened with `.`
/// separators; scalar values are stringified; nulls are skipped. Sequences
/// have no flat representation and are rejected.
pub fn parse_yaml(text: &str) -> Result<ConfigMap> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(text).context("Failed to parse YAML config")?;

    let mapping = match value {
        serde_yaml::Value::Mapping(m) => m,
        serde_yaml::Value::Null => return Ok(ConfigMap::new()),
        _ => bail!("YAML config must be a mapping at the top level"),
    };

    let mut map = ConfigMap::new();
    flatten_mapping("", &mapping, &mut map)?;
    Ok(map)
}

fn flatten_mapping(
    prefix: &str,
    mapping: &serde_yaml::Mapping,
    out: &mut ConfigMap,
) -> Result<()> {
    for (key, value) in mapping {
        let key = key
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| scalar_to_string(key).unwrap_or_default());

        let full_key = if prefix.is_empty() {
            key
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            serde_yaml::Value::Mapping(nested) => flatten_mapping(&full_key, nested, out)?,
            serde_yaml::Value::Null => {}
            serde_yaml::Value::Sequence(_) => {
                bail!("YAML config key {:?} holds a sequence, which has no flat form", full_key)
            }
            other => {
                let rendered = scalar_to_string(other)
                    .with_context(|| format!("Unsupported YAML value for key {:?}", full_key))?;
                out.insert(full_key, rendered);
            }
        }
    }
    Ok(())
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_selects_parser() {
        assert_eq!(
            classify_extension(Path::new("conf/job.properties")).unwrap(),
            ConfigFormat::Properties
        );
        assert_eq!(
            classify_extension(Path::new("job.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            classify_extension(Path::new("job.yaml")).unwrap(),
            ConfigFormat::Yaml
        );
    }

    #[test]
    fn unknown_extension_is_fatal() {
        let err = classify_extension(Path::new("job.toml")).unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::UnsupportedFormat { ref extension, .. } if extension == "toml"
        ));
    }

    #[test]
    fn payload_sniffing() {
        let props = "main-class = com.acme.Orders\nconf-version=3\n# comment\n";
        assert_eq!(classify_payload(props), ConfigFormat::Properties);

        let yaml = "main-class: com.acme.Orders\nconf-version: 3\n";
        assert_eq!(classify_payload(yaml), ConfigFormat::Yaml);

        // One YAML-looking line is enough to tip the whole blob.
        let mixed = "main-class=com.acme.Orders\nextra:\n  nested: 1\n";
        assert_eq!(classify_payload(mixed), ConfigFormat::Yaml);
    }

    #[test]
    fn properties_parsing_skips_comments_and_trims() {
        let map = parse_properties(
            "# job config\n! legacy comment\n\nmain-class =  com.acme.Orders \nconf-version=3\nconf-version=4\n",
        );
        assert_eq!(map.get("main-class").map(String::as_str), Some("com.acme.Orders"));
        assert_eq!(map.get("conf-version").map(String::as_str), Some("4"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn yaml_parsing_flattens_nested_mappings() {
        let map = parse_yaml(
            "main-class: com.acme.Orders\nconf-version: 3\ncoordination:\n  endpoint: http://cs:2181\n",
        )
        .unwrap();
        assert_eq!(map.get("conf-version").map(String::as_str), Some("3"));
        assert_eq!(
            map.get("coordination.endpoint").map(String::as_str),
            Some("http://cs:2181")
        );
    }

    #[test]
    fn yaml_must_be_a_mapping() {
        assert!(parse_yaml("- a\n- b\n").is_err());
    }
}
