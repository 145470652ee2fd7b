// src/config.rs

//! Local configuration: the file the job ships with.
//!
//! The config file is the primary source of truth for a job. The
//! coordination store can override it (see `remote` / `resolve`), but a job
//! must be able to boot from this file alone.
//!
//! Two on-disk formats are supported, selected by extension:
//!
//! `job.properties`:
//!
//! ```text
//! main-class = com.acme.OrdersJob
//! conf-version = 3
//! app-name = orders-enricher
//! coordination-endpoint = http://coord.prod:8500
//! ```
//!
//! `job.yml`:
//!
//! ```text
//! main-class: com.acme.OrdersJob
//! conf-version: 3
//! ```
//!
//! Operators editing a job only touch this file, not the Rust code.

use crate::error::BootstrapError;
use crate::format::{classify_extension, parse};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Flat string-to-string configuration mapping. Keys are unique; ordering
/// is irrelevant but kept stable for deterministic logs.
pub type ConfigMap = BTreeMap<String, String>;

/// Environment variable naming the local config file.
pub const CONF_ENV: &str = "STREAMBOOT_CONF";

/// Config path used when `STREAMBOOT_CONF` is not set.
pub const DEFAULT_CONF_PATH: &str = "conf/job.properties";

/// Well-known configuration keys.
pub mod keys {
    /// Entry point of the job. Required, non-empty.
    pub const MAIN_CLASS: &str = "main-class";

    /// Integer config version used for local/remote reconciliation. Required.
    pub const CONF_VERSION: &str = "conf-version";

    /// Human-readable job name; identity seed. Optional.
    pub const APP_NAME: &str = "app-name";

    /// Base URL of the coordination store. Optional; absent means
    /// local-only operation.
    pub const COORDINATION_ENDPOINT: &str = "coordination-endpoint";

    /// Key prefix under which job configs are published.
    pub const COORDINATION_PREFIX: &str = "coordination-prefix";

    /// Upper bound on the store lookup, in milliseconds.
    pub const COORDINATION_TIMEOUT_MS: &str = "coordination-timeout-ms";

    /// Execution topology; debug mode forces `local`.
    pub const EXECUTION_MODE: &str = "execution-mode";

    /// Per-partition consumption rate limit; debug mode clamps it.
    pub const MAX_RATE_PER_PARTITION: &str = "max-rate-per-partition";

    /// Optional URL the heartbeat reporter POSTs liveness pings to.
    pub const HEARTBEAT_ENDPOINT: &str = "heartbeat-endpoint";

    /// Interval between heartbeat pings, in milliseconds.
    pub const HEARTBEAT_INTERVAL_MS: &str = "heartbeat-interval-ms";

    /// Audit field: the debug flag, recorded as the string "true"/"false".
    pub const DEBUG: &str = "debug";

    /// Audit field: base64 of the original config source text.
    pub const CONF_SOURCE_B64: &str = "conf-source-base64";
}

/// Store prefix used when `coordination-prefix` is not configured.
pub const DEFAULT_COORDINATION_PREFIX: &str = "/streamboot/config";

/// Store lookup bound used when `coordination-timeout-ms` is not configured.
pub const DEFAULT_COORDINATION_TIMEOUT_MS: u64 = 5_000;

/// A local config file, parsed, with its raw text retained for the audit
/// encoding applied later during debug resolution.
#[derive(Debug, Clone)]
pub struct LocalConfig {
    pub data: ConfigMap,
    pub raw: String,
    pub path: PathBuf,
}

impl LocalConfig {
    /// Load and parse a config file from disk.
    ///
    /// This performs:
    /// - extension-based format selection
    /// - file read
    /// - properties/YAML parsing
    ///
    /// Validation of required keys is a separate step (`validate`) so the
    /// loader stays format-only.
    pub fn load(path: &Path) -> Result<Self> {
        let format = classify_extension(path)?;

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let data = parse(format, &raw)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        Ok(Self {
            data,
            raw,
            path: path.to_path_buf(),
        })
    }

    /// Check the keys a job cannot boot without.
    ///
    /// `main-class` must be present and non-empty. `conf-version` is
    /// checked later, at reconciliation, where its integer form is needed.
    pub fn validate(&self) -> Result<(), BootstrapError> {
        if self.main_class().is_none() {
            return Err(BootstrapError::MissingKey {
                key: keys::MAIN_CLASS,
            });
        }
        Ok(())
    }

    pub fn main_class(&self) -> Option<&str> {
        non_empty(self.data.get(keys::MAIN_CLASS))
    }

    pub fn app_name(&self) -> Option<&str> {
        non_empty(self.data.get(keys::APP_NAME))
    }

    pub fn coordination_endpoint(&self) -> Option<&str> {
        non_empty(self.data.get(keys::COORDINATION_ENDPOINT))
    }

    pub fn coordination_prefix(&self) -> &str {
        non_empty(self.data.get(keys::COORDINATION_PREFIX))
            .unwrap_or(DEFAULT_COORDINATION_PREFIX)
    }

    /// Lookup timeout for the coordination store. A non-numeric value falls
    /// back to the default rather than failing the boot.
    pub fn coordination_timeout_ms(&self) -> u64 {
        self.data
            .get(keys::COORDINATION_TIMEOUT_MS)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_COORDINATION_TIMEOUT_MS)
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_conf(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_properties_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conf(
            &dir,
            "job.properties",
            "main-class=com.acme.Orders\nconf-version=3\napp-name=orders\n",
        );

        let cfg = LocalConfig::load(&path).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.main_class(), Some("com.acme.Orders"));
        assert_eq!(cfg.app_name(), Some("orders"));
        assert!(cfg.raw.contains("conf-version=3"));
    }

    #[test]
    fn loads_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conf(
            &dir,
            "job.yml",
            "main-class: com.acme.Orders\nconf-version: 3\n",
        );

        let cfg = LocalConfig::load(&path).unwrap();
        assert_eq!(cfg.data.get("conf-version").map(String::as_str), Some("3"));
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conf(&dir, "job.json", "{}");

        let err = LocalConfig::load(&path).unwrap_err();
        let kind = err.downcast_ref::<BootstrapError>().unwrap();
        assert!(matches!(kind, BootstrapError::UnsupportedFormat { .. }));
    }

    #[test]
    fn missing_main_class_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conf(&dir, "job.properties", "conf-version=3\nmain-class=  \n");

        let cfg = LocalConfig::load(&path).unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, BootstrapError::MissingKey { key } if key == keys::MAIN_CLASS));
    }

    #[test]
    fn coordination_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conf(&dir, "job.properties", "main-class=a\nconf-version=1\n");

        let cfg = LocalConfig::load(&path).unwrap();
        assert_eq!(cfg.coordination_endpoint(), None);
        assert_eq!(cfg.coordination_prefix(), DEFAULT_COORDINATION_PREFIX);
        assert_eq!(cfg.coordination_timeout_ms(), DEFAULT_COORDINATION_TIMEOUT_MS);
    }
}
