// src/resolve.rs

//! Local/remote version reconciliation.
//!
//! Both config sources carry an integer `conf-version`. With no remote
//! config the local file wins unconditionally. With a remote config,
//! remote wins when `remote.version >= local.version` — the tie favours
//! remote so operators can force a refresh on a restarting job by
//! republishing the same version number centrally, without bumping it.
//! A remote version strictly below local is stale and ignored.

use crate::config::{keys, ConfigMap};
use crate::error::BootstrapError;
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Provenance of a config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Local,
    Remote,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Local => f.write_str("local"),
            ConfigSource::Remote => f.write_str("remote"),
        }
    }
}

// thiserror treats the `source`-named field of `BootstrapError::InvalidVersion`
// as the error's `source()`, which requires the field type to implement
// `std::error::Error`. `ConfigSource` is display-only provenance with the
// required `Debug + Display` bounds, so the marker impl satisfies that bound.
impl std::error::Error for ConfigSource {}

/// A config document tagged with its parsed version and provenance.
#[derive(Debug, Clone)]
pub struct VersionedConfig {
    pub version: i64,
    pub data: ConfigMap,
    pub source: ConfigSource,
}

impl VersionedConfig {
    /// Tag a config map, parsing its `conf-version`.
    ///
    /// For the local source the caller treats failure as fatal; for the
    /// remote source the caller degrades it to "malformed blob".
    pub fn new(data: ConfigMap, source: ConfigSource) -> Result<Self, BootstrapError> {
        let raw = data
            .get(keys::CONF_VERSION)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or(BootstrapError::MissingKey {
                key: keys::CONF_VERSION,
            })?;

        let version = raw
            .parse::<i64>()
            .map_err(|_| BootstrapError::InvalidVersion {
                value: raw.to_string(),
                source,
            })?;

        Ok(Self {
            version,
            data,
            source,
        })
    }
}

/// The final merged configuration handed to the context factory.
///
/// Frozen after the `configure` hook runs: nothing mutates it once the
/// recovery orchestrator starts.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    data: ConfigMap,
    /// Which source supplied the effective config data.
    pub winning_source: ConfigSource,
    /// Version of the winning source.
    pub effective_version: i64,
    /// The local version record, retained even on a remote win.
    pub local_version: i64,
    /// The remote version, exposed separately for audit on a remote win.
    pub remote_version: Option<i64>,
    /// Whether the debug override was active for this run.
    pub debug: bool,
}

impl ResolvedConfig {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Numeric lookup with a default; a non-numeric value falls back.
    pub fn u64_or(&self, key: &str, default: u64) -> u64 {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Overwrite a key. Used by the debug resolver and the `configure`
    /// hook, both of which run before the freeze point.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.data.insert(key.to_string(), value.into());
    }

    pub fn data(&self) -> &ConfigMap {
        &self.data
    }
}

/// Pick the winning source.
///
/// `local` must carry `ConfigSource::Local` provenance; `remote`, when
/// present, has already survived sniffing and version parsing.
pub fn reconcile(local: VersionedConfig, remote: Option<VersionedConfig>) -> ResolvedConfig {
    let local_version = local.version;

    match remote {
        Some(remote) if remote.version >= local_version => {
            info!(
                local_version,
                remote_version = remote.version,
                "remote config wins reconciliation"
            );
            ResolvedConfig {
                data: remote.data,
                winning_source: ConfigSource::Remote,
                effective_version: remote.version,
                local_version,
                remote_version: Some(remote.version),
                debug: false,
            }
        }
        Some(remote) => {
            info!(
                local_version,
                remote_version = remote.version,
                "stale remote config ignored"
            );
            resolved_from_local(local)
        }
        None => resolved_from_local(local),
    }
}

fn resolved_from_local(local: VersionedConfig) -> ResolvedConfig {
    ResolvedConfig {
        data: local.data,
        winning_source: ConfigSource::Local,
        effective_version: local.version,
        local_version: local.version,
        remote_version: None,
        debug: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(version: &str) -> ConfigMap {
        let mut m = ConfigMap::new();
        m.insert("main-class".to_string(), "com.acme.Orders".to_string());
        m.insert("conf-version".to_string(), version.to_string());
        m
    }

    fn local(version: i64) -> VersionedConfig {
        VersionedConfig::new(map(&version.to_string()), ConfigSource::Local).unwrap()
    }

    fn remote(version: i64) -> VersionedConfig {
        VersionedConfig::new(map(&version.to_string()), ConfigSource::Remote).unwrap()
    }

    #[test]
    fn no_remote_local_wins() {
        let resolved = reconcile(local(3), None);
        assert_eq!(resolved.winning_source, ConfigSource::Local);
        assert_eq!(resolved.effective_version, 3);
        assert_eq!(resolved.local_version, 3);
        assert_eq!(resolved.remote_version, None);
    }

    #[test]
    fn greater_remote_wins() {
        let resolved = reconcile(local(3), Some(remote(7)));
        assert_eq!(resolved.winning_source, ConfigSource::Remote);
        assert_eq!(resolved.effective_version, 7);
        assert_eq!(resolved.local_version, 3);
        assert_eq!(resolved.remote_version, Some(7));
    }

    #[test]
    fn tie_favours_remote() {
        let resolved = reconcile(local(3), Some(remote(3)));
        assert_eq!(resolved.winning_source, ConfigSource::Remote);
        assert_eq!(resolved.effective_version, 3);
    }

    #[test]
    fn stale_remote_ignored() {
        let resolved = reconcile(local(3), Some(remote(2)));
        assert_eq!(resolved.winning_source, ConfigSource::Local);
        assert_eq!(resolved.effective_version, 3);
        assert_eq!(resolved.remote_version, None);
    }

    #[test]
    fn effective_version_tracks_winning_source() {
        for (l, r) in [(1, 9), (9, 1), (4, 4)] {
            let resolved = reconcile(local(l), Some(remote(r)));
            let expected = match resolved.winning_source {
                ConfigSource::Local => l,
                ConfigSource::Remote => r,
            };
            assert_eq!(resolved.effective_version, expected);
        }
    }

    #[test]
    fn missing_version_is_its_own_kind() {
        let mut m = map("3");
        m.remove("conf-version");
        let err = VersionedConfig::new(m, ConfigSource::Local).unwrap_err();
        assert!(matches!(err, BootstrapError::MissingKey { key } if key == "conf-version"));
    }

    #[test]
    fn non_integer_version_is_invalid() {
        let err = VersionedConfig::new(map("three"), ConfigSource::Local).unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::InvalidVersion { ref value, source: ConfigSource::Local } if value == "three"
        ));
    }
}
