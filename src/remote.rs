// src/remote.rs

//! Remote config lookup.
//!
//! The centrally published config for a job lives at `{prefix}/{identity}`
//! in the coordination store, as an opaque text blob with no declared
//! content type: the payload is sniffed and parsed as properties or YAML.
//!
//! Remote unavailability is never fatal. An unreachable store and a
//! malformed blob are logged as distinct conditions, and both degrade the
//! boot to local-only config.

use crate::error::StoreError;
use crate::format::{classify_payload, parse};
use crate::identity::Identity;
use crate::resolve::{ConfigSource, VersionedConfig};
use crate::store::CoordinationStore;
use tracing::{debug, warn};

/// Look up the job's centrally published config.
///
/// Returns `None` when the key is absent, the store is unreachable, or the
/// payload is malformed — the caller proceeds with local config in every
/// one of those cases.
pub async fn fetch_remote(
    store: &dyn CoordinationStore,
    identity: &Identity,
    prefix: &str,
) -> Option<VersionedConfig> {
    let key = format!("{}/{}", prefix.trim_end_matches('/'), identity);

    let payload = match store.fetch(&key).await {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            debug!(%key, "no remote config published");
            return None;
        }
        Err(err @ StoreError::Unreachable(_)) => {
            warn!(%key, error = %err, "coordination store unreachable, using local config");
            return None;
        }
        Err(err @ StoreError::Malformed(_)) => {
            warn!(%key, error = %err, "coordination store response unusable, using local config");
            return None;
        }
    };

    match parse_payload(&payload) {
        Ok(remote) => {
            debug!(%key, version = remote.version, "remote config fetched");
            Some(remote)
        }
        Err(err) => {
            warn!(%key, error = %err, "remote config malformed, using local config");
            None
        }
    }
}

/// Sniff and parse a store payload into a remote-tagged config.
///
/// Any failure — unparseable text, or a missing/non-integer
/// `conf-version` — is a malformed blob.
pub fn parse_payload(payload: &str) -> Result<VersionedConfig, StoreError> {
    let format = classify_payload(payload);

    let data = parse(format, payload).map_err(|e| StoreError::Malformed(e.to_string()))?;

    VersionedConfig::new(data, ConfigSource::Remote)
        .map_err(|e| StoreError::Malformed(e.to_string()))
}
