// src/identity.rs

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Deterministic identity of a job, used as the lookup key in the
/// coordination store.
///
/// Derived from `app-name`, falling back to `main-class` when no app name
/// is configured. The same name always yields the same identity, so local
/// and remote lookups agree across restarts and across hosts.
///
/// This is a lookup key, not a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity(String);

impl Identity {
    /// Derive the identity from the configured names.
    ///
    /// A present-but-blank `app-name` counts as absent.
    pub fn derive(app_name: Option<&str>, main_class: &str) -> Self {
        let seed = app_name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(main_class);

        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
