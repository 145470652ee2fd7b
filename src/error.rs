// src/error.rs

//! Typed error kinds for the bootstrap contract.
//!
//! Most of the crate returns `anyhow::Result`, but the failures the launch
//! contract names get their own kinds here so callers (and tests) can tell
//! them apart after the fact with `downcast_ref`.

use crate::resolve::ConfigSource;
use thiserror::Error;

/// Fatal bootstrap failures.
///
/// Every variant here terminates the launch before an execution context
/// exists (exit code 1 at the process boundary).
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The local config file extension selects no known parser.
    #[error("unsupported config format {extension:?} for {path} (expected .properties, .yml or .yaml)")]
    UnsupportedFormat { path: String, extension: String },

    /// A required config key is missing or empty.
    #[error("required config key {key:?} is missing or empty")]
    MissingKey { key: &'static str },

    /// `conf-version` did not parse as an integer.
    #[error("conf-version {value:?} from {source} config is not an integer")]
    InvalidVersion { value: String, source: ConfigSource },

    /// Checkpoint restore failed and the directive forbids fresh creation.
    #[error("checkpoint restore from {path:?} failed and --createOnError is false")]
    RestoreFailed { path: String },
}

/// Coordination store failures.
///
/// Unreachable and malformed are deliberately distinct kinds: both degrade
/// to "remote absent", but they are logged separately so an operator can
/// tell a network problem from a bad published blob.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached (connect error, timeout, HTTP failure).
    #[error("coordination store unreachable: {0}")]
    Unreachable(String),

    /// The store answered with a payload that does not parse as config.
    #[error("coordination store returned a malformed payload: {0}")]
    Malformed(String),
}
