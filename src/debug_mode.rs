// src/debug_mode.rs

//! Debug override resolution.
//!
//! Setting `STREAMBOOT_DEBUG_CONF=<path>` at launch swaps the entire config
//! source for the named file and puts the boot in debug mode:
//!
//! - remote fetch is short-circuited (the override file is authoritative)
//! - the execution topology is forced to `local`
//! - the per-partition consumption rate is clamped, keeping debug runs cheap
//!
//! Whether or not debug is active, the resolver stamps two audit fields
//! into the resolved config: the debug flag as a string, and the original
//! raw config source text, base64-encoded so it survives any transport
//! the resolved config is later shipped over.

use crate::config::{keys, CONF_ENV, DEFAULT_CONF_PATH};
use crate::resolve::ResolvedConfig;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Environment variable naming the debug config file.
pub const DEBUG_CONF_ENV: &str = "STREAMBOOT_DEBUG_CONF";

/// Rate cap applied to `max-rate-per-partition` in debug runs.
pub const DEBUG_MAX_RATE: &str = "10";

/// Topology value forced in debug runs.
pub const LOCAL_EXECUTION_MODE: &str = "local";

/// The config file the boot will load, and whether the debug override
/// selected it.
#[derive(Debug, Clone)]
pub struct ConfSource {
    pub path: PathBuf,
    pub debug: bool,
}

/// Pick the config source from the environment.
///
/// Precedence: `STREAMBOOT_DEBUG_CONF` (debug mode), then
/// `STREAMBOOT_CONF`, then the default path.
pub fn select_conf_source() -> ConfSource {
    if let Some(path) = env_path(DEBUG_CONF_ENV) {
        info!(path = %path.display(), "debug override active, remote fetch disabled");
        return ConfSource { path, debug: true };
    }

    let path = env_path(CONF_ENV).unwrap_or_else(|| PathBuf::from(DEFAULT_CONF_PATH));
    ConfSource { path, debug: false }
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Apply debug resolution to the reconciled config.
///
/// Runs on every boot: debug runs get the topology force and rate clamp,
/// all runs get the audit fields.
pub fn apply(resolved: &mut ResolvedConfig, debug: bool, raw_source: &str) {
    if debug {
        resolved.set(keys::EXECUTION_MODE, LOCAL_EXECUTION_MODE);
        resolved.set(keys::MAX_RATE_PER_PARTITION, DEBUG_MAX_RATE);
        resolved.debug = true;
    }

    resolved.set(keys::DEBUG, if debug { "true" } else { "false" });
    resolved.set(keys::CONF_SOURCE_B64, BASE64.encode(raw_source));
}
