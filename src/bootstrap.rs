// src/bootstrap.rs

//! End-to-end bootstrap sequencing.
//!
//! The stages run strictly in order, single-threaded:
//!
//! 1. select the config source (debug override or `STREAMBOOT_CONF`)
//! 2. load and validate the local config
//! 3. derive the job identity, fetch the remote config (skipped in debug)
//! 4. reconcile versions, apply debug resolution, run `configure`, freeze
//! 5. recover or create the execution context
//! 6. drive the lifecycle: `before_started` → start → heartbeat start →
//!    `after_started` → await termination → heartbeat stop → `before_stop`
//!    → stop
//!
//! Hook implementors depend on that exact ordering: `before_started` and
//! `after_started` observe a context that has not / has been started, and
//! `before_stop` observes a context that has stopped producing batches.

use crate::cli::{self, CheckpointDirective};
use crate::config::LocalConfig;
use crate::debug_mode::{self, ConfSource};
use crate::heartbeat::{Heartbeat, HeartbeatReporter};
use crate::hooks::JobHooks;
use crate::identity::Identity;
use crate::recovery;
use crate::remote::fetch_remote;
use crate::resolve::{reconcile, ConfigSource, ResolvedConfig, VersionedConfig};
use crate::run_id::RunId;
use crate::runtime::{ExecutionContext, StreamingRuntime};
use crate::store::{CoordinationStore, HttpCoordinationStore};
use anyhow::Result;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/* ---------------- configuration stages ---------------- */

/// Load and validate the local config file.
pub fn load_local(source: &ConfSource) -> Result<LocalConfig> {
    let local = LocalConfig::load(&source.path)?;
    local.validate()?;
    Ok(local)
}

/// Derive the job identity and look up the centrally published config.
///
/// `store` is `None` when no endpoint is configured or the boot is in
/// debug mode; both mean "local only", immediately and silently.
pub async fn resolve_remote(
    local: &LocalConfig,
    store: Option<&dyn CoordinationStore>,
) -> Option<VersionedConfig> {
    let store = store?;

    // Validated upstream; main-class is always present here.
    let main_class = local.main_class().unwrap_or_default();
    let identity = Identity::derive(local.app_name(), main_class);
    info!(%identity, "job identity derived");

    fetch_remote(store, &identity, local.coordination_prefix()).await
}

/// Reconcile, apply debug resolution, run the `configure` hook, freeze.
pub fn finalize(
    local: &LocalConfig,
    remote: Option<VersionedConfig>,
    debug: bool,
    hooks: &mut dyn JobHooks,
) -> Result<ResolvedConfig> {
    let local_versioned = VersionedConfig::new(local.data.clone(), ConfigSource::Local)?;

    let mut resolved = reconcile(local_versioned, remote);
    debug_mode::apply(&mut resolved, debug, &local.raw);
    hooks.configure(&mut resolved);

    info!(
        version = resolved.effective_version,
        source = %resolved.winning_source,
        debug = resolved.debug,
        "configuration frozen"
    );
    Ok(resolved)
}

/* ---------------- lifecycle ---------------- */

/// Recover the execution context and drive it through its lifecycle.
///
/// Blocks (at the single suspension point) until the job terminates.
pub async fn execute<R: StreamingRuntime>(
    runtime: &R,
    hooks: &mut dyn JobHooks,
    reporter: &mut dyn HeartbeatReporter,
    directive: &CheckpointDirective,
    config: &ResolvedConfig,
) -> Result<()> {
    let (mut context, state) = recovery::recover(runtime, directive, config, hooks).await?;

    let run_id = RunId::new();
    info!(%run_id, state = ?state, "execution context ready");

    hooks.before_started(&mut context);
    context.start().await?;
    reporter.start(config, &run_id);
    hooks.after_started(&mut context);

    info!("job started, awaiting termination");
    let termination = context.await_termination().await;

    reporter.stop();
    hooks.before_stop(&mut context);
    context.stop().await?;

    termination
}

/// The whole boot, from an already-parsed checkpoint directive.
pub async fn run<R: StreamingRuntime>(
    runtime: &R,
    hooks: &mut dyn JobHooks,
    reporter: &mut dyn HeartbeatReporter,
    directive: CheckpointDirective,
) -> Result<()> {
    let source = debug_mode::select_conf_source();
    info!(path = %source.path.display(), debug = source.debug, "loading local config");

    let local = load_local(&source)?;

    let store = if source.debug { None } else { store_for(&local) };
    let remote =
        resolve_remote(&local, store.as_ref().map(|s| s as &dyn CoordinationStore)).await;

    let config = finalize(&local, remote, source.debug, hooks)?;

    execute(runtime, hooks, reporter, &directive, &config).await
}

fn store_for(local: &LocalConfig) -> Option<HttpCoordinationStore> {
    let endpoint = local.coordination_endpoint()?;
    let timeout = Duration::from_millis(local.coordination_timeout_ms());
    Some(HttpCoordinationStore::new(endpoint, timeout))
}

/* ---------------- process entry ---------------- */

/// Full process entry point for an embedding binary.
///
/// Wires up `.env` loading, tracing, argument parsing (usage + exit 1 on
/// unknown flags) and the default heartbeat reporter, then runs the boot.
/// Any fatal bootstrap error is reported to stderr and terminates the
/// process with exit code 1.
pub async fn launch<R: StreamingRuntime>(runtime: R, mut hooks: impl JobHooks) {
    dotenvy::dotenv().ok();
    init_tracing();

    let directive = cli::parse_or_usage();
    let mut reporter = Heartbeat::new();

    if let Err(err) = run(&runtime, &mut hooks, &mut reporter, directive).await {
        error!("bootstrap failed: {err:#}");
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
