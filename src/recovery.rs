// src/recovery.rs

//! Checkpoint recovery: decide how the one execution context of this
//! process comes to exist.
//!
//! The directive's path picks the entry state: empty means no recovery was
//! requested (`NoCheckpoint`), non-empty means try the persisted checkpoint
//! first (`AttemptRestore`). Restore and fresh construction are mutually
//! exclusive; whichever path is taken, the context factory runs at most
//! once per process.

use crate::cli::CheckpointDirective;
use crate::error::BootstrapError;
use crate::hooks::JobHooks;
use crate::resolve::ResolvedConfig;
use crate::runtime::{ExecutionContext, StreamingRuntime};
use anyhow::Result;
use tracing::{error, info, warn};

/// States of the recovery machine. `Restored`, `FreshCreate` and `Failed`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    NoCheckpoint,
    AttemptRestore,
    Restored,
    FreshCreate,
    Failed,
}

/// Obtain the process's execution context, restored or fresh.
///
/// On the fresh path the runtime's factory is invoked exactly once, and the
/// user `handle` hook wires the job's processing logic onto the new
/// context. On a successful restore the factory is not invoked at all: the
/// restored context already carries its prior wiring.
///
/// Returns the context together with the terminal state reached.
pub async fn recover<R: StreamingRuntime>(
    runtime: &R,
    directive: &CheckpointDirective,
    config: &ResolvedConfig,
    hooks: &mut dyn JobHooks,
) -> Result<(R::Context, RecoveryState)> {
    let initial = if directive.wants_restore() {
        RecoveryState::AttemptRestore
    } else {
        RecoveryState::NoCheckpoint
    };
    info!(state = ?initial, path = %directive.path, "checkpoint recovery starting");

    let (mut context, terminal) = match initial {
        RecoveryState::NoCheckpoint => {
            let context = fresh_create(runtime, config, hooks).await?;
            (context, RecoveryState::FreshCreate)
        }

        _ => match runtime.load_checkpoint(&directive.path).await {
            Ok(Some(context)) => {
                info!(path = %directive.path, "checkpoint restored");
                (context, RecoveryState::Restored)
            }
            Ok(None) => {
                warn!(path = %directive.path, "no checkpoint found");
                after_restore_failure(runtime, directive, config, hooks).await?
            }
            Err(err) => {
                warn!(path = %directive.path, error = %err, "checkpoint restore failed");
                after_restore_failure(runtime, directive, config, hooks).await?
            }
        },
    };

    // Restored or fresh, the context checkpoints to the requested path
    // from here on — a fresh context that was never restored still needs
    // its checkpoint directory pointed somewhere.
    if !directive.path.is_empty() {
        context.set_checkpoint_dir(&directive.path);
    }

    info!(state = ?terminal, "checkpoint recovery finished");
    Ok((context, terminal))
}

async fn after_restore_failure<R: StreamingRuntime>(
    runtime: &R,
    directive: &CheckpointDirective,
    config: &ResolvedConfig,
    hooks: &mut dyn JobHooks,
) -> Result<(R::Context, RecoveryState)> {
    if directive.create_on_error {
        let context = fresh_create(runtime, config, hooks).await?;
        Ok((context, RecoveryState::FreshCreate))
    } else {
        error!(state = ?RecoveryState::Failed, path = %directive.path, "restore failed and fresh creation is disabled");
        Err(BootstrapError::RestoreFailed {
            path: directive.path.clone(),
        }
        .into())
    }
}

async fn fresh_create<R: StreamingRuntime>(
    runtime: &R,
    config: &ResolvedConfig,
    hooks: &mut dyn JobHooks,
) -> Result<R::Context> {
    let mut context = runtime.create_context(config).await?;
    hooks.handle(&mut context);
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigMap;
    use crate::resolve::{reconcile, ConfigSource, VersionedConfig};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct TestContext {
        checkpoint_dir: Option<String>,
    }

    #[async_trait]
    impl ExecutionContext for TestContext {
        async fn start(&mut self) -> Result<()> {
            Ok(())
        }
        async fn await_termination(&mut self) -> Result<()> {
            Ok(())
        }
        async fn stop(&mut self) -> Result<()> {
            Ok(())
        }
        fn set_checkpoint_dir(&mut self, dir: &str) {
            self.checkpoint_dir = Some(dir.to_string());
        }
    }

    enum Restore {
        Found,
        Missing,
        LoadError,
    }

    struct MockRuntime {
        restore: Restore,
        created: AtomicUsize,
        load_calls: AtomicUsize,
    }

    impl MockRuntime {
        fn new(restore: Restore) -> Self {
            Self {
                restore,
                created: AtomicUsize::new(0),
                load_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl StreamingRuntime for MockRuntime {
        type Context = TestContext;

        async fn create_context(&self, _config: &ResolvedConfig) -> Result<TestContext> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(TestContext::default())
        }

        async fn load_checkpoint(&self, _path: &str) -> Result<Option<TestContext>> {
            self.load_calls.fetch_add(1, Ordering::SeqCst);
            match self.restore {
                Restore::Found => Ok(Some(TestContext::default())),
                Restore::Missing => Ok(None),
                Restore::LoadError => Err(anyhow!("checkpoint metadata corrupt")),
            }
        }
    }

    struct WiringHooks {
        handled: usize,
    }

    impl JobHooks for WiringHooks {
        fn handle(&mut self, _context: &mut dyn ExecutionContext) {
            self.handled += 1;
        }
    }

    fn config() -> ResolvedConfig {
        let mut map = ConfigMap::new();
        map.insert("main-class".to_string(), "com.acme.Orders".to_string());
        map.insert("conf-version".to_string(), "1".to_string());
        let local = VersionedConfig::new(map, ConfigSource::Local).unwrap();
        reconcile(local, None)
    }

    fn directive(path: &str, create_on_error: bool) -> CheckpointDirective {
        CheckpointDirective {
            path: path.to_string(),
            create_on_error,
        }
    }

    #[tokio::test]
    async fn empty_path_goes_straight_to_fresh_create() {
        let runtime = MockRuntime::new(Restore::Found);
        let mut hooks = WiringHooks { handled: 0 };

        let (_, state) = recover(&runtime, &directive("", true), &config(), &mut hooks)
            .await
            .unwrap();

        assert_eq!(state, RecoveryState::FreshCreate);
        assert_eq!(runtime.created.load(Ordering::SeqCst), 1);
        assert_eq!(runtime.load_calls.load(Ordering::SeqCst), 0);
        assert_eq!(hooks.handled, 1);
    }

    #[tokio::test]
    async fn successful_restore_skips_the_factory() {
        let runtime = MockRuntime::new(Restore::Found);
        let mut hooks = WiringHooks { handled: 0 };

        let (context, state) = recover(&runtime, &directive("/ck", true), &config(), &mut hooks)
            .await
            .unwrap();

        assert_eq!(state, RecoveryState::Restored);
        assert_eq!(runtime.created.load(Ordering::SeqCst), 0);
        assert_eq!(hooks.handled, 0);
        assert_eq!(context.checkpoint_dir.as_deref(), Some("/ck"));
    }

    #[tokio::test]
    async fn restore_failure_without_fallback_is_fatal() {
        let runtime = MockRuntime::new(Restore::LoadError);
        let mut hooks = WiringHooks { handled: 0 };

        let err = recover(&runtime, &directive("/ck", false), &config(), &mut hooks)
            .await
            .unwrap_err();

        let kind = err.downcast_ref::<BootstrapError>().unwrap();
        assert!(matches!(kind, BootstrapError::RestoreFailed { path } if path == "/ck"));
        assert_eq!(runtime.created.load(Ordering::SeqCst), 0);
        assert_eq!(hooks.handled, 0);
    }

    #[tokio::test]
    async fn restore_failure_with_fallback_creates_fresh() {
        let runtime = MockRuntime::new(Restore::LoadError);
        let mut hooks = WiringHooks { handled: 0 };

        let (context, state) = recover(&runtime, &directive("/ck", true), &config(), &mut hooks)
            .await
            .unwrap();

        assert_eq!(state, RecoveryState::FreshCreate);
        assert_eq!(runtime.created.load(Ordering::SeqCst), 1);
        assert_eq!(hooks.handled, 1);
        // The fresh context still checkpoints to the requested path.
        assert_eq!(context.checkpoint_dir.as_deref(), Some("/ck"));
    }

    #[tokio::test]
    async fn missing_checkpoint_counts_as_restore_failure() {
        let runtime = MockRuntime::new(Restore::Missing);
        let mut hooks = WiringHooks { handled: 0 };

        let (_, state) = recover(&runtime, &directive("/ck", true), &config(), &mut hooks)
            .await
            .unwrap();

        assert_eq!(state, RecoveryState::FreshCreate);
        assert_eq!(runtime.created.load(Ordering::SeqCst), 1);
    }
}
