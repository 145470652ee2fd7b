// src/runtime.rs

//! The seam to the external streaming runtime.
//!
//! The bootstrap never looks inside the runtime: it constructs or restores
//! exactly one execution context per process, starts it, blocks on its
//! termination, and stops it. Everything else — batch scheduling, fault
//! tolerance, parallelism — is the runtime's business.

use crate::resolve::ResolvedConfig;
use anyhow::Result;
use async_trait::async_trait;

/// A running (or runnable) streaming job: the opaque long-lived handle the
/// bootstrap drives through its lifecycle.
#[async_trait]
pub trait ExecutionContext: Send {
    /// Begin producing batches.
    async fn start(&mut self) -> Result<()>;

    /// Block until the job terminates. This is the bootstrap's single
    /// suspension point.
    async fn await_termination(&mut self) -> Result<()>;

    /// Release the context's resources. Must be safe to call after
    /// termination has already been observed.
    async fn stop(&mut self) -> Result<()>;

    /// Point subsequent checkpoints at `dir`. Called on restored and
    /// freshly created contexts alike.
    fn set_checkpoint_dir(&mut self, dir: &str);
}

/// Factory half of the runtime seam.
#[async_trait]
pub trait StreamingRuntime: Send + Sync {
    type Context: ExecutionContext;

    /// Construct a fresh execution context from the frozen resolved
    /// config. The bootstrap invokes this at most once per process.
    async fn create_context(&self, config: &ResolvedConfig) -> Result<Self::Context>;

    /// Load a previously persisted checkpoint.
    ///
    /// `Ok(None)` means no checkpoint exists at `path`; `Err` means one
    /// exists but could not be loaded. The recovery orchestrator treats
    /// both as restore failure, logged differently.
    async fn load_checkpoint(&self, path: &str) -> Result<Option<Self::Context>>;
}
