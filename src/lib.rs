// src/lib.rs

//! streamboot
//!
//! Bootstrap for long-running, stateful streaming jobs.
//!
//! The crate owns the launch path of a job, up to and around the external
//! streaming runtime:
//!
//! - resolves the effective configuration from a local file and a centrally
//!   managed coordination store, with version-based conflict resolution and
//!   a debug-mode override
//! - decides whether the job resumes from a persisted checkpoint or starts
//!   fresh, guaranteeing exactly one execution context per process
//! - drives a fixed lifecycle of user hooks around context construction,
//!   start and shutdown, with a heartbeat reporter bound to the running
//!   window
//!
//! The streaming runtime itself is an injected collaborator behind the
//! [`runtime::StreamingRuntime`] trait. An embedding binary is two lines:
//!
//! ```rust,ignore
//! #[tokio::main]
//! async fn main() {
//!     streamboot::launch(MyRuntime::new(), MyHooks::default()).await;
//! }
//! ```
//!
//! There is intentionally *no stream-processing logic* in this crate.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod debug_mode;
pub mod error;
pub mod format;
pub mod heartbeat;
pub mod hooks;
pub mod identity;
pub mod recovery;
pub mod remote;
pub mod resolve;
pub mod run_id;
pub mod runtime;
pub mod store;

pub use bootstrap::{launch, run};
pub use cli::{CheckpointDirective, Cli};
pub use error::{BootstrapError, StoreError};
pub use heartbeat::{Heartbeat, HeartbeatReporter};
pub use hooks::{JobHooks, NoopHooks};
pub use resolve::{ConfigSource, ResolvedConfig};
pub use runtime::{ExecutionContext, StreamingRuntime};
