// src/hooks.rs

//! User-supplied lifecycle hooks.
//!
//! Jobs customise the bootstrap by implementing the hooks they need; every
//! method defaults to a no-op. The bootstrap catches nothing a hook raises:
//! a panic inside a hook propagates to the process default handler. That
//! fail-fast behaviour is deliberate and part of the contract.

use crate::resolve::ResolvedConfig;
use crate::runtime::ExecutionContext;

/// Extension points around config resolution and the context lifecycle.
///
/// Call order during a boot:
///
/// 1. `configure` — after debug resolution, last chance to adjust the
///    resolved config before it freezes
/// 2. `handle` — on a freshly created context, to wire the job's
///    processing logic (a restored context already carries its wiring and
///    skips this)
/// 3. `before_started` — context constructed, not yet started
/// 4. `after_started` — context started, heartbeat running
/// 5. `before_stop` — context has stopped producing batches, heartbeat
///    already stopped
pub trait JobHooks: Send {
    fn configure(&mut self, _config: &mut ResolvedConfig) {}

    fn handle(&mut self, _context: &mut dyn ExecutionContext) {}

    fn before_started(&mut self, _context: &mut dyn ExecutionContext) {}

    fn after_started(&mut self, _context: &mut dyn ExecutionContext) {}

    fn before_stop(&mut self, _context: &mut dyn ExecutionContext) {}
}

/// The default: a job with no custom behaviour at any extension point.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl JobHooks for NoopHooks {}
