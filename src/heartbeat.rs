// src/heartbeat.rs

//! Liveness reporting.
//!
//! The heartbeat reporter is a start/stop collaborator whose lifetime is
//! bound exactly to the window between context start and context stop. It
//! runs concurrently with the bootstrap's blocking wait for termination.
//!
//! Each beat emits a structured log line with the job's name, run id, pid,
//! best-effort RSS and a timestamp. When `heartbeat-endpoint` is
//! configured, the same payload is POSTed there as JSON.
//!
//! Reporting is best-effort throughout:
//! - a failed POST is logged and the next beat tries again
//! - if the process cannot be inspected, memory is reported as `null`
//! Nothing the reporter does can fail the job.

use crate::config::keys;
use crate::resolve::ResolvedConfig;
use crate::run_id::RunId;
use std::time::Duration;
use sysinfo::{Pid, System};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Interval used when `heartbeat-interval-ms` is not configured.
pub const DEFAULT_INTERVAL_MS: u64 = 30_000;

/// A start/stop liveness collaborator.
///
/// `start` receives the frozen resolved config and the run id because the
/// reporter is constructed by the embedder before either exists.
pub trait HeartbeatReporter: Send {
    fn start(&mut self, config: &ResolvedConfig, run_id: &RunId);
    fn stop(&mut self);
}

/// The default reporter: a tokio interval task.
#[derive(Debug, Default)]
pub struct Heartbeat {
    handle: Option<JoinHandle<()>>,
}

impl Heartbeat {
    pub fn new() -> Self {
        Self { handle: None }
    }
}

impl HeartbeatReporter for Heartbeat {
    fn start(&mut self, config: &ResolvedConfig, run_id: &RunId) {
        let app = config
            .get(keys::APP_NAME)
            .or_else(|| config.get(keys::MAIN_CLASS))
            .unwrap_or("unknown")
            .to_string();
        let endpoint = config.get(keys::HEARTBEAT_ENDPOINT).map(str::to_string);
        let interval_ms = config.u64_or(keys::HEARTBEAT_INTERVAL_MS, DEFAULT_INTERVAL_MS);
        let run_id = run_id.clone();

        info!(%app, interval_ms, endpoint = endpoint.as_deref(), "heartbeat starting");

        let handle = tokio::spawn(async move {
            let client = reqwest::Client::new();
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            // The first tick fires immediately; that first beat doubles as
            // the "job is up" signal.
            loop {
                ticker.tick().await;
                beat(&client, &app, &run_id, endpoint.as_deref()).await;
            }
        });

        self.handle = Some(handle);
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("heartbeat stopped");
        }
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn beat(client: &reqwest::Client, app: &str, run_id: &RunId, endpoint: Option<&str>) {
    let pid = std::process::id();
    let rss_kb = sample_rss_kb(pid);

    debug!(%app, %run_id, pid, rss_kb, "heartbeat");

    let Some(endpoint) = endpoint else {
        return;
    };

    let payload = serde_json::json!({
        "app": app,
        "runId": run_id,
        "pid": pid,
        "rssKb": rss_kb,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    let result = client
        .post(endpoint)
        .json(&payload)
        .timeout(Duration::from_secs(10))
        .send()
        .await;

    match result {
        Ok(resp) if resp.status().is_success() => {}
        Ok(resp) => warn!(status = %resp.status(), "heartbeat endpoint rejected ping"),
        Err(err) => warn!(error = %err, "heartbeat ping failed"),
    }
}

/// Current RSS of this process in KB. Sampling is best-effort; `None` when
/// the platform or pid cannot be inspected.
fn sample_rss_kb(pid: u32) -> Option<u64> {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_process(pid);
    system.process(pid).map(|p| p.memory())
}
