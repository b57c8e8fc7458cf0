//! Health probe — periodic upstream liveness check surfaced as a status
//! label. Failures degrade the label; they never block anything else, and
//! the time-based re-poll is the only retry.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::proxy::Upstream;

/// Tri-state backend status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeState {
    Checking,
    Connected,
    Error,
}

/// Latest probe result: machine state plus a human-readable detail line.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeStatus {
    pub state: ProbeState,
    pub detail: String,
}

impl ProbeStatus {
    fn checking() -> Self {
        Self {
            state: ProbeState::Checking,
            detail: "Checking backend...".to_string(),
        }
    }
}

/// Spawn the probe loop. The returned receiver always holds the latest
/// status; the first check runs immediately, then every `interval`.
pub fn spawn_probe(
    upstream: Upstream,
    interval: Duration,
) -> (watch::Receiver<ProbeStatus>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(ProbeStatus::checking());
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let status = check(&upstream).await;
            debug!(state = ?status.state, detail = %status.detail, "Health probe");
            if tx.send(status).is_err() {
                // All receivers dropped; nothing left to report to.
                break;
            }
        }
    });
    (rx, handle)
}

async fn check(upstream: &Upstream) -> ProbeStatus {
    match upstream.health().await {
        Ok(reply) if reply.status < 400 => {
            let backend_status = reply
                .body
                .get("status")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            let model = reply
                .body
                .get("model")
                .and_then(|v| v.as_str())
                .unwrap_or("n/a");
            ProbeStatus {
                state: ProbeState::Connected,
                detail: format!("Backend: {backend_status} | Model: {model}"),
            }
        }
        Ok(reply) => ProbeStatus {
            state: ProbeState::Error,
            detail: format!("Backend error (HTTP {})", reply.status),
        },
        Err(e) => ProbeStatus {
            state: ProbeState::Error,
            detail: format!("Backend offline: {e}"),
        },
    }
}
