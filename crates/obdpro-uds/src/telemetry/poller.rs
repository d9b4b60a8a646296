//! Fixed-interval telemetry poller
//!
//! Fetches a sensor snapshot from the bridge on every tick, keeps a rolling
//! history and publishes the bridge's connectivity. A failed fetch only
//! flips the connectivity flag; the history is left as it was.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use obdpro_core::{BridgeTransport, Clock, TelemetrySnapshot};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::TelemetryConfig;

/// State shared with the polling task
struct PollerShared {
    bridge: Arc<dyn BridgeTransport>,
    clock: Arc<dyn Clock>,
    history_len: usize,
    history: RwLock<VecDeque<TelemetrySnapshot>>,
    connected_tx: watch::Sender<bool>,
    snapshot_tx: broadcast::Sender<TelemetrySnapshot>,
    /// Bumped on every start/stop; a poll from an older generation is discarded
    generation: AtomicU64,
}

impl PollerShared {
    async fn poll(&self, generation: Option<u64>) -> bool {
        let result = self.bridge.fetch_telemetry().await;

        let mut history = self.history.write();
        if let Some(generation) = generation {
            if self.generation.load(Ordering::SeqCst) != generation {
                debug!("Discarding telemetry from a stopped poller");
                return false;
            }
        }

        match result {
            Ok(reading) => {
                let snapshot = TelemetrySnapshot::new(reading, self.clock.now());
                history.push_back(snapshot);
                while history.len() > self.history_len {
                    history.pop_front();
                }

                self.set_connected(true);
                // No receivers is fine
                let _ = self.snapshot_tx.send(snapshot);
                true
            }
            Err(e) => {
                if *self.connected_tx.borrow() {
                    warn!(endpoint = %self.bridge.endpoint(), error = %e, "Telemetry link lost");
                } else {
                    debug!(error = %e, "Telemetry fetch failed");
                }
                self.set_connected(false);
                false
            }
        }
    }

    /// Invalidate in-flight polls; taken under the history lock so a poll
    /// that already checked its generation finishes before this returns
    fn next_generation(&self) -> u64 {
        let _history = self.history.write();
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn set_connected(&self, connected: bool) {
        self.connected_tx.send_if_modified(|current| {
            if *current == connected {
                false
            } else {
                *current = connected;
                true
            }
        });
    }
}

/// Polls the bridge for telemetry on a fixed interval
pub struct TelemetryPoller {
    shared: Arc<PollerShared>,
    interval: Duration,
    poll_handle: Mutex<Option<JoinHandle<()>>>,
}

impl TelemetryPoller {
    pub fn new(
        bridge: Arc<dyn BridgeTransport>,
        clock: Arc<dyn Clock>,
        config: &TelemetryConfig,
    ) -> Self {
        let (connected_tx, _) = watch::channel(false);
        let (snapshot_tx, _) = broadcast::channel(64);
        let history_len = config.history_len.max(1);
        Self {
            shared: Arc::new(PollerShared {
                bridge,
                clock,
                history_len,
                history: RwLock::new(VecDeque::with_capacity(history_len)),
                connected_tx,
                snapshot_tx,
                generation: AtomicU64::new(0),
            }),
            interval: config.poll_interval(),
            poll_handle: Mutex::new(None),
        }
    }

    /// Start polling; the first fetch happens immediately
    ///
    /// Restarting an already running poller replaces its task.
    pub fn start(&self) {
        let generation = self.shared.next_generation();
        let shared = self.shared.clone();
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if shared.generation.load(Ordering::SeqCst) != generation {
                    return;
                }
                shared.poll(Some(generation)).await;
            }
        });

        if let Some(previous) = self.poll_handle.lock().replace(handle) {
            previous.abort();
        }
        info!(
            endpoint = %self.shared.bridge.endpoint(),
            interval_ms = self.interval.as_millis() as u64,
            "Telemetry polling started"
        );
    }

    /// Stop polling; no state changes after this returns
    pub fn stop(&self) {
        self.shared.next_generation();
        if let Some(handle) = self.poll_handle.lock().take() {
            handle.abort();
            info!("Telemetry polling stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.poll_handle
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Fetch one snapshot outside the timer. Returns whether it succeeded.
    pub async fn poll_once(&self) -> bool {
        self.shared.poll(None).await
    }

    /// Rolling history, oldest first
    pub fn history(&self) -> Vec<TelemetrySnapshot> {
        self.shared.history.read().iter().copied().collect()
    }

    pub fn latest(&self) -> Option<TelemetrySnapshot> {
        self.shared.history.read().back().copied()
    }

    pub fn is_connected(&self) -> bool {
        *self.shared.connected_tx.borrow()
    }

    /// Connectivity changes (only edges are published)
    pub fn connectivity(&self) -> watch::Receiver<bool> {
        self.shared.connected_tx.subscribe()
    }

    /// Every successful snapshot as it arrives
    pub fn snapshots(&self) -> broadcast::Receiver<TelemetrySnapshot> {
        self.shared.snapshot_tx.subscribe()
    }
}

impl Drop for TelemetryPoller {
    fn drop(&mut self) {
        self.shared.next_generation();
        if let Some(handle) = self.poll_handle.get_mut().take() {
            handle.abort();
        }
    }
}
