//! Timer-driven procedure execution

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use obdpro_core::{ProcedureState, UdsSession};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::engine::{Procedure, ProcedureSpec};
use crate::controller::DiagnosticController;

const LINK_ERROR_MESSAGE: &str = "Link Error";

/// Result of asking a procedure to start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// The ECU must be switched to this session first
    NeedsSession(UdsSession),
    /// The kickoff request was dropped; the procedure is marked failed
    LinkError,
    /// Aborted while the kickoff request was in flight
    Cancelled,
}

/// Runs one procedure on a tokio timer
///
/// Every start and abort bumps an epoch counter. A tick only mutates state
/// if the epoch it was spawned under is still current, so a cancelled
/// timer never touches the procedure.
pub struct ProcedureRunner {
    controller: Arc<DiagnosticController>,
    procedure: Arc<Mutex<Procedure>>,
    epoch: Arc<AtomicU64>,
    state_tx: Arc<watch::Sender<ProcedureState>>,
    timer_handle: Mutex<Option<JoinHandle<()>>>,
}

impl ProcedureRunner {
    pub fn new(spec: ProcedureSpec, controller: Arc<DiagnosticController>) -> Self {
        let procedure = Procedure::new(spec);
        let (state_tx, _) = watch::channel(procedure.state().clone());
        Self {
            controller,
            procedure: Arc::new(Mutex::new(procedure)),
            epoch: Arc::new(AtomicU64::new(0)),
            state_tx: Arc::new(state_tx),
            timer_handle: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ProcedureState {
        self.procedure.lock().state().clone()
    }

    pub fn spec(&self) -> ProcedureSpec {
        self.procedure.lock().spec().clone()
    }

    /// Watch state changes (one update per tick)
    pub fn subscribe(&self) -> watch::Receiver<ProcedureState> {
        self.state_tx.subscribe()
    }

    /// Start from zero
    pub async fn start(&self) -> StartOutcome {
        self.launch(true).await
    }

    /// Continue from the progress reached before a failure
    pub async fn resume(&self) -> StartOutcome {
        self.launch(false).await
    }

    async fn launch(&self, from_zero: bool) -> StartOutcome {
        let spec = self.spec();

        if let Some(required) = spec.required_session {
            let current = self.controller.session();
            if current != required {
                info!(
                    procedure = %spec.name,
                    current = %current,
                    required = %required,
                    "Procedure needs a session change"
                );
                return StartOutcome::NeedsSession(required);
            }
        }

        let epoch = self.cancel_timer();

        if let Some(kickoff) = &spec.kickoff {
            if let Err(e) = self
                .controller
                .send_service(&kickoff.service_id, &kickoff.sub_function)
                .await
            {
                warn!(procedure = %spec.name, error = %e, "Kickoff request dropped");
                let mut procedure = self.procedure.lock();
                if self.epoch.load(Ordering::SeqCst) != epoch {
                    debug!(procedure = %spec.name, "Aborted during failed kickoff");
                    return StartOutcome::Cancelled;
                }
                procedure.fail(LINK_ERROR_MESSAGE);
                self.state_tx.send_replace(procedure.state().clone());
                return StartOutcome::LinkError;
            }
        }

        {
            let mut procedure = self.procedure.lock();
            if self.epoch.load(Ordering::SeqCst) != epoch {
                debug!(procedure = %spec.name, "Start superseded during kickoff");
                return StartOutcome::Cancelled;
            }
            if from_zero {
                procedure.start();
            } else {
                procedure.resume();
            }
            self.state_tx.send_replace(procedure.state().clone());
        }

        info!(procedure = %spec.name, from_zero, "Procedure started");
        let handle = self.spawn_timer(spec, epoch);
        *self.timer_handle.lock() = Some(handle);
        StartOutcome::Started
    }

    fn spawn_timer(&self, spec: ProcedureSpec, epoch: u64) -> JoinHandle<()> {
        let procedure = self.procedure.clone();
        let current_epoch = self.epoch.clone();
        let state_tx = self.state_tx.clone();

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(spec.interval).await;

                let state = {
                    let mut procedure = procedure.lock();
                    if current_epoch.load(Ordering::SeqCst) != epoch {
                        debug!(procedure = %spec.name, "Stale timer stopped");
                        return;
                    }
                    procedure.tick();
                    procedure.state().clone()
                };

                let running = state.is_running();
                if !running {
                    info!(procedure = %spec.name, status = %state.status, "Procedure finished");
                }
                state_tx.send_replace(state);
                if !running {
                    return;
                }
            }
        })
    }

    /// Stop the procedure: Idle, progress 0, "Procedure Terminated"
    ///
    /// If it was running and declares a stop request, that request is sent.
    pub async fn abort(&self) {
        let (was_running, spec) = {
            let mut procedure = self.procedure.lock();
            self.epoch.fetch_add(1, Ordering::SeqCst);
            let was_running = procedure.state().is_running();
            procedure.abort();
            self.state_tx.send_replace(procedure.state().clone());
            (was_running, procedure.spec().clone())
        };
        if let Some(handle) = self.timer_handle.lock().take() {
            handle.abort();
        }
        info!(procedure = %spec.name, "Procedure aborted");

        if !was_running {
            return;
        }
        if let Some(stop) = &spec.stop {
            if let Err(e) = self
                .controller
                .send_service(&stop.service_id, &stop.sub_function)
                .await
            {
                warn!(procedure = %spec.name, error = %e, "Stop request dropped");
            }
        }
    }

    /// Wait until the procedure is no longer running
    pub async fn wait(&self) -> ProcedureState {
        let mut rx = self.subscribe();
        loop {
            let state = rx.borrow_and_update().clone();
            if !state.is_running() {
                return state;
            }
            if rx.changed().await.is_err() {
                return self.state();
            }
        }
    }

    /// Cancel the timer without touching the state; returns the new epoch
    fn cancel_timer(&self) -> u64 {
        let epoch = {
            let _procedure = self.procedure.lock();
            self.epoch.fetch_add(1, Ordering::SeqCst) + 1
        };
        if let Some(handle) = self.timer_handle.lock().take() {
            handle.abort();
        }
        epoch
    }
}

impl Drop for ProcedureRunner {
    fn drop(&mut self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.timer_handle.get_mut().take() {
            handle.abort();
        }
    }
}
