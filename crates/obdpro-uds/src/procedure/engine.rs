//! Procedure state machine

use std::time::Duration;

use obdpro_core::{ProcedureState, ProcedureStatus, UdsSession};

/// Message shown after an abort
pub const ABORTED_MESSAGE: &str = "Procedure Terminated";

const READY_MESSAGE: &str = "System Ready";

/// A (service id, sub-function) pair a procedure sends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    pub service_id: String,
    pub sub_function: String,
}

impl ServiceRequest {
    pub fn new(service_id: impl Into<String>, sub_function: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            sub_function: sub_function.into(),
        }
    }
}

/// Static description of a procedure
#[derive(Debug, Clone)]
pub struct ProcedureSpec {
    pub name: String,
    pub interval: Duration,
    /// Progress added per tick
    pub increment: u8,
    /// Progress at which the procedure completes (at most 100)
    pub ceiling: u8,
    /// Running message for a given progress
    pub message: fn(u8) -> String,
    pub terminal_message: String,
    /// Sent through the controller before the first tick
    pub kickoff: Option<ServiceRequest>,
    /// Sent through the controller when a running procedure is aborted
    pub stop: Option<ServiceRequest>,
    /// Session the ECU must be in before the procedure may start
    pub required_session: Option<UdsSession>,
}

/// One procedure instance
#[derive(Debug, Clone)]
pub struct Procedure {
    spec: ProcedureSpec,
    state: ProcedureState,
}

impl Procedure {
    pub fn new(spec: ProcedureSpec) -> Self {
        let state = ProcedureState::idle(spec.name.clone(), READY_MESSAGE);
        Self { spec, state }
    }

    pub fn spec(&self) -> &ProcedureSpec {
        &self.spec
    }

    pub fn state(&self) -> &ProcedureState {
        &self.state
    }

    /// Begin from zero
    pub fn start(&mut self) {
        self.state.progress = 0;
        self.state.status = ProcedureStatus::Running;
        self.state.message = (self.spec.message)(0);
    }

    /// Continue from the current progress
    ///
    /// A procedure that already reached its ceiling starts over.
    pub fn resume(&mut self) {
        if self.state.progress >= self.ceiling() {
            self.start();
            return;
        }
        self.state.status = ProcedureStatus::Running;
        self.state.message = (self.spec.message)(self.state.progress);
    }

    /// Advance one step. Returns `false` when the procedure is not running.
    pub fn tick(&mut self) -> bool {
        if !self.state.is_running() {
            return false;
        }

        let ceiling = self.ceiling();
        let progress = self
            .state
            .progress
            .saturating_add(self.spec.increment)
            .min(ceiling);
        self.state.progress = progress;

        if progress >= ceiling {
            self.state.status = ProcedureStatus::Completed;
            self.state.message = self.spec.terminal_message.clone();
        } else {
            self.state.message = (self.spec.message)(progress);
        }
        true
    }

    pub fn abort(&mut self) {
        self.state.status = ProcedureStatus::Idle;
        self.state.progress = 0;
        self.state.message = ABORTED_MESSAGE.to_string();
    }

    /// Stop with an error, keeping the progress reached so far
    pub fn fail(&mut self, message: impl Into<String>) {
        self.state.status = ProcedureStatus::Failed;
        self.state.message = message.into();
    }

    fn ceiling(&self) -> u8 {
        self.spec.ceiling.min(100)
    }
}
