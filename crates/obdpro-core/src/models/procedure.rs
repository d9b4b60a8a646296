//! Long-running procedure state (routines, flashing, security handshake)

use serde::{Deserialize, Serialize};

/// Status of a long-running procedure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcedureStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for ProcedureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProcedureStatus::Idle => "Idle",
            ProcedureStatus::Running => "Running",
            ProcedureStatus::Completed => "Completed",
            ProcedureStatus::Failed => "Failed",
        };
        f.write_str(s)
    }
}

/// Observable state of one procedure instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureState {
    pub name: String,
    /// Progress in percent, 0..=100
    pub progress: u8,
    pub status: ProcedureStatus,
    /// Free-text status line
    pub message: String,
}

impl ProcedureState {
    pub fn idle(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            progress: 0,
            status: ProcedureStatus::Idle,
            message: message.into(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == ProcedureStatus::Running
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            ProcedureStatus::Completed | ProcedureStatus::Failed
        )
    }
}
