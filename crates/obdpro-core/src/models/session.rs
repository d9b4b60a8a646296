//! Diagnostic session and security access models

use serde::{Deserialize, Serialize};

/// UDS diagnostic session the ECU is currently in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UdsSession {
    /// Default session (0x01)
    #[default]
    Default,
    /// Extended diagnostic session (0x03)
    Extended,
    /// Programming session (0x02)
    Programming,
    /// Safety system diagnostic session (0x04)
    Safety,
}

impl UdsSession {
    /// Label shown on the session indicator
    pub fn label(&self) -> &'static str {
        match self {
            UdsSession::Default => "Default Session",
            UdsSession::Extended => "Extended Session",
            UdsSession::Programming => "Programming Session",
            UdsSession::Safety => "Safety System Session",
        }
    }
}

impl std::fmt::Display for UdsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Security access level granted by the ECU
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityLevel {
    #[default]
    Locked,
    Level1,
    Level2,
    Full,
}

impl SecurityLevel {
    pub fn is_unlocked(&self) -> bool {
        !matches!(self, SecurityLevel::Locked)
    }
}

impl std::fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SecurityLevel::Locked => "Locked",
            SecurityLevel::Level1 => "Level 1",
            SecurityLevel::Level2 => "Level 2",
            SecurityLevel::Full => "Full",
        };
        f.write_str(s)
    }
}

/// Snapshot of the ECU connection as shown in the dashboard header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcuStatus {
    /// Physical request address (e.g. "0x7E0")
    pub id: String,
    /// ECU short name (e.g. "ECM")
    pub name: String,
    pub connected: bool,
    pub active_session: UdsSession,
    pub security_access: SecurityLevel,
}
