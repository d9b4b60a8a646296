//! Session/security state machine

use obdpro_core::{EcuStatus, SecurityLevel, UdsSession};
use tracing::{debug, info};

use crate::uds::{
    hex_digits, parse_service_id, security_sub_function, service_id, session_type,
};

/// A state change caused by one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Session(UdsSession),
    Security(SecurityLevel),
}

/// Tracks the ECU's diagnostic session and security level
///
/// Only three requests move the state:
///
/// | sid | sub-function (first byte) | effect |
/// |-----|---------------------------|--------|
/// | 10  | 03                        | session -> Extended |
/// | 10  | 02                        | session -> Programming |
/// | 27  | 02 (with any key bytes)   | security -> Level 1 |
///
/// Everything else, including malformed ids, leaves the state alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTracker {
    session: UdsSession,
    security: SecurityLevel,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> UdsSession {
        self.session
    }

    pub fn security(&self) -> SecurityLevel {
        self.security
    }

    /// Apply the transition implied by a request, if any
    pub fn apply(&mut self, service_id: &str, sub_function: &str) -> Option<Transition> {
        let transition = Self::transition_for(service_id, sub_function)?;
        match transition {
            Transition::Session(session) => {
                info!(from = %self.session, to = %session, "Session changed");
                self.session = session;
            }
            Transition::Security(level) => {
                info!(from = %self.security, to = %level, "Security level changed");
                self.security = level;
            }
        }
        Some(transition)
    }

    /// The transition a request would cause, without applying it
    pub fn transition_for(service_id: &str, sub_function: &str) -> Option<Transition> {
        let sid = parse_service_id(service_id)?;
        let sub = first_sub_function_byte(sub_function)?;

        const SESSION_CONTROL: u32 = service_id::DIAGNOSTIC_SESSION_CONTROL as u32;
        const SECURITY_ACCESS: u32 = service_id::SECURITY_ACCESS as u32;

        match (sid, sub) {
            (SESSION_CONTROL, session_type::EXTENDED) => {
                Some(Transition::Session(UdsSession::Extended))
            }
            (SESSION_CONTROL, session_type::PROGRAMMING) => {
                Some(Transition::Session(UdsSession::Programming))
            }
            (SECURITY_ACCESS, security_sub_function::SEND_KEY) => {
                Some(Transition::Security(SecurityLevel::Level1))
            }
            _ => None,
        }
    }

    /// Return to the Default session and relock
    pub fn reset(&mut self) {
        debug!("Session tracker reset");
        self.session = UdsSession::Default;
        self.security = SecurityLevel::Locked;
    }

    /// Drop any granted security access, keeping the session
    pub fn relock(&mut self) {
        debug!("Security relocked");
        self.security = SecurityLevel::Locked;
    }

    /// Header status for the ECU at `address`
    pub fn status(&self, address: &str, name: &str, connected: bool) -> EcuStatus {
        EcuStatus {
            id: address.to_string(),
            name: name.to_string(),
            connected,
            active_session: self.session,
            security_access: self.security,
        }
    }
}

/// First whitespace-separated token of a sub-function string, read as one byte
fn first_sub_function_byte(sub_function: &str) -> Option<u8> {
    let token = sub_function.split_whitespace().next()?;
    let digits = hex_digits(token)?;
    if digits.len() > 2 {
        return None;
    }
    u8::from_str_radix(digits, 16).ok()
}
