//! Session and security access tracking
//!
//! The tracker derives the ECU's diagnostic session and security level
//! from the requests the dashboard sends. The security handshake drives the
//! two-step seed/key exchange on top of the controller.

mod security;
mod tracker;

pub use security::{extract_seed, FixedKey, KeyAlgorithm, SecurityHandshake, XorKey};
pub use tracker::{SessionTracker, Transition};

use serde::{Deserialize, Serialize};

use crate::uds::codec::is_negative_response;

/// When a request's state transition is applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Apply as soon as the bridge answered, whatever the answer
    #[default]
    Optimistic,
    /// Apply only if the answer is not a `7F` negative response
    ConfirmedPositive,
}

impl TransitionPolicy {
    /// Whether a response with this payload lets the transition through
    pub fn permits(&self, response_payload: &str) -> bool {
        match self {
            TransitionPolicy::Optimistic => true,
            TransitionPolicy::ConfirmedPositive => !is_negative_response(response_payload),
        }
    }
}
