//! obdpro-core - Core traits and types for the diagnostic dashboard
//!
//! This crate provides the shared models and the collaborator seams
//! (hardware bridge, AI assistant, wall clock) that the UDS layer is
//! written against.

pub mod assistant;
pub mod bridge;
pub mod clock;
pub mod error;
pub mod models;

pub use assistant::{AssistantBackend, AssistantProfile, CompletionRequest};
pub use bridge::{BridgeTransport, ServiceReply};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{BridgeError, BridgeResult};
pub use models::*;
