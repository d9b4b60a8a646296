//! obdpro-uds - UDS session/security state machine and message exchange
//!
//! This crate holds the diagnostic core of the dashboard:
//!
//! - **uds**: service catalog, request/response codec and DTC decoding
//! - **session**: session/security tracker and the seed/key handshake
//! - **controller**: the single entry point every request goes through;
//!   owns the message log, the tracker and the DTC store
//! - **procedure**: timed, progress-driven procedures (DPF regeneration,
//!   firmware flash)
//! - **telemetry**: fixed-interval sensor polling with connectivity tracking
//! - **assistant**: log analysis and support chat over an AI backend
//!
//! # Architecture
//!
//! ```text
//!  front-end (obdpro-cli)
//!        |
//!  SecurityHandshake / ProcedureRunner / TelemetryPoller
//!        |
//!  DiagnosticController
//!    codec -> MessageLog, SessionTracker, DtcStore
//!        |
//!  BridgeTransport (HTTP bridge in obdpro-client, or MockBridge)
//! ```

pub mod assistant;
pub mod config;
pub mod controller;
pub mod dtc_store;
pub mod error;
pub mod log;
pub mod procedure;
pub mod session;
pub mod telemetry;
pub mod transport;
pub mod uds;

pub use assistant::{ChatRole, ChatTurn, DiagnosticAssistant};
pub use config::DashboardConfig;
pub use controller::DiagnosticController;
pub use dtc_store::DtcStore;
pub use error::ConfigError;
pub use log::MessageLog;
pub use procedure::{ProcedureRunner, StartOutcome};
pub use session::{KeyAlgorithm, SecurityHandshake, SessionTracker, TransitionPolicy};
pub use telemetry::TelemetryPoller;
pub use transport::MockBridge;
pub use uds::{Addressing, ServiceIntent};
