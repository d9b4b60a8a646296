//! Timed, progress-driven procedures (DPF regeneration, firmware flash)
//!
//! [`Procedure`] is the pure state machine; [`ProcedureRunner`] drives it
//! from a tokio timer and sends the procedure's requests through the
//! controller.

mod engine;
mod presets;
mod runner;

pub use engine::{Procedure, ProcedureSpec, ServiceRequest, ABORTED_MESSAGE};
pub use presets::{dpf_message, dpf_regeneration, firmware_flash, flash_message};
pub use runner::{ProcedureRunner, StartOutcome};
