//! Shared data models

mod dtc;
mod exchange;
mod procedure;
mod session;
mod telemetry;

pub use dtc::*;
pub use exchange::*;
pub use procedure::*;
pub use session::*;
pub use telemetry::*;
