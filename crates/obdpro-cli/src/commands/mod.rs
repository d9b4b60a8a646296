//! Command implementations for obdpro

pub mod assistant;
pub mod catalog;
pub mod dtc;
pub mod monitor;
pub mod procedure;
pub mod send;
pub mod unlock;

pub use assistant::{analyze, chat};
pub use catalog::catalog;
pub use dtc::dtc;
pub use monitor::monitor;
pub use procedure::{dpf, flash};
pub use send::{intent, send};
pub use unlock::unlock;
