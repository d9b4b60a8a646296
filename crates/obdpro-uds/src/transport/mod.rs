//! In-process bridge implementations
//!
//! The HTTP bridge lives in `obdpro-client`; this module only carries the
//! simulated bridge used by tests and the CLI's `--mock` mode.

mod mock;

pub use mock::MockBridge;
