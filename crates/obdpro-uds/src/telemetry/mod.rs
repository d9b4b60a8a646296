//! Live telemetry polling

mod poller;

pub use poller::TelemetryPoller;
