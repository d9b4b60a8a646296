//! Hardware bridge abstraction
//!
//! The bridge is the small HTTP device sitting on the vehicle's diagnostic
//! port. It answers two kinds of calls: a telemetry snapshot and a single
//! UDS service exchange. Framing and ISO-TP segmentation happen on the
//! bridge, so this layer only ever sees service ids and payload strings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BridgeResult;
use crate::models::TelemetryReading;

/// Body of a UDS service reply as returned by the bridge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceReply {
    /// Free-form response payload; absent when the bridge only acknowledged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl ServiceReply {
    pub fn ack() -> Self {
        Self { data: None }
    }

    pub fn with_data(data: impl Into<String>) -> Self {
        Self {
            data: Some(data.into()),
        }
    }
}

/// Transport-agnostic interface to the hardware bridge
///
/// Implementations must not retry on their own; a failed call is reported
/// once and the caller decides whether the request is dropped.
#[async_trait]
pub trait BridgeTransport: Send + Sync {
    /// Send one UDS service request and wait for the bridge's reply
    ///
    /// # Arguments
    /// * `service_id` - Service identifier as a hex string (e.g. "10")
    /// * `sub_function` - Sub-function / data string, passed through verbatim
    async fn send_service(&self, service_id: &str, sub_function: &str)
        -> BridgeResult<ServiceReply>;

    /// Fetch a live sensor snapshot
    async fn fetch_telemetry(&self) -> BridgeResult<TelemetryReading>;

    /// Human-readable endpoint description for logs
    fn endpoint(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_without_data_field() {
        let reply: ServiceReply = serde_json::from_str("{}").unwrap();
        assert_eq!(reply, ServiceReply::ack());
    }

    #[test]
    fn test_reply_with_data_field() {
        let reply: ServiceReply = serde_json::from_str(r#"{"data":"50 03 00 19"}"#).unwrap();
        assert_eq!(reply.data.as_deref(), Some("50 03 00 19"));
    }
}
