//! Request/response codec
//!
//! Builds exchange records for the message log and derives the positive
//! response label (`service + 0x40`) for inbound records. Nothing here can
//! fail: free-form and malformed input still produces a record.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use obdpro_core::{Direction, ExchangeRecord};

use super::{parse_hex_bytes, parse_service_id, service_id};

/// Payload recorded when the bridge replies without a data field
pub const ACK_PAYLOAD: &str = "ACK";

/// Response label used when the service id is not valid hex
pub const MALFORMED_RESPONSE_LABEL: &str = "RES ??";

/// Physical addressing of the tester/ECU pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addressing {
    /// Transmit ID (tester -> ECU)
    #[serde(default = "default_tx_id")]
    pub tx_id: String,
    /// Receive ID (ECU -> tester)
    #[serde(default = "default_rx_id")]
    pub rx_id: String,
}

fn default_tx_id() -> String {
    "0x7E0".to_string()
}

fn default_rx_id() -> String {
    "0x7E8".to_string()
}

impl Default for Addressing {
    fn default() -> Self {
        Self {
            tx_id: default_tx_id(),
            rx_id: default_rx_id(),
        }
    }
}

/// Build the outbound record for a request
pub fn build_request(
    addressing: &Addressing,
    service_id: &str,
    sub_function: &str,
    now: DateTime<Local>,
) -> ExchangeRecord {
    ExchangeRecord {
        direction: Direction::Outbound,
        can_id: addressing.tx_id.clone(),
        service_label: format!("SID {}", service_id),
        service_id: service_id.to_string(),
        payload: sub_function.to_string(),
        timestamp: now,
    }
}

/// Derive the label of the positive response to `service_id`
///
/// `"10"` -> `"RES 50"`. Input that is not hex yields
/// [`MALFORMED_RESPONSE_LABEL`].
pub fn derive_response_label(service_id: &str) -> String {
    match parse_service_id(service_id) {
        Some(sid) => format!(
            "RES {:02X}",
            sid.saturating_add(service_id::POSITIVE_RESPONSE_OFFSET)
        ),
        None => MALFORMED_RESPONSE_LABEL.to_string(),
    }
}

/// Build the inbound record for the reply to `service_id`
pub fn build_response(
    addressing: &Addressing,
    raw_payload: Option<&str>,
    service_id: &str,
    now: DateTime<Local>,
) -> ExchangeRecord {
    let payload = match raw_payload {
        Some(data) if !data.trim().is_empty() => data.to_string(),
        _ => ACK_PAYLOAD.to_string(),
    };

    ExchangeRecord {
        direction: Direction::Inbound,
        can_id: addressing.rx_id.clone(),
        service_label: derive_response_label(service_id),
        service_id: service_id.to_string(),
        payload,
        timestamp: now,
    }
}

/// Whether a response payload is a negative response (`7F <sid> <nrc>`)
pub fn is_negative_response(payload: &str) -> bool {
    parse_hex_bytes(payload)
        .and_then(|bytes| bytes.first().copied())
        .map(|first| first == service_id::NEGATIVE_RESPONSE)
        .unwrap_or(false)
}
