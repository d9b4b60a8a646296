//! UDS exchange records (one line of the message log)

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Direction of an exchange record relative to the tester
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Tester -> ECU
    #[serde(rename = "OUT")]
    Outbound,
    /// ECU -> tester
    #[serde(rename = "IN")]
    Inbound,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Outbound => f.write_str("OUT"),
            Direction::Inbound => f.write_str("IN"),
        }
    }
}

/// One request or response as captured by the codec
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRecord {
    pub direction: Direction,
    /// Address the frame travelled on (e.g. "0x7E0" / "0x7E8")
    pub can_id: String,
    /// Display label, "SID 10" for requests or "RES 50" for responses
    pub service_label: String,
    /// Service id of the request (for responses: the id being answered)
    pub service_id: String,
    /// Sub-function / data identifier / response data, free-form
    pub payload: String,
    pub timestamp: DateTime<Local>,
}

impl ExchangeRecord {
    /// Capture time at display resolution
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }

    /// Render as a single log line, e.g. `[12:00:01] OUT: SID 10 03`
    pub fn log_line(&self) -> String {
        format!(
            "[{}] {}: {} {}",
            self.time_label(),
            self.direction,
            self.service_label,
            self.payload
        )
    }
}

/// A completed request with its matched response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub request: ExchangeRecord,
    pub response: ExchangeRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_log_line() {
        let record = ExchangeRecord {
            direction: Direction::Outbound,
            can_id: "0x7E0".to_string(),
            service_label: "SID 10".to_string(),
            service_id: "10".to_string(),
            payload: "03".to_string(),
            timestamp: Local.with_ymd_and_hms(2024, 5, 1, 9, 5, 7).unwrap(),
        };
        assert_eq!(record.log_line(), "[09:05:07] OUT: SID 10 03");
    }

    #[test]
    fn test_direction_serializes_short() {
        assert_eq!(
            serde_json::to_string(&Direction::Inbound).unwrap(),
            "\"IN\""
        );
    }
}
