//! Live sensor telemetry models

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Sensor values as reported by the bridge's `/api/data` endpoint
///
/// Fields the bridge omits read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TelemetryReading {
    /// Engine speed (RPM)
    pub rpm: f64,
    /// Vehicle speed (km/h)
    pub speed: f64,
    /// Coolant temperature (°C)
    pub coolant_temp: f64,
    /// Throttle position (%)
    pub throttle_pos: f64,
    /// Battery voltage (V)
    pub voltage: f64,
}

/// A reading stamped with its local capture time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    #[serde(flatten)]
    pub reading: TelemetryReading,
    pub timestamp: DateTime<Local>,
}

impl TelemetrySnapshot {
    pub fn new(reading: TelemetryReading, timestamp: DateTime<Local>) -> Self {
        Self { reading, timestamp }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reading_wire_format() {
        let json = r#"{"rpm":812.5,"speed":0,"coolantTemp":88,"throttlePos":14.2,"voltage":13.9}"#;
        let reading: TelemetryReading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.rpm, 812.5);
        assert_eq!(reading.coolant_temp, 88.0);
        assert_eq!(reading.throttle_pos, 14.2);
    }

    #[test]
    fn test_missing_fields_read_as_zero() {
        let reading: TelemetryReading = serde_json::from_str(r#"{"rpm":1000}"#).unwrap();
        assert_eq!(
            reading,
            TelemetryReading {
                rpm: 1000.0,
                ..Default::default()
            }
        );
    }
}
