//! Output formatting for obdpro (table, json)

use clap::ValueEnum;
use colored::Colorize;
use obdpro_core::{Direction, Dtc, DtcSeverity, EcuStatus, ExchangeRecord, TelemetrySnapshot};
use obdpro_uds::ServiceIntent;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Whether human-oriented chatter should be printed
    pub fn is_interactive(&self) -> bool {
        self.format == OutputFormat::Table && !self.quiet
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print data in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    println!("{}", Table::new(data));
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(data).unwrap_or_else(|_| "[]".to_string())
                );
            }
        }
    }

    /// Print any serializable value as pretty JSON
    pub fn print_json<T: Serialize>(&self, data: &T) {
        println!(
            "{}",
            serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
        );
    }

    /// Print key-value pairs
    pub fn print_kv(&self, pairs: &[(&str, String)]) {
        match self.format {
            OutputFormat::Table => {
                for (key, value) in pairs {
                    println!("{}: {}", key.bold(), value);
                }
            }
            OutputFormat::Json => {
                let map: serde_json::Map<String, serde_json::Value> = pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
                    .collect();
                self.print_json(&map);
            }
        }
    }

    /// Print the ECU header line
    pub fn print_status(&self, status: &EcuStatus) {
        match self.format {
            OutputFormat::Table => self.print_kv(&[
                ("ECU", format!("{} ({})", status.name, status.id)),
                ("Session", status.active_session.to_string()),
                ("Security", security_label(status)),
            ]),
            OutputFormat::Json => self.print_json(status),
        }
    }
}

fn security_label(status: &EcuStatus) -> String {
    let label = status.security_access.to_string();
    if status.security_access.is_unlocked() {
        label.green().to_string()
    } else {
        label.red().to_string()
    }
}

// =============================================================================
// Display types for various commands
// =============================================================================

/// One message log line
#[derive(Debug, Tabled, Serialize)]
pub struct LogRow {
    #[tabled(rename = "Time")]
    pub time: String,
    #[tabled(rename = "Dir")]
    pub direction: String,
    #[tabled(rename = "CAN ID")]
    pub can_id: String,
    #[tabled(rename = "Service")]
    pub service: String,
    #[tabled(rename = "Payload")]
    pub payload: String,
}

impl From<&ExchangeRecord> for LogRow {
    fn from(record: &ExchangeRecord) -> Self {
        let direction = match record.direction {
            Direction::Outbound => record.direction.to_string().cyan().to_string(),
            Direction::Inbound => record.direction.to_string().magenta().to_string(),
        };
        Self {
            time: record.time_label(),
            direction,
            can_id: record.can_id.clone(),
            service: record.service_label.clone(),
            payload: record.payload.clone(),
        }
    }
}

/// DTC display for the dtc command
#[derive(Debug, Tabled, Serialize)]
pub struct DtcRow {
    #[tabled(rename = "Code")]
    pub code: String,
    #[tabled(rename = "Description")]
    pub description: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Severity")]
    pub severity: String,
}

impl From<&Dtc> for DtcRow {
    fn from(dtc: &Dtc) -> Self {
        let severity = match dtc.severity {
            DtcSeverity::High => dtc.severity.to_string().red().to_string(),
            DtcSeverity::Medium => dtc.severity.to_string().yellow().to_string(),
            DtcSeverity::Low => dtc.severity.to_string(),
        };
        Self {
            code: dtc.code.clone(),
            description: dtc.description.clone(),
            status: dtc.status.to_string(),
            severity,
        }
    }
}

/// Catalog entry
#[derive(Debug, Tabled, Serialize)]
pub struct IntentRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "SID")]
    pub service_id: String,
    #[tabled(rename = "Sub-function")]
    pub sub_function: String,
}

impl From<ServiceIntent> for IntentRow {
    fn from(intent: ServiceIntent) -> Self {
        let (service_id, sub_function) = intent.lookup();
        Self {
            key: intent.key().to_string(),
            name: intent.name().to_string(),
            service_id: service_id.to_string(),
            sub_function: sub_function.to_string(),
        }
    }
}

/// Telemetry sample for the monitor command
#[derive(Debug, Tabled, Serialize)]
pub struct TelemetryRow {
    #[tabled(rename = "Time")]
    pub time: String,
    #[tabled(rename = "RPM")]
    pub rpm: String,
    #[tabled(rename = "Speed")]
    pub speed: String,
    #[tabled(rename = "Coolant")]
    pub coolant: String,
    #[tabled(rename = "Throttle")]
    pub throttle: String,
    #[tabled(rename = "Voltage")]
    pub voltage: String,
}

impl From<&TelemetrySnapshot> for TelemetryRow {
    fn from(snapshot: &TelemetrySnapshot) -> Self {
        let r = &snapshot.reading;
        Self {
            time: snapshot.timestamp.format("%H:%M:%S").to_string(),
            rpm: format!("{:.0}", r.rpm),
            speed: format!("{:.0} km/h", r.speed),
            coolant: format!("{:.0} °C", r.coolant_temp),
            throttle: format!("{:.1} %", r.throttle_pos),
            voltage: format!("{:.1} V", r.voltage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_intent_row() {
        colored::control::set_override(false);
        let row = IntentRow::from(ServiceIntent::ReadVin);
        assert_eq!(row.key, "read_vin");
        assert_eq!(row.service_id, "22");
        assert_eq!(row.sub_function, "F190");
    }

    #[test]
    fn test_dtc_row_plain() {
        colored::control::set_override(false);
        let row = DtcRow::from(&Dtc {
            code: "P0123".to_string(),
            description: "Status 0x09".to_string(),
            status: obdpro_core::DtcStatus::Active,
            severity: DtcSeverity::Medium,
        });
        assert_eq!(row.status, "Active");
        assert_eq!(row.severity, "Medium");
    }
}
