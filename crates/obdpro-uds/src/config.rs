//! Dashboard configuration
//!
//! Every constant the dashboard runs on (bridge address, poll interval,
//! procedure timing, handshake delay) has a default here and can be
//! overridden from TOML:
//!
//! ```toml
//! [bridge]
//! base_url = "http://192.168.4.1"
//!
//! [session]
//! policy = "confirmed_positive"
//! key_delay_ms = 1000
//!
//! [session.key]
//! algorithm = "xor"
//! mask = "5A A5"
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::session::{FixedKey, KeyAlgorithm, TransitionPolicy, XorKey};
use crate::uds::{parse_hex_bytes, Addressing};

/// Top-level dashboard configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub ecu: EcuConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub procedures: ProceduresConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

impl DashboardConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Reject values that would stall or spin the timers
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bridge.base_url.trim().is_empty() {
            return Err(ConfigError::invalid("bridge.base_url", "must not be empty"));
        }
        if self.telemetry.poll_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "telemetry.poll_interval_ms",
                "must be greater than zero",
            ));
        }
        for (field, timing) in [
            ("procedures.dpf", &self.procedures.dpf),
            ("procedures.flash", &self.procedures.flash),
        ] {
            if timing.interval_ms == 0 {
                return Err(ConfigError::invalid(
                    format!("{}.interval_ms", field),
                    "must be greater than zero",
                ));
            }
            if timing.increment == 0 {
                return Err(ConfigError::invalid(
                    format!("{}.increment", field),
                    "must be greater than zero",
                ));
            }
        }
        self.session.key.build()?;
        Ok(())
    }
}

/// Hardware bridge location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// TCP connect timeout for the HTTP client
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://192.168.4.1".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// The ECU the dashboard talks to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcuConfig {
    #[serde(default = "default_ecu_name")]
    pub name: String,
    #[serde(flatten)]
    pub addressing: Addressing,
}

fn default_ecu_name() -> String {
    "ECM".to_string()
}

impl Default for EcuConfig {
    fn default() -> Self {
        Self {
            name: default_ecu_name(),
            addressing: Addressing::default(),
        }
    }
}

/// Session tracking and security access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub policy: TransitionPolicy,
    /// Return to Default/Locked when the bridge drops off
    #[serde(default = "default_true")]
    pub reset_on_disconnect: bool,
    /// Delay between the seed request and the key
    #[serde(default = "default_key_delay_ms")]
    pub key_delay_ms: u64,
    #[serde(default)]
    pub key: KeyConfig,
}

fn default_true() -> bool {
    true
}

fn default_key_delay_ms() -> u64 {
    1000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            policy: TransitionPolicy::default(),
            reset_on_disconnect: true,
            key_delay_ms: default_key_delay_ms(),
            key: KeyConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn key_delay(&self) -> Duration {
        Duration::from_millis(self.key_delay_ms)
    }
}

/// Security key algorithm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "lowercase")]
pub enum KeyConfig {
    Fixed {
        #[serde(default = "default_fixed_key")]
        key: String,
    },
    Xor {
        mask: String,
    },
}

fn default_fixed_key() -> String {
    "AA BB CC DD".to_string()
}

impl Default for KeyConfig {
    fn default() -> Self {
        KeyConfig::Fixed {
            key: default_fixed_key(),
        }
    }
}

impl KeyConfig {
    pub fn build(&self) -> Result<Arc<dyn KeyAlgorithm>, ConfigError> {
        match self {
            KeyConfig::Fixed { key } => {
                let bytes = parse_hex_bytes(key)
                    .ok_or_else(|| ConfigError::invalid("session.key.key", "not a hex string"))?;
                Ok(Arc::new(FixedKey::new(bytes)))
            }
            KeyConfig::Xor { mask } => {
                let bytes = parse_hex_bytes(mask)
                    .ok_or_else(|| ConfigError::invalid("session.key.mask", "not a hex string"))?;
                Ok(Arc::new(XorKey::new(bytes)))
            }
        }
    }
}

/// Message log sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_capacity")]
    pub capacity: usize,
    /// Records handed to log analysis
    #[serde(default = "default_analysis_window")]
    pub analysis_window: usize,
}

fn default_log_capacity() -> usize {
    crate::log::DEFAULT_LOG_CAPACITY
}

fn default_analysis_window() -> usize {
    crate::log::ANALYSIS_WINDOW
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            capacity: default_log_capacity(),
            analysis_window: default_analysis_window(),
        }
    }
}

/// Telemetry polling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_history_len")]
    pub history_len: usize,
}

fn default_poll_interval_ms() -> u64 {
    800
}

fn default_history_len() -> usize {
    31
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            history_len: default_history_len(),
        }
    }
}

impl TelemetryConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Timed procedures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProceduresConfig {
    #[serde(default = "default_dpf_timing")]
    pub dpf: ProcedureTiming,
    #[serde(default = "default_flash_timing")]
    pub flash: ProcedureTiming,
    /// Send RoutineControl start/stop for DPF regeneration
    #[serde(default = "default_true")]
    pub dpf_routine_control: bool,
}

impl Default for ProceduresConfig {
    fn default() -> Self {
        Self {
            dpf: default_dpf_timing(),
            flash: default_flash_timing(),
            dpf_routine_control: true,
        }
    }
}

/// Tick interval and per-tick progress of one procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureTiming {
    pub interval_ms: u64,
    pub increment: u8,
}

impl ProcedureTiming {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn default_dpf_timing() -> ProcedureTiming {
    ProcedureTiming {
        interval_ms: 500,
        increment: 2,
    }
}

fn default_flash_timing() -> ProcedureTiming {
    ProcedureTiming {
        interval_ms: 100,
        increment: 1,
    }
}

/// AI assistant backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Completion endpoint; the assistant is unavailable when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default = "default_analysis_model")]
    pub analysis_model: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_analysis_model() -> String {
    "gemini-3-pro-preview".to_string()
}

fn default_chat_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            analysis_model: default_analysis_model(),
            chat_model: default_chat_model(),
            temperature: default_temperature(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = DashboardConfig::from_toml_str("").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.bridge.base_url, "http://192.168.4.1");
        assert_eq!(config.telemetry.poll_interval_ms, 800);
        assert_eq!(config.telemetry.history_len, 31);
        assert_eq!(config.log.capacity, 50);
        assert_eq!(config.session.key_delay_ms, 1000);
        assert!(config.session.reset_on_disconnect);
        assert_eq!(config.session.policy, TransitionPolicy::Optimistic);
        assert_eq!(config.ecu.addressing.tx_id, "0x7E0");
    }

    #[test]
    fn test_overrides() {
        let config = DashboardConfig::from_toml_str(
            r#"
            [bridge]
            base_url = "http://10.0.0.5:8080"

            [ecu]
            name = "TCM"
            tx_id = "0x7E1"
            rx_id = "0x7E9"

            [session]
            policy = "confirmed_positive"
            reset_on_disconnect = false

            [session.key]
            algorithm = "xor"
            mask = "5A A5"

            [procedures.dpf]
            interval_ms = 50
            increment = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.bridge.base_url, "http://10.0.0.5:8080");
        assert_eq!(config.ecu.name, "TCM");
        assert_eq!(config.ecu.addressing.rx_id, "0x7E9");
        assert_eq!(config.session.policy, TransitionPolicy::ConfirmedPositive);
        assert!(!config.session.reset_on_disconnect);
        assert_eq!(config.procedures.dpf.increment, 5);
        assert_eq!(config.procedures.flash.interval_ms, 100);

        let key = config.session.key.build().unwrap();
        assert_eq!(key.compute_key(&[0x00, 0x00]), vec![0x5A, 0xA5]);
    }

    #[test]
    fn test_default_key_is_placeholder() {
        let key = KeyConfig::default().build().unwrap();
        assert_eq!(key.compute_key(&[0x12]), vec![0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = DashboardConfig::from_toml_str("[telemetry]\npoll_interval_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_rejects_bad_key_hex() {
        let err = DashboardConfig::from_toml_str(
            "[session.key]\nalgorithm = \"fixed\"\nkey = \"not-hex\"\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("session.key.key"));
    }

    #[test]
    fn test_missing_file() {
        let err = DashboardConfig::from_file(Path::new("/nonexistent/obdpro.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
