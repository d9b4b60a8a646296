//! Security access (0x27) seed/key handshake

use std::sync::Arc;
use std::time::Duration;

use obdpro_core::{ProcedureState, ProcedureStatus};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::controller::DiagnosticController;
use crate::uds::codec::is_negative_response;
use crate::uds::{format_hex_bytes, parse_hex_bytes, security_sub_function, service_id};

const HANDSHAKE_NAME: &str = "Security Access";

/// Computes the security key for a seed
pub trait KeyAlgorithm: Send + Sync {
    fn compute_key(&self, seed: &[u8]) -> Vec<u8>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Sends the same key whatever the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedKey {
    key: Vec<u8>,
}

impl FixedKey {
    pub fn new(key: Vec<u8>) -> Self {
        Self { key }
    }
}

impl Default for FixedKey {
    fn default() -> Self {
        Self::new(vec![0xAA, 0xBB, 0xCC, 0xDD])
    }
}

impl KeyAlgorithm for FixedKey {
    fn compute_key(&self, _seed: &[u8]) -> Vec<u8> {
        self.key.clone()
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// key[i] = seed[i] XOR mask[i % mask.len()]
///
/// An empty seed is read as zeros, so the key is the mask itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XorKey {
    mask: Vec<u8>,
}

impl XorKey {
    pub fn new(mask: Vec<u8>) -> Self {
        Self { mask }
    }
}

impl KeyAlgorithm for XorKey {
    fn compute_key(&self, seed: &[u8]) -> Vec<u8> {
        if self.mask.is_empty() {
            return seed.to_vec();
        }
        if seed.is_empty() {
            return self.mask.clone();
        }
        seed.iter()
            .zip(self.mask.iter().cycle())
            .map(|(s, m)| s ^ m)
            .collect()
    }

    fn name(&self) -> &str {
        "xor"
    }
}

/// Pull the seed bytes out of a `67 01 <seed...>` reply
///
/// Anything else (acknowledgement, negative response, garbage) yields an
/// empty seed.
pub fn extract_seed(payload: &str) -> Vec<u8> {
    let positive = service_id::SECURITY_ACCESS + 0x40;
    match parse_hex_bytes(payload) {
        Some(bytes)
            if bytes.len() > 2
                && bytes[0] == positive
                && bytes[1] == security_sub_function::REQUEST_SEED =>
        {
            bytes[2..].to_vec()
        }
        _ => Vec::new(),
    }
}

/// Two-phase security unlock: request seed, wait, send key
///
/// The key is sent whether or not the seed request got through; the ECU is
/// the one that decides.
pub struct SecurityHandshake {
    algorithm: Arc<dyn KeyAlgorithm>,
    key_delay: Duration,
    state: RwLock<ProcedureState>,
}

impl SecurityHandshake {
    pub fn new(algorithm: Arc<dyn KeyAlgorithm>, key_delay: Duration) -> Self {
        Self {
            algorithm,
            key_delay,
            state: RwLock::new(ProcedureState::idle(HANDSHAKE_NAME, "Locked")),
        }
    }

    pub fn state(&self) -> ProcedureState {
        self.state.read().clone()
    }

    /// Run both phases against the controller
    pub async fn run(&self, controller: &DiagnosticController) -> ProcedureState {
        self.update(0, ProcedureStatus::Running, "Requesting seed");
        info!(algorithm = self.algorithm.name(), "Starting security access");

        let seed = match controller
            .send_service(&hex_id(service_id::SECURITY_ACCESS), "01")
            .await
        {
            Ok(exchange) => extract_seed(&exchange.response.payload),
            Err(e) => {
                warn!(error = %e, "Seed request dropped, sending key anyway");
                Vec::new()
            }
        };
        debug!(seed = %format_hex_bytes(&seed), "Seed received");
        self.update(50, ProcedureStatus::Running, "Calculating key");

        tokio::time::sleep(self.key_delay).await;

        let key = self.algorithm.compute_key(&seed);
        let sub_function = if key.is_empty() {
            format!("{:02X}", security_sub_function::SEND_KEY)
        } else {
            format!(
                "{:02X} {}",
                security_sub_function::SEND_KEY,
                format_hex_bytes(&key)
            )
        };

        match controller
            .send_service(&hex_id(service_id::SECURITY_ACCESS), &sub_function)
            .await
        {
            Ok(exchange) if is_negative_response(&exchange.response.payload) => {
                warn!(response = %exchange.response.payload, "Key rejected");
                self.update(100, ProcedureStatus::Failed, "Key Rejected");
            }
            Ok(_) => {
                info!("Security access granted");
                self.update(100, ProcedureStatus::Completed, "Access Granted");
            }
            Err(e) => {
                warn!(error = %e, "Key send dropped");
                self.update(50, ProcedureStatus::Failed, "Link Error");
            }
        }

        self.state()
    }

    fn update(&self, progress: u8, status: ProcedureStatus, message: &str) {
        let mut state = self.state.write();
        state.progress = progress;
        state.status = status;
        state.message = message.to_string();
    }
}

fn hex_id(sid: u8) -> String {
    format!("{:02X}", sid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_key_ignores_seed() {
        let algorithm = FixedKey::default();
        assert_eq!(algorithm.compute_key(&[]), vec![0xAA, 0xBB, 0xCC, 0xDD]);
        assert_eq!(
            algorithm.compute_key(&[0x8F, 0x22]),
            vec![0xAA, 0xBB, 0xCC, 0xDD]
        );
    }

    #[test]
    fn test_xor_key() {
        let algorithm = XorKey::new(vec![0xFF, 0x00]);
        assert_eq!(algorithm.compute_key(&[0x8F, 0x22, 0x11]), vec![0x70, 0x22, 0xEE]);
        assert_eq!(algorithm.compute_key(&[]), vec![0xFF, 0x00]);
        assert_eq!(XorKey::new(vec![]).compute_key(&[0x01]), vec![0x01]);
    }

    #[test]
    fn test_extract_seed() {
        assert_eq!(extract_seed("67 01 8F 22"), vec![0x8F, 0x22]);
        assert!(extract_seed("ACK").is_empty());
        assert!(extract_seed("7F 27 37").is_empty());
        assert!(extract_seed("67 01").is_empty());
    }

    #[test]
    fn test_initial_state_is_idle() {
        let handshake = SecurityHandshake::new(Arc::new(FixedKey::default()), Duration::from_secs(1));
        let state = handshake.state();
        assert_eq!(state.status, ProcedureStatus::Idle);
        assert_eq!(state.name, HANDSHAKE_NAME);
    }
}
