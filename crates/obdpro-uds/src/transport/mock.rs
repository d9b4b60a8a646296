//! Simulated hardware bridge

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use obdpro_core::{BridgeError, BridgeResult, BridgeTransport, ServiceReply, TelemetryReading};
use parking_lot::RwLock;

use crate::uds::{format_hex_bytes, parse_hex_bytes, parse_service_id, service_id};

/// Bridge that answers from a request -> response table
///
/// Unknown requests get a bare positive response (`sid + 0x40`).
pub struct MockBridge {
    latency: Duration,
    connected: AtomicBool,
    /// Predefined responses (request bytes -> response payload)
    responses: RwLock<Vec<(Vec<u8>, String)>>,
    /// Service ids whose requests fail at the transport level
    failing_services: RwLock<HashSet<u32>>,
    /// Per-request latency overrides (request bytes prefix -> delay)
    latencies: RwLock<Vec<(Vec<u8>, Duration)>>,
    telemetry: RwLock<TelemetryReading>,
    sent: RwLock<Vec<(String, String)>>,
}

impl Default for MockBridge {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl MockBridge {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            connected: AtomicBool::new(true),
            responses: RwLock::new(Self::default_responses()),
            failing_services: RwLock::new(HashSet::new()),
            latencies: RwLock::new(Vec::new()),
            telemetry: RwLock::new(TelemetryReading {
                rpm: 812.0,
                speed: 0.0,
                coolant_temp: 88.0,
                throttle_pos: 14.5,
                voltage: 13.9,
            }),
            sent: RwLock::new(Vec::new()),
        }
    }

    /// Add a response for requests starting with `request` (hex string)
    pub fn add_response(&self, request: &str, response: &str) {
        if let Some(bytes) = parse_hex_bytes(request) {
            // Newest entry wins over the defaults
            self.responses.write().insert(0, (bytes, response.to_string()));
        }
    }

    /// Delay replies to requests starting with `request` (hex string)
    pub fn set_latency(&self, request: &str, latency: Duration) {
        if let Some(bytes) = parse_hex_bytes(request) {
            self.latencies.write().insert(0, (bytes, latency));
        }
    }

    /// Make every request fail as if the bridge were unreachable
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Make requests for one service fail at the transport level
    pub fn fail_service(&self, service_id: &str) {
        if let Some(sid) = parse_service_id(service_id) {
            self.failing_services.write().insert(sid);
        }
    }

    pub fn set_telemetry(&self, reading: TelemetryReading) {
        *self.telemetry.write() = reading;
    }

    /// Every (service id, sub-function) pair sent so far, in order
    pub fn sent_requests(&self) -> Vec<(String, String)> {
        self.sent.read().clone()
    }

    fn default_responses() -> Vec<(Vec<u8>, String)> {
        let vin = format_hex_bytes(b"WBA3A5C55CF256651");
        vec![
            (vec![0x10, 0x01], "50 01 00 19 01 F4".to_string()),
            (vec![0x10, 0x02], "50 02 00 19 01 F4".to_string()),
            (vec![0x10, 0x03], "50 03 00 19 01 F4".to_string()),
            (vec![0x27, 0x01], "67 01 8F 22".to_string()),
            (vec![0x27, 0x02], "67 02".to_string()),
            (
                vec![0x19, 0x02],
                "59 02 FF 01 23 45 09 06 78 90 28 C1 00 00 89".to_string(),
            ),
            (vec![0x14, 0xFF, 0xFF, 0xFF], "54".to_string()),
            (vec![0x22, 0xF1, 0x90], format!("62 F1 90 {}", vin)),
            (vec![0x11, 0x01], "51 01".to_string()),
            (vec![0x31, 0x01, 0xFF, 0x00], "71 01 FF 00 00".to_string()),
            (vec![0x31, 0x02, 0xFF, 0x00], "71 02 FF 00 00".to_string()),
        ]
    }

    fn find_response(&self, request: &[u8]) -> Option<String> {
        let responses = self.responses.read();

        if let Some((_, resp)) = responses.iter().find(|(req, _)| req == request) {
            return Some(resp.clone());
        }

        // Prefix match for requests carrying data after the sub-function
        if let Some((_, resp)) = responses.iter().find(|(req, _)| request.starts_with(req)) {
            return Some(resp.clone());
        }

        None
    }

    async fn simulate_latency(&self, request: Option<&[u8]>) {
        let latency = request
            .and_then(|request| {
                self.latencies
                    .read()
                    .iter()
                    .find(|(prefix, _)| request.starts_with(prefix))
                    .map(|(_, latency)| *latency)
            })
            .unwrap_or(self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    /// Request bytes (sid + sub-function) when both parse as hex
    fn request_bytes(sid: Option<u32>, sub_function: &str) -> Option<Vec<u8>> {
        let sid = u8::try_from(sid?).ok()?;
        let mut request = vec![sid];
        request.extend(parse_hex_bytes(sub_function).unwrap_or_default());
        Some(request)
    }
}

#[async_trait]
impl BridgeTransport for MockBridge {
    async fn send_service(&self, sid: &str, sub_function: &str) -> BridgeResult<ServiceReply> {
        let parsed_sid = parse_service_id(sid);
        let request = Self::request_bytes(parsed_sid, sub_function);
        self.simulate_latency(request.as_deref()).await;

        if !self.connected.load(Ordering::SeqCst) {
            return Err(BridgeError::Transport("Mock bridge disconnected".to_string()));
        }

        if let Some(parsed) = parsed_sid {
            if self.failing_services.read().contains(&parsed) {
                return Err(BridgeError::Transport(format!(
                    "Mock failure for service {}",
                    sid
                )));
            }
        }

        self.sent
            .write()
            .push((sid.to_string(), sub_function.to_string()));
        tracing::debug!(sid, sub_function, "Mock bridge: request");

        // Free-form requests that are not hex get a plain acknowledgement
        let Some(request) = request else {
            return Ok(ServiceReply::ack());
        };

        let data = self.find_response(&request).unwrap_or_else(|| {
            format!(
                "{:02X}",
                u32::from(request[0]) + service_id::POSITIVE_RESPONSE_OFFSET
            )
        });
        Ok(ServiceReply::with_data(data))
    }

    async fn fetch_telemetry(&self) -> BridgeResult<TelemetryReading> {
        self.simulate_latency(None).await;

        if !self.connected.load(Ordering::SeqCst) {
            return Err(BridgeError::Transport("Mock bridge disconnected".to_string()));
        }
        Ok(*self.telemetry.read())
    }

    fn endpoint(&self) -> String {
        "mock://bridge".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_responses() {
        let bridge = MockBridge::default();
        let reply = bridge.send_service("10", "03").await.unwrap();
        assert_eq!(reply.data.as_deref(), Some("50 03 00 19 01 F4"));

        let reply = bridge.send_service("27", "02 AA BB CC DD").await.unwrap();
        assert_eq!(reply.data.as_deref(), Some("67 02"));
    }

    #[tokio::test]
    async fn test_unknown_request_gets_positive_sid() {
        let bridge = MockBridge::default();
        let reply = bridge.send_service("3E", "00").await.unwrap();
        assert_eq!(reply.data.as_deref(), Some("7E"));
    }

    #[tokio::test]
    async fn test_non_hex_request_is_acknowledged() {
        let bridge = MockBridge::default();
        let reply = bridge.send_service("ZZ", "??").await.unwrap();
        assert_eq!(reply, ServiceReply::ack());
    }

    #[tokio::test]
    async fn test_added_response_overrides_default() {
        let bridge = MockBridge::default();
        bridge.add_response("27 02", "7F 27 35");
        let reply = bridge.send_service("27", "02 AA BB CC DD").await.unwrap();
        assert_eq!(reply.data.as_deref(), Some("7F 27 35"));
    }

    #[tokio::test]
    async fn test_disconnected_and_failing_services() {
        let bridge = MockBridge::default();
        bridge.fail_service("31");
        assert!(bridge.send_service("31", "01 FF 00").await.is_err());
        assert!(bridge.send_service("10", "03").await.is_ok());

        bridge.set_connected(false);
        assert!(bridge.send_service("10", "03").await.is_err());
        assert!(bridge.fetch_telemetry().await.is_err());
        assert_eq!(bridge.sent_requests(), vec![("10".to_string(), "03".to_string())]);
    }
}
