//! HTTP client for the hardware bridge

use std::time::Duration;

use async_trait::async_trait;
use obdpro_core::{BridgeResult, BridgeTransport, ServiceReply, TelemetryReading};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ClientError, Result};

/// Default connection timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Error body some bridge firmwares return on failure
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Bridge reached over plain HTTP
///
/// Only the connect phase is bounded; a slow reply is waited out.
#[derive(Debug, Clone)]
pub struct HttpBridge {
    client: Client,
    base_url: Url,
}

impl HttpBridge {
    /// Create a bridge client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the bridge (e.g., "http://192.168.4.1")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, DEFAULT_CONNECT_TIMEOUT)
    }

    pub fn with_config(base_url: &str, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        let base_url = Url::parse(base_url)?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch the current sensor snapshot
    #[instrument(skip(self))]
    pub async fn read_telemetry(&self) -> Result<TelemetryReading> {
        let url = self.base_url.join("/api/data")?;
        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// Run one UDS service exchange
    ///
    /// The sub-function string is passed through verbatim; the bridge does
    /// the framing.
    #[instrument(skip(self))]
    pub async fn uds_request(&self, service_id: &str, sub_function: &str) -> Result<ServiceReply> {
        let mut url = self.base_url.join("/api/uds")?;
        url.query_pairs_mut()
            .append_pair("sid", service_id)
            .append_pair("sub", sub_function);
        debug!("UDS request to {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.extract_error_from_status(response, status).await);
        }

        // An empty body is a bare acknowledgement
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(ServiceReply::ack());
        }
        serde_json::from_str(&body).map_err(|e| ClientError::ParseError(e.to_string()))
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| ClientError::ParseError(e.to_string()))
        } else {
            Err(self.extract_error_from_status(response, status).await)
        }
    }

    async fn extract_error_from_status(
        &self,
        response: reqwest::Response,
        status: StatusCode,
    ) -> ClientError {
        let message = match response.json::<ErrorBody>().await {
            Ok(err) => err.error,
            Err(_) => format!("HTTP {}", status),
        };

        match status {
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ClientError::Timeout,
            _ => ClientError::server_error(status.as_u16(), message),
        }
    }
}

#[async_trait]
impl BridgeTransport for HttpBridge {
    async fn send_service(
        &self,
        service_id: &str,
        sub_function: &str,
    ) -> BridgeResult<ServiceReply> {
        Ok(self.uds_request(service_id, sub_function).await?)
    }

    async fn fetch_telemetry(&self) -> BridgeResult<TelemetryReading> {
        Ok(self.read_telemetry().await?)
    }

    fn endpoint(&self) -> String {
        self.base_url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_creation() {
        let bridge = HttpBridge::new("http://192.168.4.1");
        assert!(bridge.is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let bridge = HttpBridge::new("not a url");
        assert!(matches!(bridge, Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_endpoint_is_base_url() {
        let bridge = HttpBridge::new("http://10.0.0.7:8080").unwrap();
        assert_eq!(bridge.endpoint(), "http://10.0.0.7:8080/");
    }
}
