//! Test utilities for obdpro-client
//!
//! Provides an in-process fake of the hardware bridge and a server wrapper
//! that runs any axum router on a loopback port.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use obdpro_core::{ServiceReply, TelemetryReading};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;

use crate::assistant::{CompletionBody, CompletionReply};
use crate::{HttpBridge, Result};

/// Route the fake serves completions on
pub const ASSISTANT_PATH: &str = "/assistant";

#[derive(Debug, Deserialize)]
struct UdsQuery {
    sid: String,
    #[serde(default)]
    sub: String,
}

/// Scriptable stand-in for the bridge firmware
///
/// Unscripted UDS requests are acknowledged with an empty body. Completions
/// echo the model name and prompt back.
#[derive(Default)]
pub struct FakeBridge {
    telemetry: RwLock<TelemetryReading>,
    responses: RwLock<HashMap<(String, String), String>>,
    requests: RwLock<Vec<(String, String)>>,
    completions: RwLock<Vec<CompletionBody>>,
    failing: AtomicBool,
}

impl FakeBridge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_telemetry(&self, reading: TelemetryReading) {
        *self.telemetry.write() = reading;
    }

    /// Answer `sid`/`sub` with the given payload
    pub fn respond(&self, sid: &str, sub: &str, data: &str) {
        self.responses
            .write()
            .insert((sid.to_string(), sub.to_string()), data.to_string());
    }

    /// Make every route answer 503
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// UDS requests in arrival order, as decoded from the query string
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.read().clone()
    }

    pub fn completions(&self) -> Vec<CompletionBody> {
        self.completions.read().clone()
    }

    pub fn router(self: &Arc<Self>) -> Router {
        Router::new()
            .route("/api/data", get(telemetry))
            .route("/api/uds", get(uds))
            .route(ASSISTANT_PATH, post(complete))
            .with_state(self.clone())
    }

    fn is_failing(&self) -> bool {
        self.failing.load(Ordering::SeqCst)
    }
}

fn unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": "CAN bus offline" })),
    )
        .into_response()
}

async fn telemetry(State(fake): State<Arc<FakeBridge>>) -> Response {
    if fake.is_failing() {
        return unavailable();
    }
    Json(*fake.telemetry.read()).into_response()
}

async fn uds(State(fake): State<Arc<FakeBridge>>, Query(query): Query<UdsQuery>) -> Response {
    if fake.is_failing() {
        return unavailable();
    }
    fake.requests
        .write()
        .push((query.sid.clone(), query.sub.clone()));

    let scripted = fake.responses.read().get(&(query.sid, query.sub)).cloned();
    match scripted {
        Some(data) => Json(ServiceReply::with_data(data)).into_response(),
        None => StatusCode::OK.into_response(),
    }
}

async fn complete(State(fake): State<Arc<FakeBridge>>, Json(body): Json<CompletionBody>) -> Response {
    if fake.is_failing() {
        return unavailable();
    }
    let text = format!("[{}] {}", body.model, body.prompt);
    fake.completions.write().push(body);
    Json(CompletionReply { text }).into_response()
}

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub bridge: HttpBridge,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve `router` on a free loopback port
    ///
    /// # Example
    ///
    /// ```ignore
    /// use obdpro_client::testing::{FakeBridge, TestServer};
    ///
    /// let fake = FakeBridge::new();
    /// let server = TestServer::start(fake.router()).await?;
    /// let reading = server.bridge.read_telemetry().await?;
    /// ```
    pub async fn start(router: Router) -> Result<Self> {
        Self::start_with_timeout(router, Duration::from_secs(2)).await
    }

    pub async fn start_with_timeout(router: Router, connect_timeout: Duration) -> Result<Self> {
        // Bind to any available port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        let bridge = HttpBridge::with_config(&format!("http://{}", addr), connect_timeout)?;

        Ok(Self {
            addr,
            bridge,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Full URL of the fake completion endpoint
    pub fn assistant_url(&self) -> String {
        format!("{}{}", self.base_url(), ASSISTANT_PATH)
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_base_url_format() {
        let server = TestServer::start(FakeBridge::new().router()).await.unwrap();
        assert!(server.base_url().starts_with("http://127.0.0.1:"));
        assert!(server.assistant_url().ends_with("/assistant"));
    }
}
