//! Diagnostic controller
//!
//! The single path every UDS request takes, whether it comes from a manual
//! command, a catalog intent, the security handshake or a procedure. It
//! owns the message log, the session tracker and the DTC store, and
//! updates all three under one lock once the bridge has answered.
//!
//! A request the bridge never answers leaves no trace: nothing is logged
//! and no state changes.

use std::sync::Arc;

use obdpro_core::{
    BridgeResult, BridgeTransport, Clock, Dtc, DtcSeverity, DtcStatus, EcuStatus, Exchange,
    ExchangeRecord, Filter, SecurityLevel, UdsSession,
};
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::dtc_store::DtcStore;
use crate::log::MessageLog;
use crate::session::{SessionTracker, TransitionPolicy};
use crate::uds::{codec, session_type, Addressing, ServiceIntent};

#[derive(Debug, Default)]
struct ControllerState {
    log: MessageLog,
    tracker: SessionTracker,
    dtcs: DtcStore,
}

pub struct DiagnosticController {
    bridge: Arc<dyn BridgeTransport>,
    clock: Arc<dyn Clock>,
    addressing: Addressing,
    ecu_name: String,
    policy: TransitionPolicy,
    reset_on_disconnect: bool,
    state: Arc<RwLock<ControllerState>>,
    watch_handle: Mutex<Option<JoinHandle<()>>>,
}

impl DiagnosticController {
    pub fn new(
        bridge: Arc<dyn BridgeTransport>,
        clock: Arc<dyn Clock>,
        config: &DashboardConfig,
    ) -> Self {
        let state = ControllerState {
            log: MessageLog::with_capacity(config.log.capacity),
            ..Default::default()
        };
        Self {
            bridge,
            clock,
            addressing: config.ecu.addressing.clone(),
            ecu_name: config.ecu.name.clone(),
            policy: config.session.policy,
            reset_on_disconnect: config.session.reset_on_disconnect,
            state: Arc::new(RwLock::new(state)),
            watch_handle: Mutex::new(None),
        }
    }

    /// Send one UDS request and record the exchange
    ///
    /// On success the request/response pair is appended to the log, the
    /// session tracker and the DTC store are updated, and the pair is
    /// returned. On a transport failure nothing is recorded.
    pub async fn send_service(
        &self,
        service_id: &str,
        sub_function: &str,
    ) -> BridgeResult<Exchange> {
        let sent_at = self.clock.now();

        let reply = match self.bridge.send_service(service_id, sub_function).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    service_id,
                    sub_function,
                    endpoint = %self.bridge.endpoint(),
                    error = %e,
                    "UDS request dropped"
                );
                return Err(e);
            }
        };

        let request = codec::build_request(&self.addressing, service_id, sub_function, sent_at);
        let response = codec::build_response(
            &self.addressing,
            reply.data.as_deref(),
            service_id,
            self.clock.now(),
        );

        {
            let mut state = self.state.write();
            state
                .log
                .append_exchange(request.clone(), response.clone());
            // DTC clears are local and optimistic; only session moves wait
            // for a positive reply under the confirmed policy
            state
                .dtcs
                .observe(service_id, sub_function, &response.payload);
            if self.policy.permits(&response.payload) {
                state.tracker.apply(service_id, sub_function);
            } else {
                debug!(
                    service_id,
                    response = %response.payload,
                    "Negative response, state unchanged"
                );
            }
        }

        info!(
            request = %request.service_label,
            response = %response.service_label,
            payload = %response.payload,
            "UDS exchange"
        );
        Ok(Exchange { request, response })
    }

    /// Send the request behind a catalog intent
    pub async fn send_intent(&self, intent: ServiceIntent) -> BridgeResult<Exchange> {
        let (service_id, sub_function) = intent.lookup();
        debug!(%intent, service_id, sub_function, "Sending intent");
        self.send_service(service_id, sub_function).await
    }

    /// Switch the ECU to the Programming session (`10 02`)
    pub async fn enter_programming_session(&self) -> BridgeResult<Exchange> {
        self.send_service("10", &format!("{:02X}", session_type::PROGRAMMING))
            .await
    }

    pub fn session(&self) -> UdsSession {
        self.state.read().tracker.session()
    }

    pub fn security(&self) -> SecurityLevel {
        self.state.read().tracker.security()
    }

    pub fn ecu_status(&self, connected: bool) -> EcuStatus {
        self.state
            .read()
            .tracker
            .status(&self.addressing.tx_id, &self.ecu_name, connected)
    }

    /// Back to Default session, Locked
    pub fn reset_session(&self) {
        self.state.write().tracker.reset();
    }

    pub fn relock(&self) {
        self.state.write().tracker.relock();
    }

    pub fn log_snapshot(&self) -> Vec<ExchangeRecord> {
        self.state.read().log.snapshot()
    }

    pub fn recent_log(&self, n: usize) -> Vec<ExchangeRecord> {
        self.state.read().log.recent(n)
    }

    pub fn log_len(&self) -> usize {
        self.state.read().log.len()
    }

    pub fn clear_log(&self) {
        self.state.write().log.clear();
    }

    pub fn dtcs(&self) -> Vec<Dtc> {
        self.state.read().dtcs.all().to_vec()
    }

    pub fn filter_dtcs(&self, status: Filter<DtcStatus>, severity: Filter<DtcSeverity>) -> Vec<Dtc> {
        self.state.read().dtcs.filter(status, severity)
    }

    /// Replace the DTC set with an externally sourced scan
    pub fn set_dtcs(&self, dtcs: Vec<Dtc>) {
        self.state.write().dtcs.set_all(dtcs);
    }

    pub fn endpoint(&self) -> String {
        self.bridge.endpoint()
    }

    /// Follow a connectivity feed and reset the tracker when the link drops
    ///
    /// Does nothing when `reset_on_disconnect` is off.
    pub fn watch_connectivity(&self, mut connectivity: watch::Receiver<bool>) {
        if !self.reset_on_disconnect {
            return;
        }

        let state = self.state.clone();
        let mut was_connected = *connectivity.borrow_and_update();
        let handle = tokio::spawn(async move {
            while connectivity.changed().await.is_ok() {
                let connected = *connectivity.borrow_and_update();
                if was_connected && !connected {
                    info!("Bridge disconnected, resetting session state");
                    state.write().tracker.reset();
                }
                was_connected = connected;
            }
        });

        if let Some(previous) = self.watch_handle.lock().replace(handle) {
            previous.abort();
        }
    }
}

impl Drop for DiagnosticController {
    fn drop(&mut self) {
        if let Some(handle) = self.watch_handle.get_mut().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockBridge;
    use chrono::{Local, TimeZone};
    use obdpro_core::{Direction, FixedClock};

    fn controller(bridge: Arc<MockBridge>) -> DiagnosticController {
        let clock = FixedClock::new(Local.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
        DiagnosticController::new(bridge, Arc::new(clock), &DashboardConfig::default())
    }

    #[tokio::test]
    async fn test_exchange_is_logged() {
        let ctrl = controller(Arc::new(MockBridge::default()));
        let exchange = ctrl.send_service("10", "03").await.unwrap();

        assert_eq!(exchange.request.service_label, "SID 10");
        assert_eq!(exchange.response.service_label, "RES 50");
        assert_eq!(exchange.response.payload, "50 03 00 19 01 F4");

        let log = ctrl.log_snapshot();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].direction, Direction::Outbound);
        assert_eq!(log[1].direction, Direction::Inbound);
        assert_eq!(ctrl.session(), UdsSession::Extended);
    }

    #[tokio::test]
    async fn test_dropped_request_changes_nothing() {
        let bridge = Arc::new(MockBridge::default());
        let ctrl = controller(bridge.clone());
        bridge.set_connected(false);

        assert!(ctrl.send_service("10", "03").await.is_err());
        assert_eq!(ctrl.log_len(), 0);
        assert_eq!(ctrl.session(), UdsSession::Default);
    }

    #[tokio::test]
    async fn test_clear_is_local_under_confirmed_policy() {
        let bridge = Arc::new(MockBridge::default());
        bridge.add_response("14 FF FF FF", "7F 14 22");
        bridge.add_response("10 03", "7F 10 22");
        let mut config = DashboardConfig::default();
        config.session.policy = TransitionPolicy::ConfirmedPositive;
        let clock = FixedClock::new(Local.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
        let ctrl = DiagnosticController::new(bridge, Arc::new(clock), &config);

        ctrl.send_intent(ServiceIntent::ReadDtcs).await.unwrap();
        assert_eq!(ctrl.dtcs().len(), 3);

        ctrl.send_intent(ServiceIntent::ClearDtcs).await.unwrap();
        assert!(ctrl.dtcs().is_empty());

        // Session moves still wait for a positive reply
        ctrl.send_service("10", "03").await.unwrap();
        assert_eq!(ctrl.session(), UdsSession::Default);
    }

    #[tokio::test]
    async fn test_malformed_ids_do_not_move_session() {
        let ctrl = controller(Arc::new(MockBridge::default()));
        ctrl.send_service("+10", "+3").await.unwrap();
        assert_eq!(ctrl.session(), UdsSession::Default);
        assert_eq!(ctrl.log_snapshot()[1].service_label, "RES ??");
    }

    #[tokio::test]
    async fn test_intents_drive_dtc_store() {
        let ctrl = controller(Arc::new(MockBridge::default()));
        ctrl.send_intent(ServiceIntent::ReadDtcs).await.unwrap();
        assert_eq!(ctrl.dtcs().len(), 3);

        let high = ctrl.filter_dtcs(Filter::All, Filter::Only(DtcSeverity::High));
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].code, "U0100");

        ctrl.send_intent(ServiceIntent::ClearDtcs).await.unwrap();
        assert!(ctrl.dtcs().is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_policy_ignores_negative_response() {
        let bridge = Arc::new(MockBridge::default());
        bridge.add_response("10 03", "7F 10 22");
        let mut config = DashboardConfig::default();
        config.session.policy = TransitionPolicy::ConfirmedPositive;
        let ctrl = DiagnosticController::new(
            bridge,
            Arc::new(FixedClock::new(Local::now())),
            &config,
        );

        let exchange = ctrl.send_service("10", "03").await.unwrap();
        assert_eq!(exchange.response.payload, "7F 10 22");
        assert_eq!(ctrl.session(), UdsSession::Default);
        assert_eq!(ctrl.log_len(), 2);
    }

    #[tokio::test]
    async fn test_optimistic_policy_applies_on_negative_response() {
        let bridge = Arc::new(MockBridge::default());
        bridge.add_response("10 03", "7F 10 22");
        let ctrl = controller(bridge);
        ctrl.send_service("10", "03").await.unwrap();
        assert_eq!(ctrl.session(), UdsSession::Extended);
    }

    #[tokio::test]
    async fn test_enter_programming_session() {
        let bridge = Arc::new(MockBridge::default());
        let ctrl = controller(bridge.clone());
        ctrl.enter_programming_session().await.unwrap();
        assert_eq!(ctrl.session(), UdsSession::Programming);
        assert_eq!(
            bridge.sent_requests(),
            vec![("10".to_string(), "02".to_string())]
        );
    }

    #[tokio::test]
    async fn test_malformed_sid_is_logged_with_placeholder() {
        let ctrl = controller(Arc::new(MockBridge::default()));
        let exchange = ctrl.send_service("XY", "whatever").await.unwrap();
        assert_eq!(exchange.response.service_label, "RES ??");
        assert_eq!(exchange.response.payload, "ACK");
        assert_eq!(ctrl.session(), UdsSession::Default);
    }

    #[tokio::test]
    async fn test_disconnect_edge_resets_tracker() {
        let ctrl = controller(Arc::new(MockBridge::default()));
        ctrl.send_service("10", "03").await.unwrap();
        ctrl.send_service("27", "02 AA BB CC DD").await.unwrap();

        let (tx, rx) = watch::channel(true);
        ctrl.watch_connectivity(rx);
        tx.send(false).unwrap();

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(ctrl.session(), UdsSession::Default);
        assert_eq!(ctrl.security(), SecurityLevel::Locked);
    }
}
