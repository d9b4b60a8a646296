//! Wiring between the command line and the diagnostic core

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use obdpro_client::{HttpAssistant, HttpBridge};
use obdpro_core::{BridgeTransport, SystemClock};
use obdpro_uds::{DashboardConfig, DiagnosticAssistant, DiagnosticController, MockBridge};
use tracing::debug;

/// Everything a command needs to talk to the vehicle
pub struct Workbench {
    pub config: DashboardConfig,
    pub bridge: Arc<dyn BridgeTransport>,
    pub controller: Arc<DiagnosticController>,
}

impl Workbench {
    /// Connect to the configured bridge, or to the simulated one
    pub fn connect(config: DashboardConfig, simulate: bool) -> Result<Self> {
        let bridge: Arc<dyn BridgeTransport> = if simulate {
            Arc::new(MockBridge::new(Duration::from_millis(20)))
        } else {
            let timeout = Duration::from_secs(config.bridge.connect_timeout_secs);
            Arc::new(
                HttpBridge::with_config(&config.bridge.base_url, timeout)
                    .context("Failed to create bridge client")?,
            )
        };
        debug!(endpoint = %bridge.endpoint(), "Using bridge");

        let controller = Arc::new(DiagnosticController::new(
            bridge.clone(),
            Arc::new(SystemClock),
            &config,
        ));

        Ok(Self {
            config,
            bridge,
            controller,
        })
    }

    /// Build the assistant from the `[assistant]` section
    pub fn assistant(&self) -> Result<DiagnosticAssistant> {
        let settings = &self.config.assistant;
        let endpoint = settings
            .endpoint
            .as_deref()
            .context("No assistant endpoint configured (set [assistant] endpoint or --assistant)")?;

        let backend = HttpAssistant::new(endpoint)
            .context("Failed to create assistant client")?
            .with_models(&settings.analysis_model, &settings.chat_model)
            .with_temperature(settings.temperature);

        Ok(DiagnosticAssistant::with_window(
            Arc::new(backend),
            self.config.log.analysis_window,
        ))
    }
}
