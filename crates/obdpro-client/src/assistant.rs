//! HTTP completion backend for the diagnostic assistant

use std::time::Duration;

use async_trait::async_trait;
use obdpro_core::{AssistantBackend, AssistantProfile, BridgeResult, CompletionRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::bridge::DEFAULT_CONNECT_TIMEOUT;
use crate::error::{ClientError, Result};

pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Request body posted to the completion endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionBody {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
}

/// Response body of the completion endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionReply {
    #[serde(default)]
    pub text: String,
}

/// Assistant backend that posts prompts to a JSON completion endpoint
#[derive(Debug, Clone)]
pub struct HttpAssistant {
    client: Client,
    endpoint: Url,
    analysis_model: String,
    chat_model: String,
    temperature: f32,
}

impl HttpAssistant {
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_connect_timeout(endpoint, DEFAULT_CONNECT_TIMEOUT)
    }

    pub fn with_connect_timeout(endpoint: &str, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self {
            client,
            endpoint: Url::parse(endpoint)?,
            analysis_model: DEFAULT_ANALYSIS_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    /// Override the model names used for each profile
    pub fn with_models(mut self, analysis: impl Into<String>, chat: impl Into<String>) -> Self {
        self.analysis_model = analysis.into();
        self.chat_model = chat.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model_for(&self, profile: AssistantProfile) -> &str {
        match profile {
            AssistantProfile::Analysis => &self.analysis_model,
            AssistantProfile::Chat => &self.chat_model,
        }
    }

    #[instrument(skip(self, request), fields(profile = ?request.profile))]
    pub async fn post_completion(&self, request: &CompletionRequest) -> Result<String> {
        let body = CompletionBody {
            model: self.model_for(request.profile).to_string(),
            system: request.system.clone(),
            prompt: request.prompt.clone(),
            temperature: self.temperature,
        };
        debug!(model = %body.model, "Posting completion request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::server_error(
                status.as_u16(),
                format!("HTTP {}", status),
            ));
        }

        let reply: CompletionReply = response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))?;
        Ok(reply.text)
    }
}

#[async_trait]
impl AssistantBackend for HttpAssistant {
    async fn complete(&self, request: CompletionRequest) -> BridgeResult<String> {
        Ok(self.post_completion(&request).await?)
    }
}
