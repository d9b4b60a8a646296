//! AI-assisted log analysis and support chat
//!
//! Backend failures never surface as errors here: each call degrades to a
//! fixed fallback line the dashboard can show as-is.

use std::sync::Arc;

use obdpro_core::{AssistantBackend, AssistantProfile, CompletionRequest, ExchangeRecord};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::log::ANALYSIS_WINDOW;

pub const ANALYSIS_ERROR_REPLY: &str =
    "Expert reasoning system encountered an error. Check project billing or API key status.";
pub const ANALYSIS_EMPTY_REPLY: &str = "No logic path generated.";
pub const CHAT_ERROR_REPLY: &str = "Fast link failed.";
pub const CHAT_EMPTY_REPLY: &str = "Offline assistant.";

const ANALYSIS_SYSTEM: &str = "You are the GY OBD-II PRO AI Reasoning Engine. You have access to \
ISO-14229 full specifications. Your task is to provide 100% accurate diagnostic solutions using \
deep reasoning.";

const CHAT_SYSTEM: &str = "You are the fast-response support bot for a professional OBD-II tool. \
Be brief, professional, and accurate.";

/// Who said a chat line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

pub struct DiagnosticAssistant {
    backend: Arc<dyn AssistantBackend>,
    analysis_window: usize,
    history: RwLock<Vec<ChatTurn>>,
}

impl DiagnosticAssistant {
    pub fn new(backend: Arc<dyn AssistantBackend>) -> Self {
        Self::with_window(backend, ANALYSIS_WINDOW)
    }

    /// Analyse the last `analysis_window` records instead of the default 20
    pub fn with_window(backend: Arc<dyn AssistantBackend>, analysis_window: usize) -> Self {
        Self {
            backend,
            analysis_window: analysis_window.max(1),
            history: RwLock::new(Vec::new()),
        }
    }

    /// Analyse the tail of the message log
    ///
    /// Returns `None` when there is nothing to analyse.
    pub async fn analyze(&self, log: &[ExchangeRecord]) -> Option<String> {
        if log.is_empty() {
            return None;
        }

        let skip = log.len().saturating_sub(self.analysis_window);
        let excerpt = log[skip..]
            .iter()
            .map(ExchangeRecord::log_line)
            .collect::<Vec<_>>()
            .join("\n");
        debug!(records = log.len() - skip, "Requesting log analysis");

        let request = CompletionRequest {
            profile: AssistantProfile::Analysis,
            system: ANALYSIS_SYSTEM.to_string(),
            prompt: analysis_prompt(&excerpt),
        };

        let reply = match self.backend.complete(request).await {
            Ok(text) if text.trim().is_empty() => ANALYSIS_EMPTY_REPLY.to_string(),
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Log analysis failed");
                ANALYSIS_ERROR_REPLY.to_string()
            }
        };
        Some(reply)
    }

    /// Ask the support bot; blank queries are ignored
    pub async fn chat(&self, query: &str) -> Option<String> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        self.push(ChatRole::User, query);

        let request = CompletionRequest {
            profile: AssistantProfile::Chat,
            system: CHAT_SYSTEM.to_string(),
            prompt: query.to_string(),
        };

        let reply = match self.backend.complete(request).await {
            Ok(text) if text.trim().is_empty() => CHAT_EMPTY_REPLY.to_string(),
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                CHAT_ERROR_REPLY.to_string()
            }
        };
        self.push(ChatRole::Assistant, &reply);
        Some(reply)
    }

    pub fn history(&self) -> Vec<ChatTurn> {
        self.history.read().clone()
    }

    pub fn clear_history(&self) {
        self.history.write().clear();
    }

    fn push(&self, role: ChatRole, text: &str) {
        self.history.write().push(ChatTurn {
            role,
            text: text.to_string(),
        });
    }
}

fn analysis_prompt(excerpt: &str) -> String {
    format!(
        "As an elite automotive engineer, perform a deep-reasoning forensic analysis of these UDS \
         logs and DTCs.\nAnalyze voltage fluctuations, service response timing, and error code \
         interdependencies.\nProvide a logic-driven diagnostic path.\n\nDATA SET:\n{}",
        excerpt
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Local, TimeZone};
    use obdpro_core::{BridgeError, BridgeResult, Direction};
    use parking_lot::Mutex;

    /// Replies with a fixed result and remembers the last request
    struct ScriptedBackend {
        reply: BridgeResult<String>,
        last: Mutex<Option<CompletionRequest>>,
    }

    impl ScriptedBackend {
        fn new(reply: BridgeResult<String>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                last: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl AssistantBackend for ScriptedBackend {
        async fn complete(&self, request: CompletionRequest) -> BridgeResult<String> {
            *self.last.lock() = Some(request);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(BridgeError::Transport("offline".to_string())),
            }
        }
    }

    fn records(n: usize) -> Vec<ExchangeRecord> {
        (0..n)
            .map(|i| ExchangeRecord {
                direction: Direction::Outbound,
                can_id: "0x7E0".to_string(),
                service_label: "SID 22".to_string(),
                service_id: "22".to_string(),
                payload: format!("REC{:02}", i),
                timestamp: Local.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_analyze_empty_log_is_noop() {
        let backend = ScriptedBackend::new(Ok("never".to_string()));
        let assistant = DiagnosticAssistant::new(backend.clone());
        assert_eq!(assistant.analyze(&[]).await, None);
        assert!(backend.last.lock().is_none());
    }

    #[tokio::test]
    async fn test_analyze_uses_last_twenty_records() {
        let backend = ScriptedBackend::new(Ok("Check MAF sensor".to_string()));
        let assistant = DiagnosticAssistant::new(backend.clone());

        let reply = assistant.analyze(&records(30)).await;
        assert_eq!(reply.as_deref(), Some("Check MAF sensor"));

        let request = backend.last.lock().clone().unwrap();
        assert_eq!(request.profile, AssistantProfile::Analysis);
        assert!(!request.prompt.contains("REC09"));
        assert!(request.prompt.contains("REC10"));
        assert!(request.prompt.contains("REC29"));
    }

    #[tokio::test]
    async fn test_analyze_fallbacks() {
        let failing = DiagnosticAssistant::new(ScriptedBackend::new(Err(
            BridgeError::Transport("down".to_string()),
        )));
        assert_eq!(
            failing.analyze(&records(1)).await.as_deref(),
            Some(ANALYSIS_ERROR_REPLY)
        );

        let empty = DiagnosticAssistant::new(ScriptedBackend::new(Ok("  ".to_string())));
        assert_eq!(
            empty.analyze(&records(1)).await.as_deref(),
            Some(ANALYSIS_EMPTY_REPLY)
        );
    }

    #[tokio::test]
    async fn test_chat() {
        let assistant = DiagnosticAssistant::new(ScriptedBackend::new(Ok("Use 10 03".to_string())));
        assert_eq!(assistant.chat("   ").await, None);
        assert!(assistant.history().is_empty());

        let reply = assistant.chat("How do I enter extended session?").await;
        assert_eq!(reply.as_deref(), Some("Use 10 03"));
        let history = assistant.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, ChatRole::User);
        assert_eq!(history[1].text, "Use 10 03");
    }

    #[tokio::test]
    async fn test_chat_fallbacks() {
        let failing = DiagnosticAssistant::new(ScriptedBackend::new(Err(BridgeError::Timeout)));
        assert_eq!(failing.chat("hi").await.as_deref(), Some(CHAT_ERROR_REPLY));

        let empty = DiagnosticAssistant::new(ScriptedBackend::new(Ok(String::new())));
        assert_eq!(empty.chat("hi").await.as_deref(), Some(CHAT_EMPTY_REPLY));
    }
}
