//! services/api/src/adapters/chat_webhook.rs
//!
//! This module contains the adapter for the chat-answer webhook behind the
//! assistant widget. It implements the `ChatAnswerService` port from the
//! `core` crate with the same always-succeeds contract as plan generation.

use async_trait::async_trait;
use serde::Serialize;
use tracing::error;

use learnai_core::ports::ChatAnswerService;
use learnai_core::response::{
    extract_body, trim_wrapping_quotes, CHAT_EMPTY_FALLBACK, CHAT_ERROR_FALLBACK,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ChatAnswerService` against an automation
/// webhook.
#[derive(Clone)]
pub struct WebhookChatAdapter {
    client: reqwest::Client,
    webhook_url: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    question: &'a str,
}

impl WebhookChatAdapter {
    /// Creates a new `WebhookChatAdapter`.
    pub fn new(client: reqwest::Client, webhook_url: String) -> Self {
        Self {
            client,
            webhook_url,
        }
    }

    async fn call_webhook(&self, question: &str) -> Result<String, String> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&ChatRequest { question })
            .send()
            .await
            .map_err(|e| format!("Failed to reach chat webhook: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Chat webhook error: {}", response.status()));
        }

        response
            .text()
            .await
            .map_err(|e| format!("Failed to read chat webhook response: {}", e))
    }
}

//=========================================================================================
// `ChatAnswerService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatAnswerService for WebhookChatAdapter {
    async fn answer_question(&self, question: &str) -> String {
        match self.call_webhook(question).await {
            Ok(raw) => match extract_body(&raw) {
                // The webhook sometimes wraps the answer in its own quoting.
                Some(answer) => trim_wrapping_quotes(&answer),
                None => CHAT_EMPTY_FALLBACK.to_string(),
            },
            Err(e) => {
                error!(error = %e, "chat answer failed, substituting fallback reply");
                CHAT_ERROR_FALLBACK.to_string()
            }
        }
    }
}
