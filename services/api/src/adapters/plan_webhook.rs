//! services/api/src/adapters/plan_webhook.rs
//!
//! This module contains the adapter for the external plan-generation webhook.
//! It implements the `PlanGenerationService` port from the `core` crate.
//!
//! The port cannot fail: any transport error, non-success status or unusable
//! response body resolves to a fixed fallback plan text so the surrounding
//! flow always completes with a body to store.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, warn};

use learnai_core::domain::PlanProfile;
use learnai_core::ports::PlanGenerationService;
use learnai_core::response::{extract_body, EMPTY_RESPONSE_FALLBACK, GENERATION_ERROR_FALLBACK};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `PlanGenerationService` against an automation
/// webhook.
#[derive(Clone)]
pub struct WebhookPlanAdapter {
    client: reqwest::Client,
    webhook_url: String,
}

/// The payload shape the webhook expects. The field labels are the external
/// contract and must not change.
#[derive(Serialize)]
struct PlanRequest<'a> {
    nom: &'a str,
    age: &'a str,
    niveau: &'a str,
    moyenne: &'a str,
    difficultes: &'a str,
    matiere: &'a str,
    demande: &'a str,
}

impl WebhookPlanAdapter {
    /// Creates a new `WebhookPlanAdapter`.
    pub fn new(client: reqwest::Client, webhook_url: String) -> Self {
        Self {
            client,
            webhook_url,
        }
    }

    /// One attempt, no retries, no client-side timeout: the caller waits for
    /// whatever the webhook answers.
    async fn call_webhook(&self, profile: &PlanProfile) -> Result<String, String> {
        let payload = PlanRequest {
            nom: "Utilisateur",
            age: &profile.age,
            niveau: profile.school_level.as_id(),
            moyenne: &profile.average_grade,
            difficultes: &profile.learning_difficulties,
            matiere: &profile.subject,
            demande: &profile.specific_requests,
        };

        let response = self
            .client
            .post(&self.webhook_url)
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| format!("Failed to reach plan webhook: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Plan webhook error: {}", response.status()));
        }

        response
            .text()
            .await
            .map_err(|e| format!("Failed to read plan webhook response: {}", e))
    }
}

//=========================================================================================
// `PlanGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PlanGenerationService for WebhookPlanAdapter {
    async fn generate_plan(&self, profile: &PlanProfile) -> String {
        match self.call_webhook(profile).await {
            Ok(raw) => extract_body(&raw).unwrap_or_else(|| {
                warn!(subject = %profile.subject, "plan webhook answered with an empty body");
                EMPTY_RESPONSE_FALLBACK.to_string()
            }),
            Err(e) => {
                error!(subject = %profile.subject, error = %e,
                    "plan generation failed, substituting fallback plan");
                GENERATION_ERROR_FALLBACK.to_string()
            }
        }
    }
}
