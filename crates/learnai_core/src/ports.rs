//! crates/learnai_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like storage or webhooks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    ChatMessage, LearningPlanRecord, PdfExport, PlanProfile, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., storage, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The Plan Store plus the identity and per-user state collections.
///
/// Every mutating operation persists the full updated collection for the
/// affected user before returning; there is no deferred flush.
#[async_trait]
pub trait StorageService: Send + Sync {
    // --- Auth Methods ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Plan Store ---

    /// Creates a record, assigns `id`/`created_at`/`owner_id`, prepends it to
    /// the user's working collection and persists before returning. Callers
    /// may rely on position 0 of `list_plans` being the newest record.
    async fn create_plan(
        &self,
        user_id: Uuid,
        profile: PlanProfile,
        generated_plan_text: Option<String>,
    ) -> PortResult<LearningPlanRecord>;

    /// All working records owned by `user_id`, newest first. Legacy records
    /// without an owner are adopted by `user_id` on load.
    async fn list_plans(&self, user_id: Uuid) -> PortResult<Vec<LearningPlanRecord>>;

    /// The promoted subset, newest first.
    async fn list_saved_plans(&self, user_id: Uuid) -> PortResult<Vec<LearningPlanRecord>>;

    /// Looks a plan up by id, searching the saved collection first and the
    /// working history second.
    async fn get_plan_by_id(&self, user_id: Uuid, plan_id: &str) -> PortResult<LearningPlanRecord>;

    /// Copies the current plan (newest working record) into the saved subset
    /// with `is_saved = true`. Idempotent: promoting an already-saved id, or
    /// promoting with no current plan, is a no-op. Returns the saved record
    /// when one exists.
    async fn promote_current_to_saved(
        &self,
        user_id: Uuid,
    ) -> PortResult<Option<LearningPlanRecord>>;

    /// Removes `plan_id` from the saved subset only; the working history is
    /// unaffected. Deleting an unknown id is a silent no-op.
    async fn delete_saved_plan(&self, user_id: Uuid, plan_id: &str) -> PortResult<()>;

    /// Number of records in the user's working collection.
    async fn plan_count(&self, user_id: Uuid) -> PortResult<usize>;

    // --- Subscription ---
    async fn has_subscription(&self, user_id: Uuid) -> PortResult<bool>;

    async fn set_subscription(&self, user_id: Uuid, active: bool) -> PortResult<()>;

    // --- Assistant history ---
    async fn append_chat_messages(
        &self,
        user_id: Uuid,
        messages: Vec<ChatMessage>,
    ) -> PortResult<()>;

    async fn get_chat_history(&self, user_id: Uuid) -> PortResult<Vec<ChatMessage>>;

    async fn clear_chat_history(&self, user_id: Uuid) -> PortResult<()>;
}

/// The external plan-generation webhook.
///
/// This port cannot fail: transport errors, bad statuses and malformed
/// responses are converted into a fixed fallback plan body inside the
/// adapter, so the surrounding flow (record creation, storage, navigation)
/// always completes.
#[async_trait]
pub trait PlanGenerationService: Send + Sync {
    async fn generate_plan(&self, profile: &PlanProfile) -> String;
}

/// The external chat-answer webhook behind the assistant widget.
/// Same always-succeeds contract as [`PlanGenerationService`].
#[async_trait]
pub trait ChatAnswerService: Send + Sync {
    async fn answer_question(&self, question: &str) -> String;
}

/// Renders a plan plus its profile metadata into a paginated PDF document.
pub trait PlanExportService: Send + Sync {
    fn render_pdf(&self, plan: &LearningPlanRecord) -> PortResult<PdfExport>;
}
