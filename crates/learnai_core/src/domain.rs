//! crates/learnai_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The school level selected in the intake form.
///
/// The wire identifiers (`primaire`, `college`, ...) are the values the
/// multi-step form submits; `display_label` is what reports and the PDF show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchoolLevel {
    Primaire,
    College,
    Lycee,
    Superieur,
}

impl SchoolLevel {
    /// Parses a wire identifier. Unknown values are rejected at the boundary.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "primaire" => Some(SchoolLevel::Primaire),
            "college" => Some(SchoolLevel::College),
            "lycee" => Some(SchoolLevel::Lycee),
            "superieur" => Some(SchoolLevel::Superieur),
            _ => None,
        }
    }

    pub fn as_id(&self) -> &'static str {
        match self {
            SchoolLevel::Primaire => "primaire",
            SchoolLevel::College => "college",
            SchoolLevel::Lycee => "lycee",
            SchoolLevel::Superieur => "superieur",
        }
    }

    pub fn display_label(&self) -> &'static str {
        match self {
            SchoolLevel::Primaire => "Primaire",
            SchoolLevel::College => "Collège",
            SchoolLevel::Lycee => "Lycée",
            SchoolLevel::Superieur => "Études supérieures",
        }
    }
}

/// The profile fields collected by the multi-step intake form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanProfile {
    pub age: String,
    pub school_level: SchoolLevel,
    pub average_grade: String,
    pub learning_difficulties: String,
    pub subject: String,
    pub specific_requests: String,
}

/// A single learning-plan record.
///
/// `id` is unique within a user's collection and `owner_id` never changes
/// once set. The working collection is kept newest-first; the saved subset
/// holds promoted copies flagged with `is_saved`.
#[derive(Debug, Clone)]
pub struct LearningPlanRecord {
    pub id: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub profile: PlanProfile,
    pub generated_plan_text: Option<String>,
    pub is_saved: bool,
}

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Who wrote a message in the assistant widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Ai,
}

/// A single exchange entry in the assistant conversation history.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// The rendered PDF export of a plan: derived file name plus document bytes.
#[derive(Debug, Clone)]
pub struct PdfExport {
    pub file_name: String,
    pub bytes: Vec<u8>,
}
