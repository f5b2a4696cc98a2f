//! services/api/src/adapters/store.rs
//!
//! This module contains the storage adapter, which is the concrete implementation
//! of the `StorageService` port from the `core` crate. All state lives in JSON
//! collections under the data directory, one set of files per user, and every
//! mutation rewrites the full affected collection before returning.
//!
//! A corrupted collection never takes the service down: the read degrades to
//! an empty collection, the failure goes to the log, and the store stays
//! writable.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use learnai_core::domain::{
    ChatMessage, LearningPlanRecord, PlanProfile, SchoolLevel, Sender, User, UserCredentials,
};
use learnai_core::ports::{PortError, PortResult, StorageService};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A file-backed storage adapter that implements the `StorageService` port.
pub struct FileStore {
    data_dir: PathBuf,
    // Serializes read-modify-write cycles on the collection files.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Creates a new `FileStore` rooted at `data_dir`.
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            write_lock: Mutex::new(()),
        }
    }

    fn users_path(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    fn auth_sessions_path(&self) -> PathBuf {
        self.data_dir.join("auth_sessions.json")
    }

    fn user_dir(&self, user_id: Uuid) -> PathBuf {
        self.data_dir.join("users").join(user_id.to_string())
    }

    fn plans_path(&self, user_id: Uuid) -> PathBuf {
        self.user_dir(user_id).join("plans.json")
    }

    fn saved_plans_path(&self, user_id: Uuid) -> PathBuf {
        self.user_dir(user_id).join("saved_plans.json")
    }

    fn subscription_path(&self, user_id: Uuid) -> PathBuf {
        self.user_dir(user_id).join("subscription.json")
    }

    fn chat_history_path(&self, user_id: Uuid) -> PathBuf {
        self.user_dir(user_id).join("chat_history.json")
    }

    /// Reads a JSON collection, degrading to empty on a missing or corrupted
    /// file.
    async fn read_collection<T: DeserializeOwned>(&self, path: &Path) -> Vec<T> {
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(items) => items,
                Err(e) => {
                    error!(path = %path.display(), error = %e,
                        "corrupted collection, degrading to empty");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to read collection");
                Vec::new()
            }
        }
    }

    /// Persists the full collection synchronously before returning.
    async fn write_collection<T: Serialize>(&self, path: &Path, items: &[T]) -> PortResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }
        let json =
            serde_json::to_string_pretty(items).map_err(|e| PortError::Unexpected(e.to_string()))?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    /// Loads a plan collection and runs the one-time ownership migration:
    /// legacy records without an owner are adopted by the loading user (with
    /// an audit log line), records owned by someone else are dropped.
    async fn load_plan_collection(&self, user_id: Uuid, path: &Path) -> Vec<PlanRecordFile> {
        let records: Vec<PlanRecordFile> = self.read_collection(path).await;
        let total = records.len();
        let mut kept: Vec<PlanRecordFile> = records
            .into_iter()
            .filter(|r| r.user_id.is_none() || r.user_id == Some(user_id))
            .collect();

        let adopted = kept.iter().filter(|r| r.user_id.is_none()).count();
        if adopted > 0 || kept.len() != total {
            for record in kept.iter_mut() {
                record.user_id.get_or_insert(user_id);
            }
            info!(%user_id, adopted, dropped = total - kept.len(),
                "migrated plan collection ownership");
            if let Err(e) = self.write_collection(path, &kept).await {
                error!(%user_id, error = %e, "failed to persist ownership migration");
            }
        }
        kept
    }
}

//=========================================================================================
// "Impure" Storage Record Structs
//=========================================================================================

/// On-disk plan record; the field names match the JSON shape the original
/// client stored, so existing collections load as-is.
#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct PlanRecordFile {
    id: String,
    age: String,
    school_level: String,
    average_grade: String,
    learning_difficulties: String,
    subject: String,
    specific_requests: String,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    generated_plan: Option<String>,
    #[serde(default)]
    is_saved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<Uuid>,
}

impl PlanRecordFile {
    fn from_domain(record: &LearningPlanRecord) -> Self {
        Self {
            id: record.id.clone(),
            age: record.profile.age.clone(),
            school_level: record.profile.school_level.as_id().to_string(),
            average_grade: record.profile.average_grade.clone(),
            learning_difficulties: record.profile.learning_difficulties.clone(),
            subject: record.profile.subject.clone(),
            specific_requests: record.profile.specific_requests.clone(),
            created_at: record.created_at,
            generated_plan: record.generated_plan_text.clone(),
            is_saved: record.is_saved,
            user_id: Some(record.owner_id),
        }
    }

    fn to_domain(self, owner_id: Uuid) -> Option<LearningPlanRecord> {
        let school_level = match SchoolLevel::from_id(&self.school_level) {
            Some(level) => level,
            None => {
                warn!(plan_id = %self.id, level = %self.school_level,
                    "skipping record with unknown school level");
                return None;
            }
        };
        Some(LearningPlanRecord {
            id: self.id,
            owner_id: self.user_id.unwrap_or(owner_id),
            created_at: self.created_at,
            profile: PlanProfile {
                age: self.age,
                school_level,
                average_grade: self.average_grade,
                learning_difficulties: self.learning_difficulties,
                subject: self.subject,
                specific_requests: self.specific_requests,
            },
            generated_plan_text: self.generated_plan,
            is_saved: self.is_saved,
        })
    }
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct UserFile {
    user_id: Uuid,
    email: String,
    hashed_password: String,
    created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct AuthSessionFile {
    id: String,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct ChatMessageFile {
    id: String,
    sender: String,
    text: String,
    timestamp: DateTime<Utc>,
}

impl ChatMessageFile {
    fn from_domain(message: &ChatMessage) -> Self {
        Self {
            id: message.id.clone(),
            sender: match message.sender {
                Sender::User => "user".to_string(),
                Sender::Ai => "ai".to_string(),
            },
            text: message.text.clone(),
            timestamp: message.timestamp,
        }
    }

    fn to_domain(self) -> ChatMessage {
        ChatMessage {
            id: self.id,
            sender: if self.sender == "user" { Sender::User } else { Sender::Ai },
            text: self.text,
            timestamp: self.timestamp,
        }
    }
}

/// Subscription status flag, stored as the original client stored it.
#[derive(Serialize, Deserialize)]
struct SubscriptionFile {
    status: String,
}

//=========================================================================================
// `StorageService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StorageService for FileStore {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let _guard = self.write_lock.lock().await;
        let mut users: Vec<UserFile> = self.read_collection(&self.users_path()).await;
        if users.iter().any(|u| u.email == email) {
            return Err(PortError::Unexpected(format!(
                "A user with email {} already exists",
                email
            )));
        }
        let user = UserFile {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            created_at: Utc::now(),
        };
        users.push(user.clone());
        self.write_collection(&self.users_path(), &users).await?;
        Ok(User {
            user_id: user.user_id,
            email: Some(user.email),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let users: Vec<UserFile> = self.read_collection(&self.users_path()).await;
        users
            .into_iter()
            .find(|u| u.email == email)
            .map(|u| UserCredentials {
                user_id: u.user_id,
                email: u.email,
                hashed_password: u.hashed_password,
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut sessions: Vec<AuthSessionFile> =
            self.read_collection(&self.auth_sessions_path()).await;
        // Expired sessions are pruned opportunistically on write.
        let now = Utc::now();
        sessions.retain(|s| s.expires_at > now);
        sessions.push(AuthSessionFile {
            id: session_id.to_string(),
            user_id,
            expires_at,
        });
        self.write_collection(&self.auth_sessions_path(), &sessions)
            .await
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let sessions: Vec<AuthSessionFile> =
            self.read_collection(&self.auth_sessions_path()).await;
        sessions
            .into_iter()
            .find(|s| s.id == session_id && s.expires_at > Utc::now())
            .map(|s| s.user_id)
            .ok_or_else(|| PortError::NotFound("Auth session not found".to_string()))
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut sessions: Vec<AuthSessionFile> =
            self.read_collection(&self.auth_sessions_path()).await;
        sessions.retain(|s| s.id != session_id);
        self.write_collection(&self.auth_sessions_path(), &sessions)
            .await
    }

    async fn create_plan(
        &self,
        user_id: Uuid,
        profile: PlanProfile,
        generated_plan_text: Option<String>,
    ) -> PortResult<LearningPlanRecord> {
        let _guard = self.write_lock.lock().await;
        let path = self.plans_path(user_id);
        let mut records = self.load_plan_collection(user_id, &path).await;

        let record = LearningPlanRecord {
            id: format!("plan_{}", Uuid::new_v4().simple()),
            owner_id: user_id,
            created_at: Utc::now(),
            profile,
            generated_plan_text,
            is_saved: false,
        };

        // Newest first: callers rely on position 0 being the current plan.
        records.insert(0, PlanRecordFile::from_domain(&record));
        self.write_collection(&path, &records).await?;
        Ok(record)
    }

    async fn list_plans(&self, user_id: Uuid) -> PortResult<Vec<LearningPlanRecord>> {
        let path = self.plans_path(user_id);
        let records = self.load_plan_collection(user_id, &path).await;
        Ok(records
            .into_iter()
            .filter_map(|r| r.to_domain(user_id))
            .collect())
    }

    async fn list_saved_plans(&self, user_id: Uuid) -> PortResult<Vec<LearningPlanRecord>> {
        let path = self.saved_plans_path(user_id);
        let records = self.load_plan_collection(user_id, &path).await;
        Ok(records
            .into_iter()
            .filter_map(|r| r.to_domain(user_id))
            .collect())
    }

    async fn get_plan_by_id(&self, user_id: Uuid, plan_id: &str) -> PortResult<LearningPlanRecord> {
        // The saved collection is searched first, then the working history.
        for record in self.list_saved_plans(user_id).await? {
            if record.id == plan_id {
                return Ok(record);
            }
        }
        for record in self.list_plans(user_id).await? {
            if record.id == plan_id {
                return Ok(record);
            }
        }
        Err(PortError::NotFound(format!("Plan {} not found", plan_id)))
    }

    async fn promote_current_to_saved(
        &self,
        user_id: Uuid,
    ) -> PortResult<Option<LearningPlanRecord>> {
        let _guard = self.write_lock.lock().await;

        let working_path = self.plans_path(user_id);
        let working = self.load_plan_collection(user_id, &working_path).await;
        let Some(current) = working.into_iter().next() else {
            return Ok(None);
        };

        let saved_path = self.saved_plans_path(user_id);
        let mut saved = self.load_plan_collection(user_id, &saved_path).await;
        if let Some(existing) = saved.iter().find(|r| r.id == current.id) {
            // Promoting an already-saved plan is a no-op.
            return Ok(existing.clone().to_domain(user_id));
        }

        let mut promoted = current;
        promoted.is_saved = true;
        promoted.user_id = Some(user_id);
        saved.insert(0, promoted.clone());
        self.write_collection(&saved_path, &saved).await?;
        Ok(promoted.to_domain(user_id))
    }

    async fn delete_saved_plan(&self, user_id: Uuid, plan_id: &str) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.saved_plans_path(user_id);
        let mut saved = self.load_plan_collection(user_id, &path).await;
        // Deleting an unknown id leaves the collection unchanged.
        saved.retain(|r| r.id != plan_id);
        self.write_collection(&path, &saved).await
    }

    async fn plan_count(&self, user_id: Uuid) -> PortResult<usize> {
        let path = self.plans_path(user_id);
        Ok(self.load_plan_collection(user_id, &path).await.len())
    }

    async fn has_subscription(&self, user_id: Uuid) -> PortResult<bool> {
        let path = self.subscription_path(user_id);
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<SubscriptionFile>(&raw) {
                Ok(sub) => Ok(sub.status == "active"),
                Err(e) => {
                    error!(path = %path.display(), error = %e,
                        "corrupted subscription flag, treating as inactive");
                    Ok(false)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }

    async fn set_subscription(&self, user_id: Uuid, active: bool) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.subscription_path(user_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }
        let status = if active { "active" } else { "inactive" };
        let sub = SubscriptionFile {
            status: status.to_string(),
        };
        let json =
            serde_json::to_string_pretty(&sub).map_err(|e| PortError::Unexpected(e.to_string()))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn append_chat_messages(
        &self,
        user_id: Uuid,
        messages: Vec<ChatMessage>,
    ) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.chat_history_path(user_id);
        let mut history: Vec<ChatMessageFile> = self.read_collection(&path).await;
        history.extend(messages.iter().map(ChatMessageFile::from_domain));
        self.write_collection(&path, &history).await
    }

    async fn get_chat_history(&self, user_id: Uuid) -> PortResult<Vec<ChatMessage>> {
        let path = self.chat_history_path(user_id);
        let history: Vec<ChatMessageFile> = self.read_collection(&path).await;
        Ok(history.into_iter().map(ChatMessageFile::to_domain).collect())
    }

    async fn clear_chat_history(&self, user_id: Uuid) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(self.chat_history_path(user_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }
}
