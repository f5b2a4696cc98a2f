//! Integration tests for the file-backed storage adapter.
//!
//! Each test gets an isolated temporary data directory, so the suites can
//! run in parallel without sharing collections.

use api_lib::adapters::FileStore;
use learnai_core::domain::{ChatMessage, PlanProfile, SchoolLevel, Sender};
use learnai_core::ports::{PortError, StorageService};
use tempfile::TempDir;
use uuid::Uuid;

fn temp_store() -> (FileStore, TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let store = FileStore::new(dir.path().to_path_buf());
    (store, dir)
}

fn profile(subject: &str) -> PlanProfile {
    PlanProfile {
        age: "16".to_string(),
        school_level: SchoolLevel::Lycee,
        average_grade: "14/20".to_string(),
        learning_difficulties: "concentration".to_string(),
        subject: subject.to_string(),
        specific_requests: "plus d'exercices".to_string(),
    }
}

#[tokio::test]
async fn created_plans_are_listed_newest_first() {
    let (store, _dir) = temp_store();
    let user = Uuid::new_v4();

    let first = store
        .create_plan(user, profile("Maths"), Some("plan 1".to_string()))
        .await
        .unwrap();
    let second = store
        .create_plan(user, profile("Français"), Some("plan 2".to_string()))
        .await
        .unwrap();

    let plans = store.list_plans(user).await.unwrap();
    assert_eq!(plans.len(), 2);
    assert_eq!(plans[0].id, second.id, "position 0 must be the newest record");
    assert_eq!(plans[1].id, first.id);
    assert_eq!(store.plan_count(user).await.unwrap(), 2);
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn collections_are_namespaced_per_user() {
    let (store, _dir) = temp_store();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    store
        .create_plan(alice, profile("Maths"), None)
        .await
        .unwrap();

    assert_eq!(store.plan_count(alice).await.unwrap(), 1);
    assert_eq!(store.plan_count(bob).await.unwrap(), 0);
    assert!(store.list_plans(bob).await.unwrap().is_empty());
}

#[tokio::test]
async fn promoting_twice_saves_exactly_one_entry() {
    let (store, _dir) = temp_store();
    let user = Uuid::new_v4();

    let created = store
        .create_plan(user, profile("Maths"), Some("le plan".to_string()))
        .await
        .unwrap();

    let promoted = store.promote_current_to_saved(user).await.unwrap().unwrap();
    assert_eq!(promoted.id, created.id);
    assert!(promoted.is_saved);

    // Second promotion is a no-op.
    let again = store.promote_current_to_saved(user).await.unwrap().unwrap();
    assert_eq!(again.id, created.id);

    let saved = store.list_saved_plans(user).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id, created.id);

    // The working copy is untouched by promotion.
    let working = store.list_plans(user).await.unwrap();
    assert_eq!(working.len(), 1);
    assert!(!working[0].is_saved);
}

#[tokio::test]
async fn promoting_without_a_current_plan_is_a_no_op() {
    let (store, _dir) = temp_store();
    let user = Uuid::new_v4();
    assert!(store.promote_current_to_saved(user).await.unwrap().is_none());
    assert!(store.list_saved_plans(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_an_unknown_saved_id_is_a_silent_no_op() {
    let (store, _dir) = temp_store();
    let user = Uuid::new_v4();

    store
        .create_plan(user, profile("Maths"), None)
        .await
        .unwrap();
    store.promote_current_to_saved(user).await.unwrap();

    store.delete_saved_plan(user, "plan_inexistant").await.unwrap();
    assert_eq!(store.list_saved_plans(user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_a_saved_plan_leaves_working_history_intact() {
    let (store, _dir) = temp_store();
    let user = Uuid::new_v4();

    let created = store
        .create_plan(user, profile("Maths"), None)
        .await
        .unwrap();
    store.promote_current_to_saved(user).await.unwrap();

    store.delete_saved_plan(user, &created.id).await.unwrap();
    assert!(store.list_saved_plans(user).await.unwrap().is_empty());
    assert_eq!(store.list_plans(user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn plan_lookup_searches_saved_then_working() {
    let (store, _dir) = temp_store();
    let user = Uuid::new_v4();

    let created = store
        .create_plan(user, profile("Maths"), Some("le plan".to_string()))
        .await
        .unwrap();
    store.promote_current_to_saved(user).await.unwrap();

    let found = store.get_plan_by_id(user, &created.id).await.unwrap();
    assert!(found.is_saved, "the saved copy wins the lookup");

    let missing = store.get_plan_by_id(user, "plan_inexistant").await;
    assert!(matches!(missing, Err(PortError::NotFound(_))));
}

#[tokio::test]
async fn corrupted_collection_degrades_to_empty_and_stays_writable() {
    let (store, dir) = temp_store();
    let user = Uuid::new_v4();

    let plans_path = dir
        .path()
        .join("users")
        .join(user.to_string())
        .join("plans.json");
    std::fs::create_dir_all(plans_path.parent().unwrap()).unwrap();
    std::fs::write(&plans_path, "{ this is not json").unwrap();

    assert!(store.list_plans(user).await.unwrap().is_empty());
    assert_eq!(store.plan_count(user).await.unwrap(), 0);

    // The store remains writable after the degraded read.
    store
        .create_plan(user, profile("Maths"), None)
        .await
        .unwrap();
    assert_eq!(store.plan_count(user).await.unwrap(), 1);
}

#[tokio::test]
async fn legacy_records_without_an_owner_are_adopted_on_load() {
    let (store, dir) = temp_store();
    let user = Uuid::new_v4();

    let plans_path = dir
        .path()
        .join("users")
        .join(user.to_string())
        .join("plans.json");
    std::fs::create_dir_all(plans_path.parent().unwrap()).unwrap();
    std::fs::write(
        &plans_path,
        r#"[{
            "id": "plan_legacy",
            "age": "12",
            "schoolLevel": "college",
            "averageGrade": "11/20",
            "learningDifficulties": "",
            "subject": "Histoire",
            "specificRequests": "",
            "createdAt": "2024-01-01T00:00:00Z",
            "isSaved": false
        }]"#,
    )
    .unwrap();

    let plans = store.list_plans(user).await.unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].owner_id, user);

    // The migration is persisted: the rewritten file carries the owner.
    let rewritten = std::fs::read_to_string(&plans_path).unwrap();
    assert!(rewritten.contains(&user.to_string()));
}

#[tokio::test]
async fn subscription_flag_round_trips_and_defaults_to_inactive() {
    let (store, _dir) = temp_store();
    let user = Uuid::new_v4();

    assert!(!store.has_subscription(user).await.unwrap());
    store.set_subscription(user, true).await.unwrap();
    assert!(store.has_subscription(user).await.unwrap());
    store.set_subscription(user, false).await.unwrap();
    assert!(!store.has_subscription(user).await.unwrap());
}

#[tokio::test]
async fn chat_history_appends_and_clears() {
    let (store, _dir) = temp_store();
    let user = Uuid::new_v4();

    let now = chrono::Utc::now();
    store
        .append_chat_messages(
            user,
            vec![
                ChatMessage {
                    id: "m1".to_string(),
                    sender: Sender::User,
                    text: "Qu'est-ce qu'une fraction ?".to_string(),
                    timestamp: now,
                },
                ChatMessage {
                    id: "m2".to_string(),
                    sender: Sender::Ai,
                    text: "Une fraction représente une partie d'un tout.".to_string(),
                    timestamp: now,
                },
            ],
        )
        .await
        .unwrap();

    let history = store.get_chat_history(user).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].sender, Sender::User);
    assert_eq!(history[1].sender, Sender::Ai);

    store.clear_chat_history(user).await.unwrap();
    assert!(store.get_chat_history(user).await.unwrap().is_empty());
    // Clearing an already-empty history is fine too.
    store.clear_chat_history(user).await.unwrap();
}

#[tokio::test]
async fn auth_sessions_validate_and_expire() {
    let (store, _dir) = temp_store();
    let user = store
        .create_user_with_email("eleve@example.com", "$argon2id$fake")
        .await
        .unwrap();

    let creds = store.get_user_by_email("eleve@example.com").await.unwrap();
    assert_eq!(creds.user_id, user.user_id);

    store
        .create_auth_session("session-1", user.user_id, chrono::Utc::now() + chrono::Duration::days(1))
        .await
        .unwrap();
    assert_eq!(
        store.validate_auth_session("session-1").await.unwrap(),
        user.user_id
    );

    // Expired sessions do not validate.
    store
        .create_auth_session("session-2", user.user_id, chrono::Utc::now() - chrono::Duration::days(1))
        .await
        .unwrap();
    assert!(store.validate_auth_session("session-2").await.is_err());

    store.delete_auth_session("session-1").await.unwrap();
    assert!(store.validate_auth_session("session-1").await.is_err());

    // Duplicate signups are rejected.
    assert!(store
        .create_user_with_email("eleve@example.com", "$argon2id$other")
        .await
        .is_err());
}
