//! Integration tests for the plan-creation flow: quota gating, webhook
//! response cleanup, and the always-persisted fallback on generation
//! failure. The generation port is stubbed so no network is involved.

use std::sync::atomic::{AtomicUsize, Ordering};

use api_lib::adapters::FileStore;
use api_lib::web::plans::{generate_and_store, CreatePlanOutcome};
use async_trait::async_trait;
use learnai_core::domain::{PlanProfile, SchoolLevel};
use learnai_core::layout::{classify_line, LineKind};
use learnai_core::ports::{PlanGenerationService, StorageService};
use learnai_core::response::{extract_body, EMPTY_RESPONSE_FALLBACK, GENERATION_ERROR_FALLBACK};
use tempfile::TempDir;
use uuid::Uuid;

/// A stub webhook endpoint: the canned body goes through the same response
/// resolution as the real adapter, and invocations are counted.
struct StubGenerator {
    body: String,
    calls: AtomicUsize,
}

impl StubGenerator {
    fn new(body: &str) -> Self {
        Self {
            body: body.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlanGenerationService for StubGenerator {
    async fn generate_plan(&self, _profile: &PlanProfile) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        extract_body(&self.body).unwrap_or_else(|| EMPTY_RESPONSE_FALLBACK.to_string())
    }
}

/// A stub standing in for a webhook that is down: the adapter contract says
/// the port still answers, with the technical-error fallback body.
struct FailingGenerator;

#[async_trait]
impl PlanGenerationService for FailingGenerator {
    async fn generate_plan(&self, _profile: &PlanProfile) -> String {
        GENERATION_ERROR_FALLBACK.to_string()
    }
}

fn temp_store() -> (FileStore, TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let store = FileStore::new(dir.path().to_path_buf());
    (store, dir)
}

fn intake_profile() -> PlanProfile {
    PlanProfile {
        age: "16".to_string(),
        school_level: SchoolLevel::Lycee,
        average_grade: "14/20".to_string(),
        learning_difficulties: "concentration".to_string(),
        subject: "Mathématiques".to_string(),
        specific_requests: "plus d'exercices".to_string(),
    }
}

#[tokio::test]
async fn intake_submission_stores_a_cleaned_plan() {
    let (store, _dir) = temp_store();
    let user = Uuid::new_v4();
    let generator = StubGenerator::new(
        "{\"response\": \"## Plan d'apprentissage pour [Nom de l'élève]\\n\\nSemaine 1: Algèbre\\n- Réviser les équations\"}",
    );

    let outcome = generate_and_store(&store, &generator, user, intake_profile())
        .await
        .unwrap();
    let record = match outcome {
        CreatePlanOutcome::Created(record) => record,
        CreatePlanOutcome::LimitReached => panic!("fresh account must not be limited"),
    };

    let plan_text = record.generated_plan_text.as_deref().unwrap();
    assert!(
        !plan_text.contains("[Nom de l'élève]"),
        "the templated header line must be cleaned away"
    );
    assert!(plan_text.contains("Semaine 1: Algèbre"));
    assert_eq!(classify_line("Semaine 1: Algèbre"), LineKind::ModuleHeading);
    assert!(plan_text.contains("• Réviser les équations"));
    assert_eq!(classify_line("• Réviser les équations"), LineKind::Bullet);

    // The record is persisted and navigable.
    let stored = store.get_plan_by_id(user, &record.id).await.unwrap();
    assert_eq!(stored.generated_plan_text, record.generated_plan_text);
    assert_eq!(stored.profile.subject, "Mathématiques");
}

#[tokio::test]
async fn stub_response_shapes_resolve_through_the_priority_list() {
    let (store, _dir) = temp_store();
    let user = Uuid::new_v4();

    // A raw non-JSON body passes through unchanged (pre-normalization).
    let generator = StubGenerator::new("Un plan en texte brut");
    let outcome = generate_and_store(&store, &generator, user, intake_profile())
        .await
        .unwrap();
    let CreatePlanOutcome::Created(record) = outcome else {
        panic!("expected a created record");
    };
    assert_eq!(record.generated_plan_text.as_deref(), Some("Un plan en texte brut"));
}

#[tokio::test]
async fn fourteen_plans_allow_one_more_but_fifteen_block_before_the_call() {
    let (store, _dir) = temp_store();
    let user = Uuid::new_v4();
    let generator = StubGenerator::new("contenu");

    for _ in 0..14 {
        let outcome = generate_and_store(&store, &generator, user, intake_profile())
            .await
            .unwrap();
        assert!(matches!(outcome, CreatePlanOutcome::Created(_)));
    }
    assert_eq!(generator.call_count(), 14);

    // The 15th creation still succeeds...
    let outcome = generate_and_store(&store, &generator, user, intake_profile())
        .await
        .unwrap();
    assert!(matches!(outcome, CreatePlanOutcome::Created(_)));
    assert_eq!(generator.call_count(), 15);

    // ...and the 16th is blocked before any webhook call is made.
    let outcome = generate_and_store(&store, &generator, user, intake_profile())
        .await
        .unwrap();
    assert!(matches!(outcome, CreatePlanOutcome::LimitReached));
    assert_eq!(
        generator.call_count(),
        15,
        "the quota gate must run before the network call"
    );
    assert_eq!(store.plan_count(user).await.unwrap(), 15);
}

#[tokio::test]
async fn subscribed_accounts_are_never_blocked() {
    let (store, _dir) = temp_store();
    let user = Uuid::new_v4();
    let generator = StubGenerator::new("contenu");
    store.set_subscription(user, true).await.unwrap();

    for _ in 0..16 {
        let outcome = generate_and_store(&store, &generator, user, intake_profile())
            .await
            .unwrap();
        assert!(matches!(outcome, CreatePlanOutcome::Created(_)));
    }
    assert_eq!(store.plan_count(user).await.unwrap(), 16);
}

#[tokio::test]
async fn generation_failure_still_persists_a_navigable_record() {
    let (store, _dir) = temp_store();
    let user = Uuid::new_v4();

    let outcome = generate_and_store(&store, &FailingGenerator, user, intake_profile())
        .await
        .unwrap();
    let CreatePlanOutcome::Created(record) = outcome else {
        panic!("generation failure must still create a record");
    };

    assert_eq!(
        record.generated_plan_text.as_deref(),
        Some(GENERATION_ERROR_FALLBACK),
        "the fixed technical-error fallback is the stored body"
    );

    let stored = store.get_plan_by_id(user, &record.id).await.unwrap();
    assert_eq!(
        stored.generated_plan_text.as_deref(),
        Some(GENERATION_ERROR_FALLBACK)
    );
}
