//! services/api/src/web/plans.rs
//!
//! Axum handlers for the plan lifecycle: intake submission with the quota
//! gate, the working/saved collections, promotion, deletion, details lookup,
//! the quota readout and the PDF export.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use learnai_core::domain::{LearningPlanRecord, PlanProfile, SchoolLevel};
use learnai_core::normalize::normalize_plan_text;
use learnai_core::ports::{
    PlanGenerationService, PortError, PortResult, StorageService,
};
use learnai_core::quota::{self, RemainingPlans};

use crate::web::rest::ErrorBody;
use crate::web::state::AppState;

//=========================================================================================
// API Request and Response Structs
//=========================================================================================

/// The intake-form submission. Field names match the client's JSON.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    pub age: String,
    pub school_level: String,
    pub average_grade: String,
    pub learning_difficulties: String,
    pub subject: String,
    pub specific_requests: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub id: String,
    pub age: String,
    pub school_level: String,
    pub average_grade: String,
    pub learning_difficulties: String,
    pub subject: String,
    pub specific_requests: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_plan: Option<String>,
    pub is_saved: bool,
}

impl PlanResponse {
    fn from_domain(record: LearningPlanRecord) -> Self {
        Self {
            id: record.id,
            age: record.profile.age,
            school_level: record.profile.school_level.as_id().to_string(),
            average_grade: record.profile.average_grade,
            learning_difficulties: record.profile.learning_difficulties,
            subject: record.profile.subject,
            specific_requests: record.profile.specific_requests,
            created_at: record.created_at,
            generated_plan: record.generated_plan_text,
            is_saved: record.is_saved,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotaResponse {
    pub plans_count: usize,
    pub unlimited: bool,
    /// Remaining free plans; absent for subscribed accounts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<usize>,
    pub limit_reached: bool,
}

//=========================================================================================
// The Creation Flow
//=========================================================================================

/// Outcome of a plan-creation attempt.
pub enum CreatePlanOutcome {
    Created(LearningPlanRecord),
    /// The free tier is exhausted; nothing was generated or stored.
    LimitReached,
}

/// Runs the full creation flow: quota gate, generation call, text cleanup,
/// record persistence. The quota is evaluated fresh and **before** the
/// webhook is contacted; generation failure still yields a stored record
/// because the generator port always answers with a body.
pub async fn generate_and_store(
    store: &dyn StorageService,
    generator: &dyn PlanGenerationService,
    user_id: Uuid,
    profile: PlanProfile,
) -> PortResult<CreatePlanOutcome> {
    let subscribed = store.has_subscription(user_id).await?;
    let count = store.plan_count(user_id).await?;
    if quota::limit_reached(subscribed, count) {
        return Ok(CreatePlanOutcome::LimitReached);
    }

    let raw_plan = generator.generate_plan(&profile).await;
    let normalized = normalize_plan_text(&raw_plan);

    let record = store
        .create_plan(user_id, profile, Some(normalized))
        .await?;
    info!(%user_id, plan_id = %record.id, "learning plan created");
    Ok(CreatePlanOutcome::Created(record))
}

fn parse_profile(req: CreatePlanRequest) -> Result<PlanProfile, String> {
    let school_level = SchoolLevel::from_id(&req.school_level)
        .ok_or_else(|| format!("Niveau scolaire inconnu: {}", req.school_level))?;
    if req.age.trim().is_empty() {
        return Err("Veuillez entrer votre âge".to_string());
    }
    if req.subject.trim().is_empty() {
        return Err("Veuillez indiquer la matière".to_string());
    }
    Ok(PlanProfile {
        age: req.age,
        school_level,
        average_grade: req.average_grade,
        learning_difficulties: req.learning_difficulties,
        subject: req.subject,
        specific_requests: req.specific_requests,
    })
}

fn internal_error(e: PortError) -> (StatusCode, Json<ErrorBody>) {
    error!("storage failure: {:?}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new("Une erreur interne est survenue")),
    )
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Submit the intake form and generate a plan.
#[utoipa::path(
    post,
    path = "/plans",
    request_body = CreatePlanRequest,
    responses(
        (status = 201, description = "Plan created", body = PlanResponse),
        (status = 400, description = "Invalid intake fields", body = ErrorBody),
        (status = 403, description = "Free-tier quota exhausted", body = ErrorBody),
        (status = 409, description = "A generation is already in flight for this account", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn create_plan_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreatePlanRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    // 1. Validate the intake fields.
    let profile = parse_profile(req)
        .map_err(|msg| (StatusCode::BAD_REQUEST, Json(ErrorBody::new(msg))))?;

    // 2. One generation at a time per account.
    let _slot = state.try_begin_generation(user_id).ok_or((
        StatusCode::CONFLICT,
        Json(ErrorBody::with_redirect(
            "Une génération est déjà en cours pour ce compte",
            "/learning-plan",
        )),
    ))?;

    // 3. Quota gate, generation, cleanup, persistence.
    let outcome =
        generate_and_store(state.store.as_ref(), state.plan_generator.as_ref(), user_id, profile)
            .await
            .map_err(internal_error)?;

    match outcome {
        CreatePlanOutcome::Created(record) => {
            Ok((StatusCode::CREATED, Json(PlanResponse::from_domain(record))))
        }
        CreatePlanOutcome::LimitReached => Err((
            StatusCode::FORBIDDEN,
            Json(ErrorBody::with_redirect(
                "Vous avez atteint votre quota de plans gratuits. Veuillez passer à la version premium.",
                "/pricing",
            )),
        )),
    }
}

/// List the working collection, newest first.
#[utoipa::path(
    get,
    path = "/plans",
    responses(
        (status = 200, description = "Working plans, newest first", body = [PlanResponse]),
        (status = 401, description = "Not signed in", body = ErrorBody)
    )
)]
pub async fn list_plans_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let plans = state.store.list_plans(user_id).await.map_err(internal_error)?;
    Ok(Json(
        plans.into_iter().map(PlanResponse::from_domain).collect::<Vec<_>>(),
    ))
}

/// The current plan: the most recent working record.
#[utoipa::path(
    get,
    path = "/plans/current",
    responses(
        (status = 200, description = "The current plan", body = PlanResponse),
        (status = 404, description = "No working plan yet", body = ErrorBody)
    )
)]
pub async fn current_plan_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let plans = state.store.list_plans(user_id).await.map_err(internal_error)?;
    match plans.into_iter().next() {
        Some(record) => Ok(Json(PlanResponse::from_domain(record))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorBody::with_redirect(
                "Aucun plan d'apprentissage",
                "/learning-plan",
            )),
        )),
    }
}

/// Promote the current plan into the saved collection (idempotent).
#[utoipa::path(
    post,
    path = "/plans/current/save",
    responses(
        (status = 200, description = "The saved plan", body = PlanResponse),
        (status = 404, description = "No working plan to save", body = ErrorBody)
    )
)]
pub async fn save_current_plan_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let promoted = state
        .store
        .promote_current_to_saved(user_id)
        .await
        .map_err(internal_error)?;
    match promoted {
        Some(record) => Ok(Json(PlanResponse::from_domain(record))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorBody::with_redirect(
                "Aucun plan d'apprentissage à sauvegarder",
                "/learning-plan",
            )),
        )),
    }
}

/// List the saved collection.
#[utoipa::path(
    get,
    path = "/plans/saved",
    responses(
        (status = 200, description = "Saved plans, newest first", body = [PlanResponse])
    )
)]
pub async fn list_saved_plans_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let plans = state
        .store
        .list_saved_plans(user_id)
        .await
        .map_err(internal_error)?;
    Ok(Json(
        plans.into_iter().map(PlanResponse::from_domain).collect::<Vec<_>>(),
    ))
}

/// Delete a saved plan. Unknown ids are a silent no-op.
#[utoipa::path(
    delete,
    path = "/plans/saved/{plan_id}",
    params(("plan_id" = String, Path, description = "Saved plan id")),
    responses(
        (status = 204, description = "Deleted (or never existed)")
    )
)]
pub async fn delete_saved_plan_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(plan_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    state
        .store
        .delete_saved_plan(user_id, &plan_id)
        .await
        .map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fetch one plan by id (saved collection first, then working history).
#[utoipa::path(
    get,
    path = "/plans/{plan_id}",
    params(("plan_id" = String, Path, description = "Plan id")),
    responses(
        (status = 200, description = "The plan", body = PlanResponse),
        (status = 404, description = "Unknown plan id", body = ErrorBody)
    )
)]
pub async fn get_plan_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(plan_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    match state.store.get_plan_by_id(user_id, &plan_id).await {
        Ok(record) => Ok(Json(PlanResponse::from_domain(record))),
        Err(PortError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorBody::with_redirect("Plan introuvable", "/saved-plans")),
        )),
        Err(e) => Err(internal_error(e)),
    }
}

/// Download a plan as a PDF document.
#[utoipa::path(
    get,
    path = "/plans/{plan_id}/pdf",
    params(("plan_id" = String, Path, description = "Plan id")),
    responses(
        (status = 200, description = "The rendered PDF", content_type = "application/pdf"),
        (status = 404, description = "Unknown plan id", body = ErrorBody),
        (status = 500, description = "Rendering failed", body = ErrorBody)
    )
)]
pub async fn export_plan_pdf_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(plan_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let record = match state.store.get_plan_by_id(user_id, &plan_id).await {
        Ok(record) => record,
        Err(PortError::NotFound(_)) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorBody::with_redirect("Plan introuvable", "/saved-plans")),
            ))
        }
        Err(e) => return Err(internal_error(e)),
    };

    let export = state.pdf_exporter.render_pdf(&record).map_err(|e| {
        error!(plan_id = %record.id, "PDF rendering failed: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new("La génération du PDF a échoué")),
        )
    })?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.file_name),
            ),
        ],
        export.bytes,
    ))
}

/// The quota readout, evaluated fresh on every call.
#[utoipa::path(
    get,
    path = "/quota",
    responses(
        (status = 200, description = "Current quota state", body = QuotaResponse)
    )
)]
pub async fn quota_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let subscribed = state
        .store
        .has_subscription(user_id)
        .await
        .map_err(internal_error)?;
    let count = state.store.plan_count(user_id).await.map_err(internal_error)?;

    let (unlimited, remaining) = match quota::remaining(subscribed, count) {
        RemainingPlans::Unlimited => (true, None),
        RemainingPlans::Count(n) => (false, Some(n)),
    };
    Ok(Json(QuotaResponse {
        plans_count: count,
        unlimited,
        remaining,
        limit_reached: quota::limit_reached(subscribed, count),
    }))
}
