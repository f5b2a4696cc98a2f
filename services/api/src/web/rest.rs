//! services/api/src/web/rest.rs
//!
//! Contains the shared error body, the small informational endpoints, and
//! the master definition for the OpenAPI specification.

use axum::response::Json;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use learnai_core::focus::FOCUS_PRESETS;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::plans::create_plan_handler,
        crate::web::plans::list_plans_handler,
        crate::web::plans::current_plan_handler,
        crate::web::plans::save_current_plan_handler,
        crate::web::plans::list_saved_plans_handler,
        crate::web::plans::delete_saved_plan_handler,
        crate::web::plans::get_plan_handler,
        crate::web::plans::export_plan_pdf_handler,
        crate::web::plans::quota_handler,
        crate::web::chat::ask_handler,
        crate::web::chat::history_handler,
        crate::web::chat::clear_history_handler,
        crate::web::account::subscription_handler,
        crate::web::account::activate_subscription_handler,
        crate::web::account::cancel_subscription_handler,
        health_handler,
        focus_presets_handler,
    ),
    components(
        schemas(
            ErrorBody,
            crate::web::auth::SignupRequest,
            crate::web::auth::LoginRequest,
            crate::web::auth::AuthResponse,
            crate::web::plans::CreatePlanRequest,
            crate::web::plans::PlanResponse,
            crate::web::plans::QuotaResponse,
            crate::web::chat::ChatRequest,
            crate::web::chat::ChatAnswerResponse,
            crate::web::chat::ChatMessageResponse,
            crate::web::account::SubscriptionResponse,
            HealthResponse,
            FocusPresetResponse,
        )
    ),
    tags(
        (name = "LearnAI API", description = "API endpoints for the personalized learning-plan service.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Error Body
//=========================================================================================

/// Uniform error payload. `redirect` carries the screen the client should
/// navigate to instead of rendering an error page.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            redirect: None,
        }
    }

    pub fn with_redirect(error: impl Into<String>, redirect: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            redirect: Some(redirect.into()),
        }
    }
}

//=========================================================================================
// Informational Endpoints
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health - Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FocusPresetResponse {
    pub name: &'static str,
    pub focus_minutes: u32,
    pub break_minutes: u32,
}

/// GET /focus/presets - The focus-timer presets
#[utoipa::path(
    get,
    path = "/focus/presets",
    responses((status = 200, description = "Available focus modes", body = [FocusPresetResponse]))
)]
pub async fn focus_presets_handler() -> Json<Vec<FocusPresetResponse>> {
    Json(
        FOCUS_PRESETS
            .iter()
            .map(|p| FocusPresetResponse {
                name: p.name,
                focus_minutes: p.focus_minutes,
                break_minutes: p.break_minutes,
            })
            .collect(),
    )
}
