//! services/api/src/web/account.rs
//!
//! Subscription endpoints: the status readout, the payment-success landing
//! that activates the flag, and cancellation from the settings screen.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::rest::ErrorBody;
use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct SubscriptionResponse {
    pub active: bool,
}

fn internal_error<E: std::fmt::Debug>(e: E) -> (StatusCode, Json<ErrorBody>) {
    error!("subscription operation failed: {:?}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new("Une erreur interne est survenue")),
    )
}

/// GET /subscription - Current subscription status
#[utoipa::path(
    get,
    path = "/subscription",
    responses((status = 200, description = "Subscription status", body = SubscriptionResponse))
)]
pub async fn subscription_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let active = state
        .store
        .has_subscription(user_id)
        .await
        .map_err(internal_error)?;
    Ok(Json(SubscriptionResponse { active }))
}

/// POST /subscription/activate - Activate after a successful payment
#[utoipa::path(
    post,
    path = "/subscription/activate",
    responses((status = 200, description = "Subscription activated", body = SubscriptionResponse))
)]
pub async fn activate_subscription_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    state
        .store
        .set_subscription(user_id, true)
        .await
        .map_err(internal_error)?;
    info!(%user_id, "subscription activated");
    Ok(Json(SubscriptionResponse { active: true }))
}

/// POST /subscription/cancel - Cancel the subscription
#[utoipa::path(
    post,
    path = "/subscription/cancel",
    responses((status = 200, description = "Subscription cancelled", body = SubscriptionResponse))
)]
pub async fn cancel_subscription_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    state
        .store
        .set_subscription(user_id, false)
        .await
        .map_err(internal_error)?;
    info!(%user_id, "subscription cancelled");
    Ok(Json(SubscriptionResponse { active: false }))
}
