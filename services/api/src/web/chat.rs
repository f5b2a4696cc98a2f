//! services/api/src/web/chat.rs
//!
//! Axum handlers for the floating assistant widget: one-shot questions
//! proxied to the chat webhook, plus the per-user conversation history.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use learnai_core::domain::{ChatMessage, Sender};

use crate::web::rest::ErrorBody;
use crate::web::state::AppState;

//=========================================================================================
// API Request and Response Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Serialize, ToSchema)]
pub struct ChatAnswerResponse {
    pub answer: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageResponse {
    pub id: String,
    pub sender: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessageResponse {
    fn from_domain(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            sender: match message.sender {
                Sender::User => "user".to_string(),
                Sender::Ai => "ai".to_string(),
            },
            text: message.text,
            timestamp: message.timestamp,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Ask the assistant a question.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "The assistant's answer", body = ChatAnswerResponse),
        (status = 400, description = "Empty question", body = ErrorBody)
    )
)]
pub async fn ask_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let question = req.question.trim().to_string();
    if question.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new("Posez votre question...")),
        ));
    }

    // The chat port always answers with a body; failures arrive as the
    // fallback reply, never as an error.
    let answer = state.chat_answerer.answer_question(&question).await;

    let now = Utc::now();
    let exchange = vec![
        ChatMessage {
            id: Uuid::new_v4().to_string(),
            sender: Sender::User,
            text: question,
            timestamp: now,
        },
        ChatMessage {
            id: Uuid::new_v4().to_string(),
            sender: Sender::Ai,
            text: answer.clone(),
            timestamp: now,
        },
    ];
    if let Err(e) = state.store.append_chat_messages(user_id, exchange).await {
        // The answer still reaches the user; only the history write failed.
        error!(%user_id, "failed to persist chat history: {:?}", e);
    }

    Ok(Json(ChatAnswerResponse { answer }))
}

/// The stored conversation history, oldest first.
#[utoipa::path(
    get,
    path = "/chat/history",
    responses(
        (status = 200, description = "Conversation history", body = [ChatMessageResponse])
    )
)]
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let history = state.store.get_chat_history(user_id).await.map_err(|e| {
        error!(%user_id, "failed to load chat history: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new("Une erreur interne est survenue")),
        )
    })?;
    Ok(Json(
        history
            .into_iter()
            .map(ChatMessageResponse::from_domain)
            .collect::<Vec<_>>(),
    ))
}

/// Clear the conversation history.
#[utoipa::path(
    delete,
    path = "/chat/history",
    responses((status = 204, description = "History cleared"))
)]
pub async fn clear_history_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    state.store.clear_chat_history(user_id).await.map_err(|e| {
        error!(%user_id, "failed to clear chat history: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new("Une erreur interne est survenue")),
        )
    })?;
    Ok(StatusCode::NO_CONTENT)
}
