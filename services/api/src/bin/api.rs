//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{FileStore, PrintPdfExporter, WebhookChatAdapter, WebhookPlanAdapter},
    config::Config,
    error::ApiError,
    web::{
        account::{
            activate_subscription_handler, cancel_subscription_handler, subscription_handler,
        },
        auth::{login_handler, logout_handler, signup_handler},
        chat::{ask_handler, clear_history_handler, history_handler},
        plans::{
            create_plan_handler, current_plan_handler, delete_saved_plan_handler,
            export_plan_pdf_handler, get_plan_handler, list_plans_handler,
            list_saved_plans_handler, quota_handler, save_current_plan_handler,
        },
        require_auth,
        rest::{focus_presets_handler, health_handler},
        state::AppState,
        ApiDoc,
    },
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize the Store ---
    info!("Opening data directory at {}", config.data_dir.display());
    tokio::fs::create_dir_all(&config.data_dir).await?;
    let store = Arc::new(FileStore::new(config.data_dir.clone()));

    // --- 3. Initialize Service Adapters ---
    // One attempt per webhook call with a timeout-free wait; the adapters
    // substitute fallback bodies on failure instead of surfacing errors.
    let http_client = reqwest::Client::new();
    let plan_generator = Arc::new(WebhookPlanAdapter::new(
        http_client.clone(),
        config.plan_webhook_url.clone(),
    ));
    let chat_answerer = Arc::new(WebhookChatAdapter::new(
        http_client,
        config.chat_webhook_url.clone(),
    ));
    let pdf_exporter = Arc::new(PrintPdfExporter::new());

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        store,
        config: config.clone(),
        plan_generator,
        chat_answerer,
        pdf_exporter,
        generating: Arc::new(Mutex::new(HashSet::new())),
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?,
        )
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/health", get(health_handler))
        .route("/focus/presets", get(focus_presets_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/plans", post(create_plan_handler).get(list_plans_handler))
        .route("/plans/current", get(current_plan_handler))
        .route("/plans/current/save", post(save_current_plan_handler))
        .route("/plans/saved", get(list_saved_plans_handler))
        .route("/plans/saved/{plan_id}", delete(delete_saved_plan_handler))
        .route("/plans/{plan_id}", get(get_plan_handler))
        .route("/plans/{plan_id}/pdf", get(export_plan_pdf_handler))
        .route("/quota", get(quota_handler))
        .route("/chat", post(ask_handler))
        .route(
            "/chat/history",
            get(history_handler).delete(clear_history_handler),
        )
        .route("/subscription", get(subscription_handler))
        .route("/subscription/activate", post(activate_subscription_handler))
        .route("/subscription/cancel", post(cancel_subscription_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
