use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use intrachat_types::{now_iso8601, ExchangeTurn};

pub const WELCOME_MESSAGE: &str = "Welcome to IntraIIIT API";

/// Static text served by the topics endpoint
pub const TOPICS_TEXT: &str = "The hummingbird, a tiny jewel of iridescent green and blue, hovered by the fuchsia blossom. Its wings were a frantic blur, a miniature engine powered by nectar, defying gravity for a moment.";

/// Canned answer of the chat endpoint
pub const CHAT_STUB_REPLY: &str = "This is a stub server, so I can only acknowledge your message.";

/// Application state shared across routes
#[derive(Debug, Clone)]
pub struct AppState {
    pub started_at: DateTime<Utc>,
}

impl Default for AppState {
    fn default() -> Self {
        Self { started_at: Utc::now() }
    }
}

/// Create router with all routes. Every endpoint is reachable both with and
/// without the `/api` prefix.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/topics", get(topics))
        .route("/chat", post(chat));

    Router::new()
        .route("/", get(index))
        .merge(api.clone())
        .nest("/api", api)
        .fallback(not_found)
        .with_state(state)
}

/// GET /
async fn index() -> Json<serde_json::Value> {
    Json(json!({ "message": WELCOME_MESSAGE }))
}

/// GET /api/health
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let uptime = Utc::now().signed_duration_since(state.started_at).num_seconds();
    Json(json!({
        "status": "OK",
        "timestamp": now_iso8601(),
        "uptime_secs": uptime,
    }))
}

/// GET /api/topics
async fn topics() -> Json<serde_json::Value> {
    Json(json!({ "data": TOPICS_TEXT }))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    user_input: String,
    #[serde(default)]
    chat_history: Vec<ExchangeTurn>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    ai_response: String,
    new_chat_history: Vec<ExchangeTurn>,
}

/// POST /api/chat - canned reply that still threads the exchange history
async fn chat(payload: Result<Json<ChatRequest>, JsonRejection>) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = payload?;

    let mut history = request.chat_history;
    history.push(ExchangeTurn::human(request.user_input));
    history.push(ExchangeTurn::ai(CHAT_STUB_REPLY));

    Ok(Json(ChatResponse {
        ai_response: CHAT_STUB_REPLY.to_string(),
        new_chat_history: history,
    }))
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".into())
}

/// Error handling
#[derive(Debug)]
enum AppError {
    NotFound(String),
    BadRequest(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
