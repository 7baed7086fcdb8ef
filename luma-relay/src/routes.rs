//! Router and the summarize-text handler.
//!
//! The front end sends `{"text": ...}` and gets `{"summary": ...}` back.
//! Missing or empty text is a 400; an upstream failure is a 500 with a
//! fixed body the front end shows inline. CORS is permissive — the page
//! is served from an arbitrary local origin.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::upstream::ModelClient;

#[derive(Clone)]
pub struct AppState {
    upstream: ModelClient,
}

impl AppState {
    pub fn new(upstream: ModelClient) -> Self {
        Self { upstream }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/summarize-text", post(summarize_text))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn summarize_text(
    State(state): State<AppState>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, (StatusCode, Json<ErrorBody>)> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "Text is required for summarization.".into(),
            }),
        ));
    }

    info!(chars = text.len(), "summarization request received");
    match state.upstream.summarize(text).await {
        Ok(summary) => Ok(Json(SummarizeResponse { summary })),
        Err(e) => {
            error!(error = %e, "summarization failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "Failed to generate summary. Check relay logs for details.".into(),
                }),
            ))
        }
    }
}
