//! Router for the chat relay

use std::sync::{Arc, RwLock};

use anyhow::Result;
use axum::{
    Router,
    body::Body,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use futures::TryStreamExt;
use http::header;

use super::public;
use crate::ai::prompt::system_preamble;
use crate::api::public::{ApiError, JsonBody};
use crate::api::state::AppState;
use crate::core::AppConfig;
use crate::openai::{Message, Role, completion_stream};

type SharedState = Arc<RwLock<AppState>>;

fn system_message(config: &AppConfig) -> Result<String> {
    match &config.system_message {
        Some(msg) => Ok(msg.clone()),
        None => system_preamble(&config.owner_name),
    }
}

/// Forward the conversation upstream with the system preamble and
/// stream the response back without buffering it
async fn chat_handler(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<public::ChatRequest>,
) -> Result<Response, ApiError> {
    let config = state
        .read()
        .expect("Unable to read shared state")
        .config
        .clone();

    let Some(api_key) = config.llm_api_key.as_deref() else {
        tracing::error!("FOLIO_LLM_API_KEY is not configured");
        return Err(ApiError::internal(public::NOT_CONFIGURED));
    };

    let mut messages = Vec::with_capacity(payload.messages.len() + 1);
    messages.push(Message::new(Role::System, &system_message(&config)?));
    messages.extend(payload.messages);

    let upstream = completion_stream(
        &messages,
        &config.llm_api_hostname,
        api_key,
        &config.llm_model,
    )
    .await
    .map_err(|e| {
        tracing::error!("AI gateway request failed: {:#}", e);
        ApiError::internal(public::AI_SERVICE_ERROR)
    })?;

    relay(upstream).await
}

/// Map an upstream response onto the relay's response. Successful
/// bodies are piped through chunk by chunk so the caller sees each
/// frame as soon as upstream sends it.
async fn relay(upstream: reqwest::Response) -> Result<Response, ApiError> {
    let status = upstream.status();

    if status.is_success() {
        let stream = upstream
            .bytes_stream()
            .inspect_err(|e| tracing::warn!("AI gateway stream interrupted: {}", e));
        return Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            Body::from_stream(stream),
        )
            .into_response());
    }

    match status {
        StatusCode::TOO_MANY_REQUESTS => Err(ApiError::new(status, public::RATE_LIMITED)),
        StatusCode::PAYMENT_REQUIRED => Err(ApiError::new(status, public::UNAVAILABLE)),
        _ => {
            let body = upstream.text().await.unwrap_or_default();
            tracing::error!("AI gateway error: {} {}", status, body);
            Err(ApiError::internal(public::AI_SERVICE_ERROR))
        }
    }
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", post(chat_handler))
}
