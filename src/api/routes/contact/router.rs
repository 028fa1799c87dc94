//! Router for the contact form mailer

use std::sync::{Arc, LazyLock, RwLock};

use axum::{Json, Router, extract::State, routing::post};
use regex::Regex;

use super::public::{self, ContactRequest, ContactResponse};
use crate::ai::prompt::contact_email_html;
use crate::api::public::{ApiError, JsonBody};
use crate::api::state::AppState;
use crate::resend::{Email, send_email};

type SharedState = Arc<RwLock<AppState>>;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex"));

fn validate(req: &ContactRequest) -> Result<(), ApiError> {
    let fields = [&req.name, &req.email, &req.subject, &req.message];
    if fields.iter().any(|f| f.is_empty()) {
        return Err(ApiError::bad_request("All fields are required"));
    }

    if !EMAIL_RE.is_match(&req.email) {
        return Err(ApiError::bad_request("Invalid email format"));
    }

    let too_long = req.name.chars().count() > public::MAX_NAME_LEN
        || req.email.chars().count() > public::MAX_EMAIL_LEN
        || req.subject.chars().count() > public::MAX_SUBJECT_LEN
        || req.message.chars().count() > public::MAX_MESSAGE_LEN;
    if too_long {
        return Err(ApiError::bad_request("Field length exceeds maximum allowed"));
    }

    Ok(())
}

/// Validate a contact form submission and email it to the owner
async fn contact_handler(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<ContactRequest>,
) -> Result<Json<ContactResponse>, ApiError> {
    validate(&payload)?;

    let config = state
        .read()
        .expect("Unable to read shared state")
        .config
        .clone();

    tracing::info!("Sending contact email from: {} {}", payload.name, payload.email);

    let Some(api_key) = config.email_api_key.as_deref() else {
        tracing::error!("FOLIO_EMAIL_API_KEY is not configured");
        return Err(ApiError::internal("Email service not configured"));
    };

    let email = Email {
        from: config.contact_from.clone(),
        to: vec![config.contact_to.clone()],
        subject: format!("Portfolio Contact: {}", payload.subject),
        reply_to: payload.email.clone(),
        html: contact_email_html(
            &payload.name,
            &payload.email,
            &payload.subject,
            &payload.message,
        )?,
    };

    let resp = send_email(&config.email_api_hostname, api_key, &email)
        .await
        .map_err(|e| {
            tracing::error!("Email API error: {:#}", e);
            ApiError::internal("Failed to send email")
        })?;

    tracing::info!("Email sent successfully: {}", resp);

    Ok(Json(ContactResponse {
        success: true,
        message: String::from("Email sent successfully"),
    }))
}

/// Create the contact router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", post(contact_handler))
}
