//! API routes module

pub mod admin;
pub mod chat;
pub mod cms;
pub mod contact;

use std::sync::{Arc, RwLock};

use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<RwLock<AppState>>;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Streaming chat relay
        .nest("/chat", chat::router())
        // Contact form mailer
        .nest("/contact", contact::router())
        // Admin sessions
        .nest("/admin/auth", admin::router())
        // Portfolio content, admin only
        .nest("/admin/cms", cms::router())
}
