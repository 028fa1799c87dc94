//! Test utilities for integration tests
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

use axum::{Router, body::Body};

use folio::api::AppState;
use folio::api::app;
use folio::core::AppConfig;
use folio::core::db::initialize_db;

pub const TEST_SYSTEM_MESSAGE: &str = "You are a test assistant.";

/// An address nothing listens on so that requests to it fail with a
/// connection error.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Config for tests with the LLM and email APIs pointed at `llm_url`
/// and `email_url` (usually a `mockito` server).
pub fn test_config(llm_url: &str, email_url: &str) -> AppConfig {
    AppConfig {
        storage_path: String::from("./"),
        db_path: String::from("./db"),
        llm_api_hostname: llm_url.to_string(),
        llm_api_key: Some(String::from("test-api-key")),
        llm_model: String::from("test-model"),
        owner_name: String::from("Test Owner"),
        system_message: Some(TEST_SYSTEM_MESSAGE.to_string()),
        email_api_hostname: email_url.to_string(),
        email_api_key: Some(String::from("test-email-key")),
        contact_from: String::from("Portfolio Contact <noreply@example.com>"),
        contact_to: String::from("owner@example.com"),
        session_ttl_hours: 24,
    }
}

/// Creates a test application router backed by an in-memory database.
pub async fn test_app_with_config(config: AppConfig) -> Router {
    let db = tokio_rusqlite::Connection::open_in_memory()
        .await
        .expect("Failed to open in-memory db");
    db.call(|conn| {
        initialize_db(conn).expect("Failed to initialize db");
        Ok(())
    })
    .await
    .unwrap();

    let app_state = AppState::new(db, config);
    app(Arc::new(RwLock::new(app_state)))
}

/// Creates a test application router whose upstream APIs are
/// unreachable.
pub async fn test_app() -> Router {
    let url = unreachable_url();
    test_app_with_config(test_config(&url, &url)).await
}

/// Serve the app on a random local port and return its address.
pub async fn spawn_app(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Build a single `data: ` frame carrying a content delta.
pub fn sse_frame(content: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {"content": content}, "finish_reason": null}]
        })
    )
}
