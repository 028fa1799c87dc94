use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage_path: String,
    pub db_path: String,
    pub llm_api_hostname: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub owner_name: String,
    pub system_message: Option<String>,
    pub email_api_hostname: String,
    pub email_api_key: Option<String>,
    pub contact_from: String,
    pub contact_to: String,
    pub session_ttl_hours: i64,
}

/// Longest accepted session lifetime, one year
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;
const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

// Unset and empty values are treated the same
fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Default for AppConfig {
    fn default() -> Self {
        let storage_path = env::var("FOLIO_STORAGE_PATH").unwrap_or("./".to_string());
        let db_path = format!("{}/db", storage_path.trim_end_matches("/"));
        let llm_api_hostname = env::var("FOLIO_LLM_HOST")
            .unwrap_or_else(|_| "https://ai.gateway.lovable.dev".to_string());
        let llm_api_key = optional_var("FOLIO_LLM_API_KEY");
        let llm_model = env::var("FOLIO_LLM_MODEL")
            .unwrap_or_else(|_| "google/gemini-3-flash-preview".to_string());
        let owner_name =
            env::var("FOLIO_OWNER_NAME").unwrap_or_else(|_| "the portfolio owner".to_string());
        let system_message = optional_var("FOLIO_SYSTEM_MESSAGE");
        let email_api_hostname =
            env::var("FOLIO_EMAIL_HOST").unwrap_or_else(|_| "https://api.resend.com".to_string());
        let email_api_key = optional_var("FOLIO_EMAIL_API_KEY");
        let contact_from = env::var("FOLIO_CONTACT_FROM")
            .unwrap_or_else(|_| "Portfolio Contact <onboarding@resend.dev>".to_string());
        let contact_to =
            env::var("FOLIO_CONTACT_TO").unwrap_or_else(|_| "owner@example.com".to_string());
        let session_ttl_hours = env::var("FOLIO_SESSION_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|hours| (1..=MAX_SESSION_TTL_HOURS).contains(hours))
            .unwrap_or(DEFAULT_SESSION_TTL_HOURS);

        Self {
            storage_path,
            db_path,
            llm_api_hostname,
            llm_api_key,
            llm_model,
            owner_name,
            system_message,
            email_api_hostname,
            email_api_key,
            contact_from,
            contact_to,
            session_ttl_hours,
        }
    }
}
