//! Minimal client for a Resend compatible transactional email API.

use std::time::Duration;

use anyhow::{Error, Result, bail};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct Email {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub reply_to: String,
    pub html: String,
}

/// Send an email and return the provider's JSON response. Any non-2xx
/// status is an error that includes the provider's response body.
pub async fn send_email(api_hostname: &str, api_key: &str, email: &Email) -> Result<Value, Error> {
    let url = format!("{}/emails", api_hostname.trim_end_matches("/"));
    let response = reqwest::Client::new()
        .post(url)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .timeout(Duration::from_secs(30))
        .json(email)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("Email API responded with {}: {}", status, body);
    }

    Ok(response.json().await?)
}
