use std::time::Duration;

use anyhow::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

/// Sentinel payload that terminates a chat-completions event stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Build the JSON body for a streaming chat-completions request.
pub fn completion_stream_payload(messages: &[Message], model: &str) -> Value {
    json!({
        "model": model,
        "messages": messages,
        "stream": true,
    })
}

/// Open a streaming chat completion and hand back the raw response as
/// soon as the upstream headers arrive. The body is not read here so
/// callers can pipe or decode it incrementally. Non-2xx statuses are
/// returned as-is for the caller to map.
pub async fn completion_stream(
    messages: &[Message],
    api_hostname: &str,
    api_key: &str,
    model: &str,
) -> Result<reqwest::Response, Error> {
    let payload = completion_stream_payload(messages, model);
    let url = format!("{}/v1/chat/completions", api_hostname.trim_end_matches("/"));
    let response = reqwest::Client::new()
        .post(url)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .timeout(Duration::from_secs(60 * 5))
        .json(&payload)
        .send()
        .await?;

    Ok(response)
}

/// Extract the incremental text at `choices[0].delta.content` from a
/// completion chunk. Chunks without that path (role announcements,
/// usage frames, finish markers) yield `None`.
pub fn delta_content(chunk: &Value) -> Option<&str> {
    chunk["choices"][0]["delta"]["content"]
        .as_str()
        .filter(|s| !s.is_empty())
}
