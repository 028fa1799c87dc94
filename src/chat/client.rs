//! HTTP client for the chat relay.

use std::time::Duration;

use anyhow::{Result, bail};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use serde_json::json;

use super::decoder::StreamDecoder;
use crate::openai::Message;

pub struct ChatClient {
    endpoint: String,
    api_key: Option<String>,
}

impl ChatClient {
    /// `endpoint` is the full URL of the relay, e.g.
    /// `http://127.0.0.1:2222/api/chat`.
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            api_key: None,
        }
    }

    /// Send a bearer token with every request (the publishable key of
    /// a hosted deployment).
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    /// Post the conversation to the relay and return the response body
    /// as a stream of raw chunks. Fails if the relay can't be reached
    /// or doesn't answer with a 2xx status.
    pub async fn open(&self, messages: &[Message]) -> Result<BoxStream<'static, Result<Bytes>>> {
        let mut request = reqwest::Client::new()
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(60 * 5))
            .json(&json!({ "messages": messages }));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            bail!("Chat relay responded with {}", status);
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(anyhow::Error::from))
            .boxed())
    }
}

/// Turn a stream of response body chunks into the text deltas it
/// carries. Reading stops at the `[DONE]` sentinel.
pub fn decode_deltas<S, E>(chunks: S) -> impl Stream<Item = Result<String>>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<anyhow::Error>,
{
    async_stream::try_stream! {
        let mut decoder = StreamDecoder::new();
        futures::pin_mut!(chunks);

        while let Some(chunk) = chunks.next().await {
            let chunk: Bytes = chunk.map_err(Into::<anyhow::Error>::into)?;
            for delta in decoder.feed(&chunk) {
                yield delta;
            }
            if decoder.is_done() {
                break;
            }
        }

        for delta in decoder.finish() {
            yield delta;
        }
    }
}
