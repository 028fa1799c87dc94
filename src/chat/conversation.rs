//! Caller-side chat state: the visible transcript and the turn in
//! flight.

use anyhow::Result;
use futures::{Stream, StreamExt};

use super::client::{ChatClient, decode_deltas};
use crate::openai::{Message, Role};

pub const GREETING: &str = "Hi! I'm the portfolio assistant. Ask me anything about skills, projects, or how I can help with your needs!";

/// Shown in place of a reply when a turn fails.
pub const FALLBACK_REPLY: &str = "I'm having trouble responding right now. Please try again or use the contact form to reach out directly!";

#[derive(Debug, PartialEq)]
pub enum TurnOutcome {
    /// Blank input or a turn was already in flight
    Ignored,
    /// The stream ended with this accumulated reply
    Replied(String),
    /// The stream ended without a single delta
    NoReply,
    /// The turn failed and the fallback reply was appended
    Failed,
}

/// An append-only transcript that starts with a synthetic greeting.
/// The greeting is only for display and is never sent to the relay.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    is_loading: bool,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(GREETING)
    }
}

impl Conversation {
    pub fn new(greeting: &str) -> Self {
        Self {
            messages: vec![Message::new(Role::Assistant, greeting)],
            is_loading: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// The messages sent to the relay, everything after the greeting.
    pub fn outbound(&self) -> &[Message] {
        &self.messages[1..]
    }

    /// Append the user's message and start a turn. Returns `None`
    /// when the input is blank or a turn is already in flight.
    pub fn begin_turn(&mut self, input: &str) -> Option<Turn<'_>> {
        let input = input.trim();
        if input.is_empty() || self.is_loading {
            return None;
        }
        self.messages.push(Message::new(Role::User, input));
        self.is_loading = true;

        Some(Turn {
            conversation: self,
            accumulated: String::new(),
            reply_index: None,
        })
    }

    /// Run one full turn against the relay. `on_delta` sees every text
    /// fragment as it arrives.
    pub async fn submit(
        &mut self,
        client: &ChatClient,
        input: &str,
        on_delta: impl FnMut(&str),
    ) -> TurnOutcome {
        let Some(turn) = self.begin_turn(input) else {
            return TurnOutcome::Ignored;
        };

        let chunks = match client.open(turn.outbound()).await {
            Ok(chunks) => chunks,
            Err(e) => {
                tracing::error!("Chat error: {:#}", e);
                return turn.fail();
            }
        };

        turn.consume(decode_deltas(chunks), on_delta).await
    }
}

/// A turn in flight. Holds the conversation exclusively until the
/// stream ends. Dropping it early abandons the turn: whatever part of
/// the reply already arrived is kept and the conversation accepts
/// input again.
pub struct Turn<'a> {
    conversation: &'a mut Conversation,
    accumulated: String,
    reply_index: Option<usize>,
}

impl Turn<'_> {
    pub fn outbound(&self) -> &[Message] {
        self.conversation.outbound()
    }

    /// Append a fragment to the reply. The reply message is created
    /// on the first fragment and its content replaced with the full
    /// accumulated text on every later one.
    pub fn apply_delta(&mut self, delta: &str) {
        if delta.is_empty() {
            return;
        }
        self.accumulated.push_str(delta);

        let messages = &mut self.conversation.messages;
        match self.reply_index {
            Some(i) => messages[i].content = self.accumulated.clone(),
            None => {
                messages.push(Message::new(Role::Assistant, &self.accumulated));
                self.reply_index = Some(messages.len() - 1);
            }
        }
    }

    /// Apply every delta from the stream in order. A stream error
    /// fails the turn.
    pub async fn consume<S>(mut self, deltas: S, mut on_delta: impl FnMut(&str)) -> TurnOutcome
    where
        S: Stream<Item = Result<String>>,
    {
        futures::pin_mut!(deltas);

        while let Some(delta) = deltas.next().await {
            match delta {
                Ok(delta) => {
                    self.apply_delta(&delta);
                    on_delta(&delta);
                }
                Err(e) => {
                    tracing::error!("Chat error: {:#}", e);
                    return self.fail();
                }
            }
        }

        self.complete()
    }

    fn complete(mut self) -> TurnOutcome {
        if self.reply_index.is_none() {
            return TurnOutcome::NoReply;
        }
        TurnOutcome::Replied(std::mem::take(&mut self.accumulated))
    }

    /// Replace any partial reply with the fallback message.
    pub fn fail(self) -> TurnOutcome {
        let messages = &mut self.conversation.messages;
        if let Some(i) = self.reply_index {
            messages.truncate(i);
        }
        messages.push(Message::new(Role::Assistant, FALLBACK_REPLY));
        TurnOutcome::Failed
    }
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        self.conversation.is_loading = false;
    }
}
