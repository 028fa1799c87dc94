//! Client side of the portfolio chat: decode the relay's event stream
//! and grow the assistant reply as deltas arrive.

mod client;
mod conversation;
pub mod decoder;

pub use client::{ChatClient, decode_deltas};
pub use conversation::{Conversation, FALLBACK_REPLY, GREETING, Turn, TurnOutcome};
pub use decoder::StreamDecoder;
