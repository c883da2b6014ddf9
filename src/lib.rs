//! Client core for the Roognis chat backend.
//!
//! Invariant: at most one access token is active, and every asynchronous
//! result is checked against the session epoch (and, for history loads, the
//! selection ticket) it was issued under before it touches state.
//!
//! # Public API Overview
//! - Drive a session through [`ChatClient`]: sign in, restore a stored token,
//!   select conversations, send prompts, log out.
//! - Inspect client-side state through snapshots: [`Transcript`],
//!   [`ConversationDirectory`] labels, [`InferenceSettings`].
//! - Drain [`Notice`]s for non-blocking user feedback.
//! - Plug any [`chat_backend::ChatBackend`] in; `chat_backend_http` talks to
//!   the real server and `chat_backend_mock` backs tests.

pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod generation;
pub mod notice;
pub mod session;
pub mod settings;
pub mod transcript;
pub mod validate;

pub use crate::client::ChatClient;
pub use crate::config::{ClientConfig, DEFAULT_PROMPT_LIMIT};
pub use crate::directory::{conversation_label, ConversationDirectory, NEW_CONVERSATION_LABEL};
pub use crate::error::{ClientError, ValidationError};
pub use crate::generation::{Generation, Ticket};
pub use crate::notice::{Notice, NoticeKind};
pub use crate::session::SessionPhase;
pub use crate::settings::{
    InferenceSettings, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, MAX_TOKENS_MAX,
    MAX_TOKENS_MIN, TEMPERATURE_MAX, TEMPERATURE_MIN,
};
pub use crate::transcript::{Delivery, MessageKey, PendingId, Transcript, TranscriptMessage};
