//! Backend-neutral contract between the chat client core and the inference
//! backend.
//!
//! This crate defines only the wire records, the request/response surface, and
//! the error shape every backend reports. It excludes HTTP transport details,
//! client-side state, and retry policy.

use std::fmt;

use async_trait::async_trait;

mod records;

pub use records::{
    Conversation, ConversationId, ConversationMessage, HealthResponse, InferenceRequest,
    InferenceResponse, LoginRequest, MessageId, MessageRole, RegisterRequest, TokenResponse, User,
    UserId, UserRole,
};

/// Failure reported by a backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend answered with a non-success status.
    Api { status: u16, message: String },
    /// Anything else: connection failures, undecodable payloads.
    Unexpected(String),
}

impl BackendError {
    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Returns the HTTP status for API failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Unexpected(_) => None,
        }
    }

    /// Returns the human-readable message carried by this error.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Api { message, .. } | Self::Unexpected(message) => message,
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for BackendError {}

/// Backend interface for the chat client.
///
/// Every authenticated call receives the bearer token explicitly; backends keep
/// no session of their own. Calls resolve once with a complete result.
#[async_trait]
pub trait ChatBackend: Send + Sync + 'static {
    /// Stable identifier for logs and diagnostics.
    fn backend_id(&self) -> &str;

    async fn register(&self, request: RegisterRequest) -> Result<TokenResponse, BackendError>;

    async fn login(&self, request: LoginRequest) -> Result<TokenResponse, BackendError>;

    async fn profile(&self, token: &str) -> Result<User, BackendError>;

    /// Lists the caller's conversations in server order (most recently
    /// updated first).
    async fn list_conversations(&self, token: &str) -> Result<Vec<Conversation>, BackendError>;

    /// Lists persisted messages of one conversation, system turns included.
    async fn list_messages(
        &self,
        token: &str,
        conversation_id: ConversationId,
    ) -> Result<Vec<ConversationMessage>, BackendError>;

    /// Runs one non-streaming completion. A request without a conversation id
    /// creates a new conversation on the server.
    async fn complete(
        &self,
        token: &str,
        request: InferenceRequest,
    ) -> Result<InferenceResponse, BackendError>;

    async fn health(&self) -> Result<HealthResponse, BackendError> {
        Err(BackendError::unexpected(
            "Health checks are not supported by this backend",
        ))
    }
}
