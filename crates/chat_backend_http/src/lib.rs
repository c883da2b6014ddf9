//! HTTP-backed implementation of the `chat_backend` contract.
//!
//! This adapter forwards each call to `backend_api` and folds transport
//! failures into `BackendError`: non-success statuses become API errors with
//! the server's message, everything else becomes an unexpected error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backend_api::{BackendApiClient, BackendApiConfig, BackendApiError};
use chat_backend::{
    BackendError, ChatBackend, Conversation, ConversationId, ConversationMessage, HealthResponse,
    InferenceRequest, InferenceResponse, LoginRequest, RegisterRequest, TokenResponse, User,
};
use tracing::{debug, warn};

/// Stable backend identifier used for explicit startup selection.
pub const HTTP_BACKEND_ID: &str = "http";

/// Runtime configuration for the HTTP backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpBackendConfig {
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
    pub timeout: Option<Duration>,
}

impl HttpBackendConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn into_backend_api_config(self) -> BackendApiConfig {
        let mut config = BackendApiConfig::default();

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }

        if let Some(user_agent) = self.user_agent {
            config = config.with_user_agent(user_agent);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

#[async_trait]
trait Transport: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> Result<TokenResponse, BackendApiError>;
    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse, BackendApiError>;
    async fn me(&self, token: &str) -> Result<User, BackendApiError>;
    async fn list_conversations(&self, token: &str)
        -> Result<Vec<Conversation>, BackendApiError>;
    async fn list_conversation_messages(
        &self,
        token: &str,
        conversation_id: ConversationId,
    ) -> Result<Vec<ConversationMessage>, BackendApiError>;
    async fn complete(
        &self,
        token: &str,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, BackendApiError>;
    async fn health(&self) -> Result<HealthResponse, BackendApiError>;
}

#[async_trait]
impl Transport for BackendApiClient {
    async fn register(&self, request: &RegisterRequest) -> Result<TokenResponse, BackendApiError> {
        BackendApiClient::register(self, request).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse, BackendApiError> {
        BackendApiClient::login(self, request).await
    }

    async fn me(&self, token: &str) -> Result<User, BackendApiError> {
        BackendApiClient::me(self, token).await
    }

    async fn list_conversations(
        &self,
        token: &str,
    ) -> Result<Vec<Conversation>, BackendApiError> {
        BackendApiClient::list_conversations(self, token).await
    }

    async fn list_conversation_messages(
        &self,
        token: &str,
        conversation_id: ConversationId,
    ) -> Result<Vec<ConversationMessage>, BackendApiError> {
        BackendApiClient::list_conversation_messages(self, token, conversation_id).await
    }

    async fn complete(
        &self,
        token: &str,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, BackendApiError> {
        BackendApiClient::complete(self, token, request).await
    }

    async fn health(&self) -> Result<HealthResponse, BackendApiError> {
        BackendApiClient::health(self).await
    }
}

/// `ChatBackend` adapter backed by `backend_api` transport primitives.
pub struct HttpBackend {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl HttpBackend {
    /// Creates a backend using real HTTP transport.
    pub fn new(config: HttpBackendConfig) -> Result<Self, BackendApiError> {
        let client = BackendApiClient::new(config.into_backend_api_config())?;
        Ok(Self {
            base_url: client.base_url().to_string(),
            transport: Arc::new(client),
        })
    }

    /// Normalized server root requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[cfg(test)]
    fn with_transport_for_tests(transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: "http://test.invalid".to_string(),
            transport,
        }
    }
}

fn map_error(operation: &'static str, error: BackendApiError) -> BackendError {
    match &error {
        BackendApiError::Status(status, message) => {
            debug!(operation, status = status.as_u16(), message = %message, "backend rejected request");
        }
        other => {
            warn!(operation, error = %other, "backend request failed");
        }
    }
    BackendError::from(error)
}

#[async_trait]
impl ChatBackend for HttpBackend {
    fn backend_id(&self) -> &str {
        HTTP_BACKEND_ID
    }

    async fn register(&self, request: RegisterRequest) -> Result<TokenResponse, BackendError> {
        self.transport
            .register(&request)
            .await
            .map_err(|error| map_error("register", error))
    }

    async fn login(&self, request: LoginRequest) -> Result<TokenResponse, BackendError> {
        self.transport
            .login(&request)
            .await
            .map_err(|error| map_error("login", error))
    }

    async fn profile(&self, token: &str) -> Result<User, BackendError> {
        self.transport
            .me(token)
            .await
            .map_err(|error| map_error("profile", error))
    }

    async fn list_conversations(&self, token: &str) -> Result<Vec<Conversation>, BackendError> {
        self.transport
            .list_conversations(token)
            .await
            .map_err(|error| map_error("list_conversations", error))
    }

    async fn list_messages(
        &self,
        token: &str,
        conversation_id: ConversationId,
    ) -> Result<Vec<ConversationMessage>, BackendError> {
        self.transport
            .list_conversation_messages(token, conversation_id)
            .await
            .map_err(|error| map_error("list_messages", error))
    }

    async fn complete(
        &self,
        token: &str,
        request: InferenceRequest,
    ) -> Result<InferenceResponse, BackendError> {
        self.transport
            .complete(token, &request)
            .await
            .map_err(|error| map_error("complete", error))
    }

    async fn health(&self) -> Result<HealthResponse, BackendError> {
        self.transport
            .health()
            .await
            .map_err(|error| map_error("health", error))
    }
}
