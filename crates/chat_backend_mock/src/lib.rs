//! Deterministic in-memory implementation of the `chat_backend` contract.
//!
//! Behaves like the real server for accounts, tokens, conversations, message
//! history and response caching, and adds test controls: per-operation gates
//! that hold calls until released, injected failures, and a call log.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chat_backend::{
    BackendError, ChatBackend, Conversation, ConversationId, ConversationMessage, HealthResponse,
    InferenceRequest, InferenceResponse, LoginRequest, MessageRole, RegisterRequest,
    TokenResponse, User, UserId,
};

mod gate;
mod state;

pub use gate::Gate;

use state::MockState;

/// Stable backend identifier used for explicit startup selection.
pub const MOCK_BACKEND_ID: &str = "mock";

const TOKEN_TTL_SECONDS: u64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Register,
    Login,
    Profile,
    ListConversations,
    ListMessages,
    Complete,
    Health,
}

/// One recorded backend call, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Register { username: String },
    Login { username: String },
    Profile { token: String },
    ListConversations { token: String },
    ListMessages {
        token: String,
        conversation_id: ConversationId,
    },
    Complete {
        token: String,
        request: InferenceRequest,
    },
    Health,
}

impl MockCall {
    #[must_use]
    pub fn operation(&self) -> MockOperation {
        match self {
            Self::Register { .. } => MockOperation::Register,
            Self::Login { .. } => MockOperation::Login,
            Self::Profile { .. } => MockOperation::Profile,
            Self::ListConversations { .. } => MockOperation::ListConversations,
            Self::ListMessages { .. } => MockOperation::ListMessages,
            Self::Complete { .. } => MockOperation::Complete,
            Self::Health => MockOperation::Health,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GateKey {
    operation: MockOperation,
    conversation_id: Option<ConversationId>,
}

#[derive(Debug, Default)]
struct Controls {
    gates: HashMap<GateKey, Gate>,
    failures: HashMap<MockOperation, VecDeque<BackendError>>,
    calls: Vec<MockCall>,
    health: Option<HealthResponse>,
}

/// In-memory backend used by client tests and local runs.
#[derive(Debug, Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
    controls: Mutex<Controls>,
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an account directly, bypassing the call log and gates.
    pub fn add_user(&self, username: &str, email: &str, password: &str) -> Result<User, BackendError> {
        lock_unpoisoned(&self.state).create_account(username, email, password)
    }

    /// Issues a fresh bearer token for an existing account.
    #[must_use]
    pub fn token_for(&self, username: &str) -> Option<String> {
        lock_unpoisoned(&self.state).token_for(username)
    }

    /// Invalidates every issued token, as if they all expired.
    pub fn revoke_tokens(&self) {
        lock_unpoisoned(&self.state).revoke_tokens();
    }

    pub fn add_conversation(&self, user_id: UserId, title: Option<&str>) -> Conversation {
        lock_unpoisoned(&self.state).create_conversation(user_id, title)
    }

    pub fn add_message(
        &self,
        conversation_id: ConversationId,
        role: MessageRole,
        content: &str,
    ) -> ConversationMessage {
        lock_unpoisoned(&self.state).append_message(conversation_id, role, content, None)
    }

    #[must_use]
    pub fn stored_messages(&self, conversation_id: ConversationId) -> Vec<ConversationMessage> {
        lock_unpoisoned(&self.state).messages_for(conversation_id)
    }

    #[must_use]
    pub fn stored_conversations(&self, user_id: UserId) -> Vec<Conversation> {
        lock_unpoisoned(&self.state).conversations_for(user_id)
    }

    /// Queues the next completion reply. Without queued replies the mock
    /// echoes the prompt.
    pub fn queue_reply(&self, reply: impl Into<String>) {
        lock_unpoisoned(&self.state).queue_reply(reply.into());
    }

    pub fn set_health(&self, report: HealthResponse) {
        lock_unpoisoned(&self.controls).health = Some(report);
    }

    /// Installs a shut gate on every call of `operation`.
    pub fn gate(&self, operation: MockOperation) -> Gate {
        self.install_gate(GateKey {
            operation,
            conversation_id: None,
        })
    }

    /// Installs a shut gate on calls of `operation` that target
    /// `conversation_id`. Conversation gates take precedence over operation
    /// gates.
    pub fn gate_conversation(
        &self,
        operation: MockOperation,
        conversation_id: ConversationId,
    ) -> Gate {
        self.install_gate(GateKey {
            operation,
            conversation_id: Some(conversation_id),
        })
    }

    /// Opens and removes every installed gate.
    pub fn clear_gates(&self) {
        let gates: Vec<Gate> = lock_unpoisoned(&self.controls)
            .gates
            .drain()
            .map(|(_, gate)| gate)
            .collect();
        for gate in gates {
            gate.open();
        }
    }

    /// Makes the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: MockOperation, error: BackendError) {
        lock_unpoisoned(&self.controls)
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        lock_unpoisoned(&self.controls).calls.clone()
    }

    #[must_use]
    pub fn call_count(&self, operation: MockOperation) -> usize {
        lock_unpoisoned(&self.controls)
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    fn install_gate(&self, key: GateKey) -> Gate {
        let gate = Gate::new();
        if let Some(previous) = lock_unpoisoned(&self.controls)
            .gates
            .insert(key, gate.clone())
        {
            previous.open();
        }
        gate
    }

    /// Records the call, waits on its gate, then yields any injected failure.
    async fn enter(&self, call: MockCall) -> Result<(), BackendError> {
        let operation = call.operation();
        let conversation_id = match &call {
            MockCall::ListMessages {
                conversation_id, ..
            } => Some(*conversation_id),
            MockCall::Complete { request, .. } => request.conversation_id,
            _ => None,
        };

        let gate = {
            let mut controls = lock_unpoisoned(&self.controls);
            controls.calls.push(call);
            conversation_id
                .and_then(|conversation_id| {
                    controls.gates.get(&GateKey {
                        operation,
                        conversation_id: Some(conversation_id),
                    })
                })
                .or_else(|| {
                    controls.gates.get(&GateKey {
                        operation,
                        conversation_id: None,
                    })
                })
                .cloned()
        };

        if let Some(gate) = gate {
            gate.pass().await;
        }

        let failure = lock_unpoisoned(&self.controls)
            .failures
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn token_response(access_token: String) -> TokenResponse {
    TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: TOKEN_TTL_SECONDS,
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    fn backend_id(&self) -> &str {
        MOCK_BACKEND_ID
    }

    async fn register(&self, request: RegisterRequest) -> Result<TokenResponse, BackendError> {
        self.enter(MockCall::Register {
            username: request.username.clone(),
        })
        .await?;
        let mut state = lock_unpoisoned(&self.state);
        let user = state.create_account(&request.username, &request.email, &request.password)?;
        Ok(token_response(state.issue_token(user.id)))
    }

    async fn login(&self, request: LoginRequest) -> Result<TokenResponse, BackendError> {
        self.enter(MockCall::Login {
            username: request.username.clone(),
        })
        .await?;
        let mut state = lock_unpoisoned(&self.state);
        let user_id = state.authenticate(&request.username, &request.password)?;
        Ok(token_response(state.issue_token(user_id)))
    }

    async fn profile(&self, token: &str) -> Result<User, BackendError> {
        self.enter(MockCall::Profile {
            token: token.to_string(),
        })
        .await?;
        lock_unpoisoned(&self.state).user_for_token(token)
    }

    async fn list_conversations(&self, token: &str) -> Result<Vec<Conversation>, BackendError> {
        self.enter(MockCall::ListConversations {
            token: token.to_string(),
        })
        .await?;
        let state = lock_unpoisoned(&self.state);
        let user = state.user_for_token(token)?;
        Ok(state.conversations_for(user.id))
    }

    async fn list_messages(
        &self,
        token: &str,
        conversation_id: ConversationId,
    ) -> Result<Vec<ConversationMessage>, BackendError> {
        self.enter(MockCall::ListMessages {
            token: token.to_string(),
            conversation_id,
        })
        .await?;
        let state = lock_unpoisoned(&self.state);
        let user = state.user_for_token(token)?;
        state.owned_conversation(user.id, conversation_id)?;
        Ok(state.messages_for(conversation_id))
    }

    async fn complete(
        &self,
        token: &str,
        request: InferenceRequest,
    ) -> Result<InferenceResponse, BackendError> {
        self.enter(MockCall::Complete {
            token: token.to_string(),
            request: request.clone(),
        })
        .await?;
        let mut state = lock_unpoisoned(&self.state);
        let user = state.user_for_token(token)?;
        state.complete(user.id, &request)
    }

    async fn health(&self) -> Result<HealthResponse, BackendError> {
        self.enter(MockCall::Health).await?;
        let report = lock_unpoisoned(&self.controls).health.clone();
        Ok(report.unwrap_or_else(|| HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: "ok".to_string(),
            redis: "ok".to_string(),
        }))
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chat_backend::{
        BackendError, ChatBackend, InferenceRequest, LoginRequest, MessageRole, RegisterRequest,
    };

    use super::{MockBackend, MockCall, MockOperation};

    fn seeded() -> (MockBackend, String) {
        let backend = MockBackend::new();
        backend
            .add_user("alice", "alice@example.com", "correctpw")
            .expect("seed user");
        let token = backend.token_for("alice").expect("token");
        (backend, token)
    }

    #[tokio::test]
    async fn register_then_login_issues_distinct_tokens() {
        let backend = MockBackend::new();
        let registered = backend
            .register(RegisterRequest::new("bob", "bob@example.com", "password1"))
            .await
            .expect("register");
        let logged_in = backend
            .login(LoginRequest::new("bob", "password1"))
            .await
            .expect("login");

        assert_ne!(registered.access_token, logged_in.access_token);
        let user = backend
            .profile(&logged_in.access_token)
            .await
            .expect("profile");
        assert_eq!(user.username, "bob");
    }

    #[tokio::test]
    async fn wrong_password_and_duplicate_account_fail_with_status() {
        let (backend, _) = seeded();
        let error = backend
            .login(LoginRequest::new("alice", "wrongpass"))
            .await
            .expect_err("wrong password");
        assert_eq!(error.status(), Some(401));

        let error = backend
            .register(RegisterRequest::new("alice", "other@example.com", "password1"))
            .await
            .expect_err("duplicate");
        assert_eq!(error.status(), Some(409));
    }

    #[tokio::test]
    async fn conversations_are_listed_most_recent_first() {
        let (backend, token) = seeded();
        let user = backend.profile(&token).await.expect("profile");
        let older = backend.add_conversation(user.id, Some("older"));
        let newer = backend.add_conversation(user.id, Some("newer"));

        let listed = backend.list_conversations(&token).await.expect("list");
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);

        backend.add_message(older.id, MessageRole::User, "bump");
        let listed = backend.list_conversations(&token).await.expect("list");
        assert_eq!(listed[0].id, older.id);
    }

    #[tokio::test]
    async fn completion_without_conversation_creates_one_and_persists_turns() {
        let (backend, token) = seeded();
        backend.queue_reply("4");

        let response = backend
            .complete(&token, InferenceRequest::new("2+2?"))
            .await
            .expect("complete");
        assert_eq!(response.content, "4");
        assert!(!response.cached);

        let stored = backend.stored_messages(response.conversation_id);
        let roles: Vec<MessageRole> = stored.iter().map(|message| message.role).collect();
        assert_eq!(roles, vec![MessageRole::User, MessageRole::Assistant]);
        assert_eq!(stored[1].id, response.id);
    }

    #[tokio::test]
    async fn identical_request_is_served_from_cache_without_persisting() {
        let (backend, token) = seeded();
        let first = backend
            .complete(&token, InferenceRequest::new("hello"))
            .await
            .expect("first");
        let request = InferenceRequest::new("hello").with_conversation_id(Some(first.conversation_id));
        let second = backend.complete(&token, request).await.expect("second");

        assert!(second.cached);
        assert_eq!(second.content, first.content);
        assert_eq!(backend.stored_messages(first.conversation_id).len(), 2);
    }

    #[tokio::test]
    async fn injected_failure_applies_once() {
        let (backend, token) = seeded();
        backend.fail_next(
            MockOperation::ListConversations,
            BackendError::api(500, "failed to list conversations"),
        );

        let error = backend
            .list_conversations(&token)
            .await
            .expect_err("injected");
        assert_eq!(error.message(), "failed to list conversations");
        assert!(backend.list_conversations(&token).await.is_ok());
        assert_eq!(backend.call_count(MockOperation::ListConversations), 2);
    }

    #[tokio::test]
    async fn revoked_tokens_are_rejected() {
        let (backend, token) = seeded();
        backend.revoke_tokens();
        let error = backend.profile(&token).await.expect_err("revoked");
        assert_eq!(error.status(), Some(401));
    }

    #[tokio::test]
    async fn gate_holds_call_until_released() {
        let (backend, token) = seeded();
        let backend = Arc::new(backend);
        let gate = backend.gate(MockOperation::Profile);

        let task = tokio::spawn({
            let backend = Arc::clone(&backend);
            let token = token.clone();
            async move { backend.profile(&token).await }
        });

        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        gate.release_one();
        let user = task.await.expect("join").expect("profile");
        assert_eq!(user.username, "alice");
        assert_eq!(
            backend.calls(),
            vec![MockCall::Profile {
                token: token.clone()
            }]
        );
    }
}
