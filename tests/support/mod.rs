#![allow(dead_code)]

use std::sync::Arc;

use chat_backend::{Conversation, MessageRole, User};
use chat_backend_mock::MockBackend;
use client_store::{CredentialStore, KeyValueStore, MemoryStore, StoreError, TOKEN_KEY};
use roognis_client::{ChatClient, ClientConfig, Notice, NoticeKind};

pub const PASSWORD: &str = "correctpw";

pub struct Harness {
    pub backend: Arc<MockBackend>,
    pub client: ChatClient,
    pub session: Arc<MemoryStore>,
    pub remembered: Arc<MemoryStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let backend = Arc::new(MockBackend::new());
        let session = Arc::new(MemoryStore::new());
        let remembered = Arc::new(MemoryStore::new());
        let credentials = CredentialStore::new(session.clone(), remembered.clone());
        let client = ChatClient::new(backend.clone(), credentials, config);
        Self {
            backend,
            client,
            session,
            remembered,
        }
    }

    pub fn credentials(&self) -> CredentialStore {
        CredentialStore::new(self.session.clone(), self.remembered.clone())
    }

    pub fn add_user(&self, username: &str) -> User {
        self.backend
            .add_user(username, &format!("{username}@example.com"), PASSWORD)
            .expect("seed user")
    }

    /// Seeds a conversation holding one user/assistant exchange.
    pub fn add_exchange(&self, user: &User, title: &str, prompt: &str, reply: &str) -> Conversation {
        let conversation = self.backend.add_conversation(user.id, Some(title));
        self.backend
            .add_message(conversation.id, MessageRole::User, prompt);
        self.backend
            .add_message(conversation.id, MessageRole::Assistant, reply);
        conversation
    }

    pub async fn sign_in(&self, username: &str) -> User {
        self.client
            .login(username, PASSWORD)
            .await
            .expect("login succeeds")
    }

    /// Tokens held by the session and remembered scopes, in that order.
    pub fn stored_tokens(&self) -> (Option<String>, Option<String>) {
        (
            self.session.get(TOKEN_KEY).expect("session scope"),
            self.remembered.get(TOKEN_KEY).expect("remembered scope"),
        )
    }

    pub fn error_notices(&self) -> Vec<String> {
        notices_of(&self.client.drain_notices(), NoticeKind::Error)
    }
}

pub fn notices_of(notices: &[Notice], kind: NoticeKind) -> Vec<String> {
    notices
        .iter()
        .filter(|notice| notice.kind == kind)
        .map(|notice| notice.text.clone())
        .collect()
}

pub fn contents(client: &ChatClient) -> Vec<String> {
    client
        .transcript()
        .messages()
        .iter()
        .map(|message| message.content.clone())
        .collect()
}

/// Durable scope whose writes or removals fail, as a read-only or full disk
/// would. Reads are served from memory.
#[derive(Default)]
pub struct BrokenDisk {
    inner: MemoryStore,
    fail_set: bool,
    fail_remove: bool,
}

impl BrokenDisk {
    pub fn failing_writes() -> Self {
        Self {
            fail_set: true,
            ..Self::default()
        }
    }

    pub fn failing_removals() -> Self {
        Self {
            fail_remove: true,
            ..Self::default()
        }
    }

    fn refuse(operation: &'static str, key: &str) -> StoreError {
        StoreError::io(operation, key, std::io::Error::other("disk unavailable"))
    }
}

impl KeyValueStore for BrokenDisk {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_set {
            return Err(Self::refuse("writing key", key));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_remove {
            return Err(Self::refuse("removing key", key));
        }
        self.inner.remove(key)
    }
}

/// Client over `backend` whose remembered scope is `durable`.
pub fn client_with_durable(
    backend: Arc<MockBackend>,
    durable: Arc<BrokenDisk>,
    config: ClientConfig,
) -> ChatClient {
    let credentials = CredentialStore::new(Arc::new(MemoryStore::new()), durable);
    ChatClient::new(backend, credentials, config)
}
