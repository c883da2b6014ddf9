use std::collections::HashMap;

use chat_backend::{
    BackendError, Conversation, ConversationId, ConversationMessage, InferenceRequest,
    InferenceResponse, MessageRole, User, UserId, UserRole,
};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

pub(crate) const DEFAULT_MODEL: &str = "qwen2.5:0.5b";
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 1024;
const MOCK_LATENCY_MS: f64 = 5.0;

/// 2026-01-01T00:00:00Z. Every mutation advances the clock by one second so
/// `updated_at` ordering is strict.
const CLOCK_START: i64 = 1_767_225_600;

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: String,
}

#[derive(Debug)]
pub(crate) struct MockState {
    accounts: Vec<Account>,
    tokens: HashMap<String, UserId>,
    conversations: Vec<Conversation>,
    messages: Vec<ConversationMessage>,
    cache: HashMap<String, InferenceResponse>,
    replies: Vec<String>,
    next_token: u64,
    clock: i64,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            tokens: HashMap::new(),
            conversations: Vec::new(),
            messages: Vec::new(),
            cache: HashMap::new(),
            replies: Vec::new(),
            next_token: 0,
            clock: CLOCK_START,
        }
    }
}

impl MockState {
    fn tick(&mut self) -> OffsetDateTime {
        self.clock += 1;
        OffsetDateTime::UNIX_EPOCH + Duration::seconds(self.clock)
    }

    pub(crate) fn create_account(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, BackendError> {
        if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(BackendError::api(
                400,
                "username, email, and password are required",
            ));
        }
        if password.chars().count() < 8 {
            return Err(BackendError::api(
                400,
                "password must be at least 8 characters",
            ));
        }
        let taken = self
            .accounts
            .iter()
            .any(|account| account.user.username == username || account.user.email == email);
        if taken {
            return Err(BackendError::api(
                409,
                "registration failed: username or email may already be taken",
            ));
        }

        let now = self.tick();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_owned(),
            email: email.to_owned(),
            full_name: None,
            role: UserRole::Student,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.accounts.push(Account {
            user: user.clone(),
            password: password.to_owned(),
        });
        Ok(user)
    }

    pub(crate) fn authenticate(&self, username: &str, password: &str) -> Result<UserId, BackendError> {
        if username.is_empty() || password.is_empty() {
            return Err(BackendError::api(400, "username and password are required"));
        }
        self.accounts
            .iter()
            .find(|account| account.user.username == username && account.password == password)
            .map(|account| account.user.id)
            .ok_or_else(|| BackendError::api(401, "invalid credentials"))
    }

    pub(crate) fn issue_token(&mut self, user_id: UserId) -> String {
        self.next_token += 1;
        let token = format!("mock-token-{}", self.next_token);
        self.tokens.insert(token.clone(), user_id);
        token
    }

    pub(crate) fn token_for(&mut self, username: &str) -> Option<String> {
        let user_id = self
            .accounts
            .iter()
            .find(|account| account.user.username == username)?
            .user
            .id;
        Some(self.issue_token(user_id))
    }

    pub(crate) fn revoke_tokens(&mut self) {
        self.tokens.clear();
    }

    pub(crate) fn user_for_token(&self, token: &str) -> Result<User, BackendError> {
        let user_id = self
            .tokens
            .get(token)
            .ok_or_else(|| BackendError::api(401, "unauthorized"))?;
        self.accounts
            .iter()
            .find(|account| account.user.id == *user_id)
            .map(|account| account.user.clone())
            .ok_or_else(|| BackendError::api(401, "unauthorized"))
    }

    pub(crate) fn create_conversation(
        &mut self,
        user_id: UserId,
        title: Option<&str>,
    ) -> Conversation {
        let now = self.tick();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            user_id,
            title: title.map(str::to_owned),
            created_at: now,
            updated_at: now,
        };
        self.conversations.push(conversation.clone());
        conversation
    }

    /// Conversations owned by `user_id`, most recently updated first.
    pub(crate) fn conversations_for(&self, user_id: UserId) -> Vec<Conversation> {
        let mut conversations: Vec<Conversation> = self
            .conversations
            .iter()
            .filter(|conversation| conversation.user_id == user_id)
            .cloned()
            .collect();
        conversations.sort_by(|left, right| right.updated_at.cmp(&left.updated_at));
        conversations
    }

    pub(crate) fn owned_conversation(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> Result<&Conversation, BackendError> {
        let conversation = self
            .conversations
            .iter()
            .find(|conversation| conversation.id == conversation_id)
            .ok_or_else(|| BackendError::api(404, "conversation not found"))?;
        if conversation.user_id != user_id {
            return Err(BackendError::api(403, "forbidden"));
        }
        Ok(conversation)
    }

    pub(crate) fn append_message(
        &mut self,
        conversation_id: ConversationId,
        role: MessageRole,
        content: &str,
        model_used: Option<&str>,
    ) -> ConversationMessage {
        let now = self.tick();
        let message = ConversationMessage {
            id: Uuid::new_v4(),
            conversation_id,
            role,
            content: content.to_owned(),
            token_count: None,
            model_used: model_used.map(str::to_owned),
            latency_ms: None,
            created_at: now,
        };
        self.messages.push(message.clone());
        if let Some(conversation) = self
            .conversations
            .iter_mut()
            .find(|conversation| conversation.id == conversation_id)
        {
            conversation.updated_at = now;
        }
        message
    }

    pub(crate) fn messages_for(&self, conversation_id: ConversationId) -> Vec<ConversationMessage> {
        self.messages
            .iter()
            .filter(|message| message.conversation_id == conversation_id)
            .cloned()
            .collect()
    }

    pub(crate) fn queue_reply(&mut self, reply: String) {
        self.replies.push(reply);
    }

    /// Runs one completion the way the server does: resolve or create the
    /// conversation, answer from cache when an identical request was seen,
    /// otherwise generate a reply and persist both turns.
    pub(crate) fn complete(
        &mut self,
        user_id: UserId,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, BackendError> {
        if request.prompt.trim().is_empty() {
            return Err(BackendError::api(400, "prompt is required"));
        }

        let conversation_id = match request.conversation_id {
            Some(conversation_id) if self.has_conversation(conversation_id) => {
                self.owned_conversation(user_id, conversation_id)?.id
            }
            _ => self.create_conversation(user_id, None).id,
        };

        let model = request
            .model
            .as_deref()
            .filter(|model| !model.trim().is_empty())
            .unwrap_or(DEFAULT_MODEL)
            .to_owned();
        let cache_key = format!(
            "{user_id}:{model}:{}:{:.2}:{}",
            request.prompt,
            request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        );

        if let Some(cached) = self.cache.get(&cache_key) {
            return Ok(InferenceResponse {
                conversation_id,
                latency_ms: 0.0,
                cached: true,
                ..cached.clone()
            });
        }

        let content = if self.replies.is_empty() {
            format!("You said: {}", request.prompt)
        } else {
            self.replies.remove(0)
        };
        let token_count = u32::try_from(content.split_whitespace().count()).unwrap_or(u32::MAX);

        self.append_message(conversation_id, MessageRole::User, &request.prompt, None);
        let assistant =
            self.append_message(conversation_id, MessageRole::Assistant, &content, Some(&model));

        let response = InferenceResponse {
            id: assistant.id,
            conversation_id,
            content,
            model,
            token_count: Some(token_count),
            latency_ms: MOCK_LATENCY_MS,
            cached: false,
        };
        self.cache.insert(cache_key, response.clone());
        Ok(response)
    }

    fn has_conversation(&self, conversation_id: ConversationId) -> bool {
        self.conversations
            .iter()
            .any(|conversation| conversation.id == conversation_id)
    }
}
