//! Ordered messages of the active conversation, including optimistic turns.
//!
//! A send appends a pending user turn immediately. Success confirms it and
//! appends the assistant reply; failure rolls back exactly that turn. Turns
//! are addressed by [`PendingId`], never by position, so a rollback cannot
//! remove a message that arrived in the meantime.

use chat_backend::{
    ConversationId, ConversationMessage, InferenceResponse, MessageId, MessageRole,
};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Server(MessageId),
    Local(PendingId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Pending,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptMessage {
    pub key: MessageKey,
    pub conversation_id: Option<ConversationId>,
    pub role: MessageRole,
    pub content: String,
    pub token_count: Option<u32>,
    pub model_used: Option<String>,
    pub latency_ms: Option<f64>,
    pub cached: bool,
    pub created_at: OffsetDateTime,
    pub delivery: Delivery,
}

impl TranscriptMessage {
    fn from_server(message: ConversationMessage) -> Self {
        Self {
            key: MessageKey::Server(message.id),
            conversation_id: Some(message.conversation_id),
            role: message.role,
            content: message.content,
            token_count: message.token_count,
            model_used: message.model_used,
            latency_ms: message.latency_ms,
            cached: false,
            created_at: message.created_at,
            delivery: Delivery::Confirmed,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.delivery == Delivery::Pending
    }
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    conversation_id: Option<ConversationId>,
    messages: Vec<TranscriptMessage>,
    next_local: u64,
}

impl Transcript {
    #[must_use]
    pub fn conversation_id(&self) -> Option<ConversationId> {
        self.conversation_id
    }

    #[must_use]
    pub fn messages(&self) -> &[TranscriptMessage] {
        &self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Empties the transcript and binds it to `conversation_id`.
    pub fn reset(&mut self, conversation_id: Option<ConversationId>) {
        self.conversation_id = conversation_id;
        self.messages.clear();
    }

    /// Replaces the transcript with a loaded history. System turns are
    /// dropped; server order is kept.
    pub fn replace_history(
        &mut self,
        conversation_id: ConversationId,
        history: Vec<ConversationMessage>,
    ) {
        self.conversation_id = Some(conversation_id);
        self.messages = history
            .into_iter()
            .filter(|message| message.role.is_displayed())
            .map(TranscriptMessage::from_server)
            .collect();
    }

    pub fn append_pending(&mut self, prompt: &str) -> PendingId {
        self.next_local = self.next_local.wrapping_add(1);
        let id = PendingId(self.next_local);
        self.messages.push(TranscriptMessage {
            key: MessageKey::Local(id),
            conversation_id: self.conversation_id,
            role: MessageRole::User,
            content: prompt.to_string(),
            token_count: None,
            model_used: None,
            latency_ms: None,
            cached: false,
            created_at: OffsetDateTime::now_utc(),
            delivery: Delivery::Pending,
        });
        id
    }

    /// Confirms the pending turn and appends the assistant reply. Returns
    /// false, changing nothing, when the pending turn is no longer present.
    pub fn confirm(&mut self, id: PendingId, response: &InferenceResponse) -> bool {
        let Some(index) = self.pending_index(id) else {
            return false;
        };

        self.conversation_id = Some(response.conversation_id);
        let user = &mut self.messages[index];
        user.delivery = Delivery::Confirmed;
        user.conversation_id = Some(response.conversation_id);

        self.messages.push(TranscriptMessage {
            key: MessageKey::Server(response.id),
            conversation_id: Some(response.conversation_id),
            role: MessageRole::Assistant,
            content: response.content.clone(),
            token_count: response.token_count,
            model_used: Some(response.model.clone()),
            latency_ms: Some(response.latency_ms),
            cached: response.cached,
            created_at: OffsetDateTime::now_utc(),
            delivery: Delivery::Confirmed,
        });
        true
    }

    /// Removes the pending turn `id`. Idempotent.
    pub fn rollback(&mut self, id: PendingId) -> bool {
        match self.pending_index(id) {
            Some(index) => {
                self.messages.remove(index);
                true
            }
            None => false,
        }
    }

    fn pending_index(&self, id: PendingId) -> Option<usize> {
        self.messages
            .iter()
            .position(|message| message.key == MessageKey::Local(id) && message.is_pending())
    }
}
