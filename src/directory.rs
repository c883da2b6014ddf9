use chat_backend::{Conversation, ConversationId};

pub const NEW_CONVERSATION_LABEL: &str = "New conversation";
const ID_LABEL_CHARS: usize = 8;

/// Known conversations in server order plus the active selection. `None`
/// selects a fresh conversation that the first successful send creates.
#[derive(Debug, Default)]
pub struct ConversationDirectory {
    conversations: Vec<Conversation>,
    selected: Option<ConversationId>,
}

impl ConversationDirectory {
    #[must_use]
    pub fn list(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Replaces the list wholesale. Server order is kept as-is.
    pub fn replace(&mut self, conversations: Vec<Conversation>) {
        self.conversations = conversations;
    }

    pub fn select(&mut self, conversation_id: Option<ConversationId>) {
        self.selected = conversation_id;
    }

    #[must_use]
    pub fn selected(&self) -> Option<ConversationId> {
        self.selected
    }

    #[must_use]
    pub fn find(&self, conversation_id: ConversationId) -> Option<&Conversation> {
        self.conversations
            .iter()
            .find(|conversation| conversation.id == conversation_id)
    }

    #[must_use]
    pub fn selected_label(&self) -> String {
        match self.selected {
            None => NEW_CONVERSATION_LABEL.to_string(),
            Some(conversation_id) => match self.find(conversation_id) {
                Some(conversation) => conversation_label(conversation),
                None => short_id(conversation_id),
            },
        }
    }

    pub fn clear(&mut self) {
        self.conversations.clear();
        self.selected = None;
    }
}

/// Title when present, otherwise the leading characters of the id.
#[must_use]
pub fn conversation_label(conversation: &Conversation) -> String {
    match conversation.title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => short_id(conversation.id),
    }
}

fn short_id(conversation_id: ConversationId) -> String {
    conversation_id
        .to_string()
        .chars()
        .take(ID_LABEL_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use chat_backend::Conversation;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::{conversation_label, ConversationDirectory, NEW_CONVERSATION_LABEL};

    fn conversation(title: Option<&str>) -> Conversation {
        Conversation {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: title.map(str::to_string),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn labels_prefer_title_then_short_id() {
        let titled = conversation(Some("Fractions"));
        assert_eq!(conversation_label(&titled), "Fractions");

        let untitled = conversation(None);
        let label = conversation_label(&untitled);
        assert_eq!(label.len(), 8);
        assert!(untitled.id.to_string().starts_with(&label));

        let blank = conversation(Some("  "));
        assert_eq!(conversation_label(&blank).len(), 8);
    }

    #[test]
    fn replace_keeps_server_order_and_selection() {
        let first = conversation(Some("b"));
        let second = conversation(Some("a"));
        let mut directory = ConversationDirectory::default();
        assert_eq!(directory.selected_label(), NEW_CONVERSATION_LABEL);

        directory.select(Some(second.id));
        directory.replace(vec![first.clone(), second.clone()]);

        let ids: Vec<_> = directory.list().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert_eq!(directory.selected(), Some(second.id));
        assert_eq!(directory.selected_label(), "a");

        directory.clear();
        assert!(directory.list().is_empty());
        assert_eq!(directory.selected(), None);
    }
}
