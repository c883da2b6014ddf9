//! Plain-text rendering of client state for the terminal.

use chat_backend::{
    Conversation, ConversationId, HealthResponse, InferenceResponse, MessageRole, User,
};
use roognis_client::{conversation_label, Notice, NoticeKind, Transcript, TranscriptMessage};

pub fn message(message: &TranscriptMessage) -> String {
    let speaker = match message.role {
        MessageRole::User => "you",
        MessageRole::Assistant => "assistant",
        MessageRole::System => "system",
    };
    let mut line = format!("{speaker}> {}", message.content);
    if message.is_pending() {
        line.push_str(" (sending...)");
    }
    if let Some(meta) = message_meta(
        message.model_used.as_deref(),
        message.latency_ms,
        message.cached,
    ) {
        line.push('\n');
        line.push_str(&meta);
    }
    line
}

pub fn transcript(label: &str, transcript: &Transcript) -> String {
    let mut out = format!("== {label} ==");
    if transcript.is_empty() {
        out.push_str("\n(no messages yet)");
    }
    for entry in transcript.messages() {
        out.push('\n');
        out.push_str(&message(entry));
    }
    out
}

pub fn reply(response: &InferenceResponse) -> String {
    let mut out = format!("assistant> {}", response.content);
    if let Some(meta) = message_meta(
        Some(&response.model),
        Some(response.latency_ms),
        response.cached,
    ) {
        out.push('\n');
        out.push_str(&meta);
    }
    out
}

pub fn conversations(list: &[Conversation], selected: Option<ConversationId>) -> String {
    if list.is_empty() {
        return "No conversations yet. Type a prompt to start one.".to_string();
    }
    list.iter()
        .enumerate()
        .map(|(index, conversation)| {
            let marker = if Some(conversation.id) == selected { '*' } else { ' ' };
            format!("{marker} {:>2}. {}", index + 1, conversation_label(conversation))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn notice(notice: &Notice) -> String {
    let tag = match notice.kind {
        NoticeKind::Success => "ok",
        NoticeKind::Info => "info",
        NoticeKind::Error => "error",
    };
    format!("[{tag}] {}", notice.text)
}

pub fn user(user: &User) -> String {
    format!("Signed in as {} ({})", user.username, user.role.as_str())
}

pub fn health(report: &HealthResponse) -> String {
    let mut parts = Vec::new();
    if !report.version.is_empty() {
        parts.push(format!("version {}", report.version));
    }
    if !report.database.is_empty() {
        parts.push(format!("database {}", report.database));
    }
    if !report.redis.is_empty() {
        parts.push(format!("redis {}", report.redis));
    }
    if parts.is_empty() {
        format!("backend {}", report.status)
    } else {
        format!("backend {} ({})", report.status, parts.join(", "))
    }
}

fn message_meta(model: Option<&str>, latency_ms: Option<f64>, cached: bool) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(model) = model {
        parts.push(model.to_string());
    }
    if let Some(latency_ms) = latency_ms {
        parts.push(format!("{latency_ms:.0} ms"));
    }
    if cached {
        parts.push("cached".to_string());
    }
    if parts.is_empty() {
        None
    } else {
        Some(format!("   [{}]", parts.join(" | ")))
    }
}
