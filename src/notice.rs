use std::collections::VecDeque;

pub const SIGNED_IN: &str = "Signed in";
pub const ACCOUNT_CREATED: &str = "Account created";
pub const SERVED_FROM_CACHE: &str = "Served from cache";
pub const CREDENTIALS_NOT_SAVED: &str = "Could not save the access token";
pub const CREDENTIALS_NOT_CLEARED: &str = "Could not remove the stored access token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

/// Non-blocking message for the user, drained by the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Notices {
    queue: VecDeque<Notice>,
}

impl Notices {
    pub(crate) fn push(&mut self, notice: Notice) {
        self.queue.push_back(notice);
    }

    pub(crate) fn drain(&mut self) -> Vec<Notice> {
        self.queue.drain(..).collect()
    }
}
