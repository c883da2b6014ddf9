use chat_backend::User;

use crate::generation::{Generation, Ticket};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    /// A sign-in call or the post-sign-in bootstrap is in flight.
    Authenticating,
    Authenticated,
}

/// Who is signed in. The epoch advances on every token change so results
/// issued under an older token can be recognized and dropped.
#[derive(Debug)]
pub(crate) struct SessionState {
    phase: SessionPhase,
    token: Option<String>,
    user: Option<User>,
    epoch: Generation,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        Self {
            phase: SessionPhase::Anonymous,
            token: None,
            user: None,
            epoch: Generation::new(),
        }
    }

    pub(crate) fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub(crate) fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub(crate) fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub(crate) fn epoch(&self) -> Ticket {
        self.epoch.current()
    }

    pub(crate) fn is_current(&self, ticket: Ticket) -> bool {
        self.epoch.is_current(ticket)
    }

    pub(crate) fn begin_sign_in(&mut self) {
        self.phase = SessionPhase::Authenticating;
    }

    /// Reverts a failed sign-in.
    pub(crate) fn abort_sign_in(&mut self) {
        if self.token.is_none() {
            self.phase = SessionPhase::Anonymous;
        }
    }

    /// Installs a new token and returns the ticket its bootstrap runs under.
    pub(crate) fn install_token(&mut self, token: String) -> Ticket {
        self.token = Some(token);
        self.user = None;
        self.phase = SessionPhase::Authenticating;
        self.epoch.advance()
    }

    pub(crate) fn authenticate(&mut self, user: User) {
        self.user = Some(user);
        self.phase = SessionPhase::Authenticated;
    }

    /// Drops token and user and invalidates everything in flight.
    pub(crate) fn reset(&mut self) {
        self.token = None;
        self.user = None;
        self.phase = SessionPhase::Anonymous;
        self.epoch.advance();
    }
}
