use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::error::StoreError;
use crate::store::{KeyValueStore, MemoryStore};

pub const TOKEN_KEY: &str = "roognis.client.token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialScope {
    /// Lives as long as the running client.
    Session,
    /// Survives restarts.
    Remembered,
}

impl CredentialScope {
    #[must_use]
    pub fn for_remember(remember: bool) -> Self {
        if remember {
            Self::Remembered
        } else {
            Self::Session
        }
    }

    fn other(self) -> Self {
        match self {
            Self::Session => Self::Remembered,
            Self::Remembered => Self::Session,
        }
    }
}

/// Bearer token holder over two scopes.
///
/// At most one scope holds a token at a time: `set` writes the chosen scope
/// and clears the other. `get` prefers the session scope.
#[derive(Clone)]
pub struct CredentialStore {
    session: Arc<dyn KeyValueStore>,
    remembered: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

impl CredentialStore {
    #[must_use]
    pub fn new(session: Arc<dyn KeyValueStore>, remembered: Arc<dyn KeyValueStore>) -> Self {
        Self {
            session,
            remembered,
        }
    }

    /// Both scopes in memory. Nothing survives the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Volatile session scope over the given durable scope.
    #[must_use]
    pub fn with_durable(remembered: Arc<dyn KeyValueStore>) -> Self {
        Self::new(Arc::new(MemoryStore::new()), remembered)
    }

    fn scope(&self, scope: CredentialScope) -> &dyn KeyValueStore {
        match scope {
            CredentialScope::Session => self.session.as_ref(),
            CredentialScope::Remembered => self.remembered.as_ref(),
        }
    }

    pub fn set(&self, token: &str, remember: bool) -> Result<(), StoreError> {
        let scope = CredentialScope::for_remember(remember);
        self.scope(scope).set(TOKEN_KEY, token)?;
        self.scope(scope.other()).remove(TOKEN_KEY)
    }

    /// Returns the stored token, session scope first. Blank values count as
    /// absent.
    pub fn get(&self) -> Result<Option<String>, StoreError> {
        if let Some(token) = non_blank(self.session.get(TOKEN_KEY)?) {
            return Ok(Some(token));
        }
        Ok(non_blank(self.remembered.get(TOKEN_KEY)?))
    }

    /// Removes the token from both scopes. Both removals are attempted even if
    /// the first fails; the first failure is returned.
    pub fn clear(&self) -> Result<(), StoreError> {
        let session = self.session.remove(TOKEN_KEY);
        let remembered = self.remembered.remove(TOKEN_KEY);
        if let Err(error) = &session {
            warn!(scope = "session", error = %error, "failed to clear credential");
        }
        if let Err(error) = &remembered {
            warn!(scope = "remembered", error = %error, "failed to clear credential");
        }
        session.and(remembered)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|token| !token.trim().is_empty())
}
