use std::collections::BTreeMap;
use std::time::Duration;

use crate::url::DEFAULT_API_BASE_URL;

/// Where and how the client reaches the chat server.
#[derive(Debug, Clone)]
pub struct BackendApiConfig {
    /// Server root. Endpoints live under `<base_url>/api/v1`; a base URL that
    /// already ends in `/api/v1` is accepted as is.
    pub base_url: String,
    pub user_agent: Option<String>,
    /// Sent with every request after the JSON and auth headers, so an entry
    /// here can override them.
    pub extra_headers: BTreeMap<String, String>,
    /// Whole-request timeout. Requests wait indefinitely when unset.
    pub timeout: Option<Duration>,
}

impl Default for BackendApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

impl BackendApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_agent: None,
            extra_headers: BTreeMap::new(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_base_url(self, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..self
        }
    }

    #[must_use]
    pub fn with_user_agent(self, user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: Some(user_agent.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    #[must_use]
    pub fn insert_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }
}
