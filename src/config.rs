//! Core client configuration.

/// Prompt ceiling in Unicode scalar values.
pub const DEFAULT_PROMPT_LIMIT: usize = 32_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub prompt_limit: usize,
    /// Store tokens from login/register in the remembered scope so they
    /// survive restarts. Off by default.
    pub remember_credentials: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            prompt_limit: DEFAULT_PROMPT_LIMIT,
            remember_credentials: false,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn with_prompt_limit(mut self, prompt_limit: usize) -> Self {
        self.prompt_limit = prompt_limit;
        self
    }

    #[must_use]
    pub fn with_remember_credentials(mut self, remember: bool) -> Self {
        self.remember_credentials = remember;
        self
    }
}
