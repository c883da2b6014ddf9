use chat_backend::BackendError;
use thiserror::Error;

/// Client-side input rejection. Raised before any network call and never
/// changes state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Prompt cannot be empty")]
    EmptyPrompt,
    #[error("Prompt is too long ({length} characters, limit is {limit})")]
    PromptTooLong { length: usize, limit: usize },
    #[error("Username is required")]
    EmptyUsername,
    #[error("Username must be at least {min} characters")]
    UsernameTooShort { min: usize },
    #[error("Enter a valid email address")]
    InvalidEmail,
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Missing authentication token")]
    AuthenticationMissing,

    #[error("Already signed in; log out first")]
    AlreadySignedIn,

    #[error("{message}")]
    Api { status: u16, message: String },

    /// Transport or decoding failure. The detail is logged, not shown.
    #[error("Something went wrong. Please try again.")]
    Unexpected(String),

    /// Another send or history load is outstanding, or a sign-in is already
    /// in progress.
    #[error("Another request is still in progress")]
    Busy,

    /// The session or selection changed while the request was in flight and
    /// its result was discarded.
    #[error("Request was superseded by a newer session or selection")]
    Superseded,
}

impl ClientError {
    #[must_use]
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error is shown to the user as a notice. Busy and
    /// superseded outcomes are control flow, not failures.
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Busy | Self::Superseded)
    }
}

impl From<BackendError> for ClientError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::Api { status, message } => Self::Api { status, message },
            BackendError::Unexpected(message) => Self::Unexpected(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use chat_backend::BackendError;

    use super::{ClientError, ValidationError};

    #[test]
    fn backend_errors_keep_status_and_message() {
        let error = ClientError::from(BackendError::api(401, "invalid credentials"));
        assert!(error.is_api());
        assert_eq!(error.status(), Some(401));
        assert_eq!(error.to_string(), "invalid credentials");

        let error = ClientError::from(BackendError::unexpected("connection refused"));
        assert!(!error.is_api());
        assert_eq!(error.status(), None);
        assert_eq!(error, ClientError::Unexpected("connection refused".to_string()));
        assert_eq!(error.to_string(), "Something went wrong. Please try again.");
        assert!(error.is_user_facing());
    }

    #[test]
    fn validation_messages_are_user_readable() {
        let error = ClientError::from(ValidationError::PromptTooLong {
            length: 32_001,
            limit: 32_000,
        });
        assert_eq!(
            error.to_string(),
            "Prompt is too long (32001 characters, limit is 32000)"
        );
        assert!(error.is_user_facing());
        assert!(!ClientError::Superseded.is_user_facing());
    }
}
