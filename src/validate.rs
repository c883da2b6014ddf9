//! Client-side input checks. These are UX guards, not a security boundary;
//! the server validates again.

use crate::error::ValidationError;

pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MIN_USERNAME_CHARS: usize = 3;

pub fn login_fields(username: &str, password: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::EmptyUsername);
    }
    password_field(password)
}

pub fn register_fields(username: &str, email: &str, password: &str) -> Result<(), ValidationError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ValidationError::EmptyUsername);
    }
    if username.chars().count() < MIN_USERNAME_CHARS {
        return Err(ValidationError::UsernameTooShort {
            min: MIN_USERNAME_CHARS,
        });
    }
    if !email.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }
    password_field(password)
}

/// Returns the trimmed prompt when it is non-empty and within `limit`
/// Unicode scalar values.
pub fn prompt(prompt: &str, limit: usize) -> Result<&str, ValidationError> {
    let clean = prompt.trim();
    if clean.is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }
    let length = clean.chars().count();
    if length > limit {
        return Err(ValidationError::PromptTooLong { length, limit });
    }
    Ok(clean)
}

fn password_field(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_CHARS,
        });
    }
    Ok(())
}
