use std::collections::BTreeMap;

use crate::config::BackendApiConfig;
use crate::error::BackendApiError;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_USER_AGENT: &str = "User-Agent";

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Build a deterministic header map for backend requests.
///
/// `token` is `None` for the unauthenticated endpoints (register, login,
/// health). A present but blank token is rejected rather than sent.
pub fn build_headers(
    config: &BackendApiConfig,
    token: Option<&str>,
) -> Result<BTreeMap<String, String>, BackendApiError> {
    let mut headers = BTreeMap::new();

    if let Some(token) = token {
        let token = token.trim();
        if token.is_empty() {
            return Err(BackendApiError::MissingAccessToken);
        }
        headers.insert(HEADER_AUTHORIZATION.to_owned(), format!("Bearer {token}"));
    }

    headers.insert(HEADER_ACCEPT.to_owned(), CONTENT_TYPE_JSON.to_owned());
    headers.insert(HEADER_CONTENT_TYPE.to_owned(), CONTENT_TYPE_JSON.to_owned());

    let ua = config
        .user_agent
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(default_user_agent);
    headers.insert(HEADER_USER_AGENT.to_owned(), ua);

    for (key, value) in &config.extra_headers {
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    Ok(headers)
}

pub fn default_user_agent() -> String {
    format!("roognis-client/{}", env!("CARGO_PKG_VERSION"))
}
