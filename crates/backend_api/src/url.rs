use url::Url;

use crate::error::BackendApiError;

/// Default server root for backend requests.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
/// Path prefix shared by every versioned endpoint.
pub const API_PREFIX: &str = "/api/v1";
/// Unversioned liveness/readiness probe path.
pub const HEALTH_PATH: &str = "/health";

/// Normalize a configured base URL to the server root.
///
/// Normalization rules:
/// 1) blank input falls back to [`DEFAULT_API_BASE_URL`]
/// 2) the scheme must be `http` or `https` and a host must be present
/// 3) trailing slashes are removed
/// 4) a trailing `/api/v1` segment is removed so endpoint paths are not doubled
pub fn normalize_base_url(input: &str) -> Result<String, BackendApiError> {
    let trimmed = input.trim();
    let base = if trimmed.is_empty() {
        DEFAULT_API_BASE_URL
    } else {
        trimmed
    };

    let parsed = Url::parse(base)
        .map_err(|error| BackendApiError::InvalidBaseUrl(format!("{base}: {error}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(BackendApiError::InvalidBaseUrl(format!(
            "{base}: scheme must be http or https"
        )));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(BackendApiError::InvalidBaseUrl(format!(
            "{base}: missing host"
        )));
    }

    let mut root = base.trim_end_matches('/');
    if let Some(stripped) = root.strip_suffix(API_PREFIX) {
        root = stripped.trim_end_matches('/');
    }
    Ok(root.to_string())
}

/// Resolve a versioned endpoint path against a normalized server root.
pub fn api_endpoint(root: &str, path: &str) -> Result<Url, BackendApiError> {
    let joined = format!("{root}{API_PREFIX}{path}");
    Url::parse(&joined).map_err(|error| BackendApiError::InvalidBaseUrl(format!("{joined}: {error}")))
}

/// Resolve the unversioned health endpoint against a normalized server root.
pub fn health_endpoint(root: &str) -> Result<Url, BackendApiError> {
    let joined = format!("{root}{HEALTH_PATH}");
    Url::parse(&joined).map_err(|error| BackendApiError::InvalidBaseUrl(format!("{joined}: {error}")))
}
