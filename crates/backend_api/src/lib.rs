//! Transport-only HTTP client for the inference backend.
//!
//! This crate owns request building, bearer-token headers, and response/error
//! decoding for the backend's JSON endpoints. It contains no session state and
//! performs no retries; every call is a single request/response exchange.
//!
//! Error envelope contract: non-success responses carry a JSON body with a
//! `message` or `error` string. When neither is present the failure message is
//! synthesized as `Request failed: <status>`. A success response that is not
//! JSON decodes as an empty payload rather than a parse failure.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod url;

pub use client::BackendApiClient;
pub use config::BackendApiConfig;
pub use error::BackendApiError;
pub use url::{normalize_base_url, API_PREFIX, DEFAULT_API_BASE_URL};
