//! Terminal front end for the Roognis chat client.
//!
//! ## Backend bootstrap
//!
//! - `ROOGNIS_BACKEND=http` (default) talks to the server at
//!   `ROOGNIS_API_BASE_URL` (default `http://localhost:8080`).
//! - `ROOGNIS_BACKEND=mock` runs against an in-memory backend for local
//!   experiments; nothing it stores survives the process.
//!
//! `ROOGNIS_CONFIG_PATH` may name a UTF-8 JSON file with this shape:
//!
//! ```json
//! {
//!   "base_url": "http://localhost:8080",
//!   "timeout_sec": 60,
//!   "remember_credentials": true,
//!   "data_dir": "/home/me/.local/share/roognis"
//! }
//! ```
//!
//! Contract notes:
//! - Every field is optional. Environment variables win over the file.
//! - `timeout_sec` must be > 0 when provided.
//! - Unknown JSON fields are rejected.
//! - With `remember_credentials` the access token is kept in the durable store
//!   under `ROOGNIS_DATA_DIR` (default: the platform data directory) and the
//!   next start resumes the session.
//!
//! ## Logging
//!
//! Events go to stderr, filtered by `RUST_LOG` (default `info`). Set
//! `ROOGNIS_LOG_FILE` to append them to a file instead.

pub mod app;
pub mod backends;
pub mod commands;
pub mod config;
pub mod logging;
pub mod render;
