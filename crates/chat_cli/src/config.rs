//! Startup configuration from the environment and an optional JSON file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const BACKEND_ENV_VAR: &str = "ROOGNIS_BACKEND";
pub const API_BASE_URL_ENV_VAR: &str = "ROOGNIS_API_BASE_URL";
pub const CONFIG_PATH_ENV_VAR: &str = "ROOGNIS_CONFIG_PATH";
pub const DATA_DIR_ENV_VAR: &str = "ROOGNIS_DATA_DIR";
pub const LOG_FILE_ENV_VAR: &str = "ROOGNIS_LOG_FILE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported backend '{0}'; available backends: http, mock")]
    UnknownBackend(String),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("timeout_sec in {path} must be greater than 0")]
    InvalidTimeout { path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Http,
    Mock,
}

impl BackendKind {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "mock" => Ok(Self::Mock),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Shape of the file named by `ROOGNIS_CONFIG_PATH`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    base_url: Option<String>,
    timeout_sec: Option<u64>,
    remember_credentials: Option<bool>,
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    pub backend: BackendKind,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub remember_credentials: bool,
    pub data_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl CliConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from `lookup`. Environment values take
    /// precedence over the config file; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let file = match value(CONFIG_PATH_ENV_VAR) {
            Some(path) => load_file_config(Path::new(path.trim()))?,
            None => FileConfig::default(),
        };

        let backend = match value(BACKEND_ENV_VAR) {
            Some(backend) => BackendKind::parse(&backend)?,
            None => BackendKind::default(),
        };

        Ok(Self {
            backend,
            base_url: value(API_BASE_URL_ENV_VAR)
                .map(|url| url.trim().to_string())
                .or(file.base_url),
            timeout: file.timeout_sec.map(Duration::from_secs),
            remember_credentials: file.remember_credentials.unwrap_or(false),
            data_dir: value(DATA_DIR_ENV_VAR)
                .map(|dir| PathBuf::from(dir.trim()))
                .or(file.data_dir),
            log_file: value(LOG_FILE_ENV_VAR).map(|path| PathBuf::from(path.trim())),
        })
    }

    /// Directory holding the durable store, if one can be determined.
    #[must_use]
    pub fn resolved_data_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(client_store::default_data_dir)
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file: FileConfig = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if file.timeout_sec == Some(0) {
        return Err(ConfigError::InvalidTimeout {
            path: path.to_path_buf(),
        });
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Mutex, MutexGuard, OnceLock};
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::{
        BackendKind, CliConfig, ConfigError, API_BASE_URL_ENV_VAR, BACKEND_ENV_VAR,
        CONFIG_PATH_ENV_VAR, DATA_DIR_ENV_VAR,
    };

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let previous = env::var(key).ok();
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
            Self { key, previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.previous {
                Some(value) => env::set_var(self.key, value),
                None => env::remove_var(self.key),
            }
        }
    }

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        match mutex.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = CliConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.backend, BackendKind::Http);
    }

    #[test]
    fn environment_overrides_the_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("roognis.json");
        fs::write(
            &path,
            r#"{"base_url":"http://file:8080","timeout_sec":30,"remember_credentials":true,"data_dir":"/from/file"}"#,
        )
        .expect("write config");
        let path = path.to_string_lossy().into_owned();

        let config = CliConfig::from_lookup(lookup(&[
            (CONFIG_PATH_ENV_VAR, path.as_str()),
            (API_BASE_URL_ENV_VAR, " http://env:9000 "),
            (BACKEND_ENV_VAR, "Mock"),
        ]))
        .expect("config");

        assert_eq!(config.backend, BackendKind::Mock);
        assert_eq!(config.base_url.as_deref(), Some("http://env:9000"));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert!(config.remember_credentials);
        assert_eq!(config.data_dir, Some(PathBuf::from("/from/file")));
    }

    #[test]
    fn config_file_rejects_unknown_fields_and_zero_timeout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let unknown = dir.path().join("unknown.json");
        fs::write(&unknown, r#"{"base_url":"http://x","token":"secret"}"#).expect("write");
        let zero = dir.path().join("zero.json");
        fs::write(&zero, r#"{"timeout_sec":0}"#).expect("write");

        let unknown = unknown.to_string_lossy().into_owned();
        let error = CliConfig::from_lookup(lookup(&[(CONFIG_PATH_ENV_VAR, unknown.as_str())]))
            .expect_err("unknown field");
        assert!(matches!(error, ConfigError::Parse { .. }));

        let zero = zero.to_string_lossy().into_owned();
        let error = CliConfig::from_lookup(lookup(&[(CONFIG_PATH_ENV_VAR, zero.as_str())]))
            .expect_err("zero timeout");
        assert!(matches!(error, ConfigError::InvalidTimeout { .. }));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let error = CliConfig::from_lookup(lookup(&[(BACKEND_ENV_VAR, "grpc")]))
            .expect_err("unknown backend");
        assert_eq!(
            error.to_string(),
            "unsupported backend 'grpc'; available backends: http, mock"
        );
    }

    #[test]
    fn from_env_reads_process_environment() {
        let _env_serialization = lock_unpoisoned(env_lock());
        let _backend = EnvGuard::set(BACKEND_ENV_VAR, Some("mock"));
        let _config = EnvGuard::set(CONFIG_PATH_ENV_VAR, None);
        let _data = EnvGuard::set(DATA_DIR_ENV_VAR, Some("   "));

        let config = CliConfig::from_env().expect("config");

        assert_eq!(config.backend, BackendKind::Mock);
        assert_eq!(config.data_dir, None);
    }
}
