use std::sync::Arc;

use chat_backend::ChatBackend;
use chat_backend_http::{HttpBackend, HttpBackendConfig};
use chat_backend_mock::MockBackend;

use crate::config::{BackendKind, CliConfig};

pub fn backend_from_config(config: &CliConfig) -> Result<Arc<dyn ChatBackend>, String> {
    match config.backend {
        BackendKind::Mock => Ok(Arc::new(MockBackend::new())),
        BackendKind::Http => {
            let mut http = HttpBackendConfig::new();
            if let Some(base_url) = &config.base_url {
                http = http.with_base_url(base_url.clone());
            }
            if let Some(timeout) = config.timeout {
                http = http.with_timeout(timeout);
            }
            let backend = HttpBackend::new(http)
                .map_err(|error| format!("invalid backend configuration: {error}"))?;
            Ok(Arc::new(backend))
        }
    }
}
