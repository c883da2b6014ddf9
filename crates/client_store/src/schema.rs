use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const STORE_VERSION: u32 = 1;

/// On-disk shape of the durable key-value scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDocument {
    pub version: u32,
    #[serde(default)]
    pub entries: BTreeMap<String, String>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            entries: BTreeMap::new(),
        }
    }
}
