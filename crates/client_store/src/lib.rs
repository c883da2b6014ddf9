mod credentials;
mod error;
mod paths;
mod preferences;
mod schema;
mod store;

pub use credentials::{CredentialScope, CredentialStore, TOKEN_KEY};
pub use error::StoreError;
pub use paths::{default_data_dir, store_file_path, DATA_DIR_NAME, STORE_FILE_NAME};
pub use preferences::{
    Preferences, Theme, SIDEBAR_COLLAPSED_KEY, SIDEBAR_WIDTH_DEFAULT, SIDEBAR_WIDTH_KEY,
    SIDEBAR_WIDTH_MAX, SIDEBAR_WIDTH_MIN, THEME_KEY,
};
pub use schema::{StoreDocument, STORE_VERSION};
pub use store::{FileStore, KeyValueStore, MemoryStore};
