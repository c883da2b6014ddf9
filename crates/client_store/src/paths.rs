use std::path::{Path, PathBuf};

pub const DATA_DIR_NAME: &str = "roognis";
pub const STORE_FILE_NAME: &str = "store.json";

/// Platform data directory for the client, e.g. `~/.local/share/roognis`.
#[must_use]
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(DATA_DIR_NAME))
}

#[must_use]
pub fn store_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_FILE_NAME)
}
