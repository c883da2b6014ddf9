use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

use crate::store::KeyValueStore;

pub const THEME_KEY: &str = "roognis.client.theme";
pub const SIDEBAR_WIDTH_KEY: &str = "roognis.client.sidebar_width";
pub const SIDEBAR_COLLAPSED_KEY: &str = "roognis.client.sidebar_collapsed";

pub const SIDEBAR_WIDTH_MIN: u32 = 240;
pub const SIDEBAR_WIDTH_MAX: u32 = 420;
pub const SIDEBAR_WIDTH_DEFAULT: u32 = 280;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme '{other}'")),
        }
    }
}

/// Display preferences kept in the durable scope.
///
/// Reads fall back to defaults and writes are logged and dropped on failure;
/// preferences never block the client.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for Preferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preferences").finish_non_exhaustive()
    }
}

impl Preferences {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.read(THEME_KEY)
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }

    pub fn set_theme(&self, theme: Theme) {
        self.write(THEME_KEY, theme.as_str());
    }

    #[must_use]
    pub fn sidebar_width(&self) -> u32 {
        self.read(SIDEBAR_WIDTH_KEY)
            .and_then(|value| value.trim().parse::<u32>().ok())
            .map_or(SIDEBAR_WIDTH_DEFAULT, clamp_sidebar_width)
    }

    /// Stores the clamped width and returns it.
    pub fn set_sidebar_width(&self, width: u32) -> u32 {
        let width = clamp_sidebar_width(width);
        self.write(SIDEBAR_WIDTH_KEY, &width.to_string());
        width
    }

    #[must_use]
    pub fn sidebar_collapsed(&self) -> bool {
        self.read(SIDEBAR_COLLAPSED_KEY).as_deref() == Some("1")
    }

    pub fn set_sidebar_collapsed(&self, collapsed: bool) {
        self.write(SIDEBAR_COLLAPSED_KEY, if collapsed { "1" } else { "0" });
    }

    fn read(&self, key: &'static str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(error) => {
                warn!(key, error = %error, "failed to read preference");
                None
            }
        }
    }

    fn write(&self, key: &'static str, value: &str) {
        if let Err(error) = self.store.set(key, value) {
            warn!(key, error = %error, "failed to write preference");
        }
    }
}

fn clamp_sidebar_width(width: u32) -> u32 {
    width.clamp(SIDEBAR_WIDTH_MIN, SIDEBAR_WIDTH_MAX)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{Preferences, Theme, SIDEBAR_WIDTH_DEFAULT, SIDEBAR_WIDTH_KEY, THEME_KEY};
    use crate::store::{KeyValueStore, MemoryStore};

    #[test]
    fn defaults_apply_to_empty_store() {
        let preferences = Preferences::new(Arc::new(MemoryStore::new()));
        assert_eq!(preferences.theme(), Theme::Dark);
        assert_eq!(preferences.sidebar_width(), SIDEBAR_WIDTH_DEFAULT);
        assert!(!preferences.sidebar_collapsed());
    }

    #[test]
    fn sidebar_width_is_clamped_on_write_and_read() {
        let store = Arc::new(MemoryStore::new());
        let preferences = Preferences::new(store.clone());

        assert_eq!(preferences.set_sidebar_width(1000), 420);
        assert_eq!(preferences.sidebar_width(), 420);

        store.set(SIDEBAR_WIDTH_KEY, "100").expect("seed");
        assert_eq!(preferences.sidebar_width(), 240);

        store.set(SIDEBAR_WIDTH_KEY, "wide").expect("seed");
        assert_eq!(preferences.sidebar_width(), SIDEBAR_WIDTH_DEFAULT);
    }

    #[test]
    fn theme_and_collapsed_round_trip_through_store() {
        let store = Arc::new(MemoryStore::new());
        let preferences = Preferences::new(store.clone());

        preferences.set_theme(Theme::Light);
        preferences.set_sidebar_collapsed(true);
        assert_eq!(store.get(THEME_KEY).expect("get"), Some("light".to_owned()));
        assert_eq!(preferences.theme(), Theme::Light);
        assert!(preferences.sidebar_collapsed());

        store.set(THEME_KEY, "solarized").expect("seed");
        assert_eq!(preferences.theme(), Theme::Dark);
    }
}
