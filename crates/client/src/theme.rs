//! Persisted light/dark preference.

use std::sync::Arc;

use tracing::debug;

use time_capsule_core::Theme;

use crate::storage::{DurableStorage, StorageError, THEME_SLOT};

/// Reads and writes the [`THEME_SLOT`] slot.
#[derive(Clone)]
pub struct ThemePreference {
    storage: Arc<dyn DurableStorage>,
}

impl ThemePreference {
    #[must_use]
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        Self { storage }
    }

    /// The stored theme. Missing or unrecognised values are light.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be read.
    pub fn load(&self) -> Result<Theme, StorageError> {
        let stored = self.storage.get(THEME_SLOT)?;
        Ok(stored
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or_default())
    }

    /// Persist `theme`.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be written.
    pub fn set(&self, theme: Theme) -> Result<(), StorageError> {
        self.storage.set(THEME_SLOT, theme.as_str())?;
        debug!(%theme, "Theme saved");
        Ok(())
    }

    /// Flip and persist the theme, returning the new one.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be read or written.
    pub fn toggle(&self) -> Result<Theme, StorageError> {
        let theme = self.load()?.toggled();
        self.set(theme)?;
        Ok(theme)
    }
}

impl std::fmt::Debug for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemePreference").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, MemoryStorage};

    #[test]
    fn test_default_is_light() {
        let prefs = ThemePreference::new(Arc::new(MemoryStorage::new()));
        assert_eq!(prefs.load().unwrap(), Theme::Light);
    }

    #[test]
    fn test_unknown_value_is_light() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(THEME_SLOT, "sepia").unwrap();
        let prefs = ThemePreference::new(storage);
        assert_eq!(prefs.load().unwrap(), Theme::Light);
    }

    #[test]
    fn test_toggle_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = ThemePreference::new(Arc::new(FileStorage::open(dir.path()).unwrap()));

        assert_eq!(prefs.toggle().unwrap(), Theme::Dark);

        let reopened = ThemePreference::new(Arc::new(FileStorage::open(dir.path()).unwrap()));
        assert_eq!(reopened.load().unwrap(), Theme::Dark);
        assert_eq!(reopened.toggle().unwrap(), Theme::Light);
    }
}
