//! Settings storage for Scribe
//!
//! Settings live as pretty JSON in one directory, by default
//! `dirs::config_dir()/scribe/`. They are read once at startup and written
//! back only when a preference actually changes.

use crate::config::Settings;
use crate::error::{Error, Result, ResultExt};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name under the platform config directory
const APP_NAME: &str = "scribe";

const CONFIG_FILE_NAME: &str = "config.json";

/// Written first, then renamed over the config file
const CONFIG_TEMP_NAME: &str = "config.json.tmp";

// ─────────────────────────────────────────────────────────────────────────────
// Config Store
// ─────────────────────────────────────────────────────────────────────────────

/// A settings file in a given directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// Store rooted at `dir`.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store in the platform config directory
    /// (`~/.config/scribe`, `%APPDATA%\scribe`, `~/Library/Application Support/scribe`).
    pub fn user() -> Result<Self> {
        dirs::config_dir()
            .map(|base| Self::at(base.join(APP_NAME)))
            .ok_or(Error::ConfigDirNotFound)
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }

    /// Read the settings. A missing or blank file yields the defaults.
    pub fn load(&self) -> Result<Settings> {
        let path = self.path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings at {}, using defaults", path.display());
                return Ok(Settings::default());
            }
            Err(e) => {
                return Err(Error::ConfigLoad {
                    path,
                    source: Box::new(e),
                })
            }
        };
        if contents.trim().is_empty() {
            return Ok(Settings::default());
        }

        let settings = Settings::from_json_sanitized(&contents).map_err(|e| {
            warn!("Settings at {} are not valid JSON: {}", path.display(), e);
            Error::ConfigParse {
                message: format!("{}: {}", path.display(), e),
                source: Some(Box::new(e)),
            }
        })?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write `settings`, replacing the file in one rename.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let path = self.path();
        fs::create_dir_all(&self.dir).map_err(|e| save_error(&self.dir, e))?;
        let json = serde_json::to_string_pretty(settings).map_err(|e| save_error(&path, e))?;
        let temp = self.dir.join(CONFIG_TEMP_NAME);
        fs::write(&temp, json).map_err(|e| save_error(&temp, e))?;
        fs::rename(&temp, &path).map_err(|e| save_error(&path, e))?;

        info!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Load, apply `change`, sanitize and save if anything differs.
    ///
    /// Returns the resulting settings. Unchanged settings are not rewritten.
    pub fn update(&self, change: impl FnOnce(&mut Settings)) -> Result<Settings> {
        let current = self.load()?;
        let mut next = current.clone();
        change(&mut next);
        next.sanitize();
        if next != current {
            self.save(&next)?;
        } else {
            debug!("Settings unchanged, not saving");
        }
        Ok(next)
    }
}

fn save_error(at: &Path, source: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::ConfigSave {
        path: at.to_path_buf(),
        source: Box::new(source),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Load the user's settings, falling back to defaults on any error.
pub fn load_config() -> Settings {
    ConfigStore::user()
        .and_then(|store| store.load())
        .unwrap_or_warn_default(Settings::default(), "Failed to load settings")
}

/// Change the user's settings and persist them when they differ.
pub fn update_config(change: impl FnOnce(&mut Settings)) -> Result<Settings> {
    ConfigStore::user()?.update(change)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FontSize, Theme};
    use tempfile::TempDir;

    fn store() -> (TempDir, ConfigStore) {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::at(dir.path().join(APP_NAME));
        (dir, store)
    }

    #[test]
    fn test_user_store_location() {
        if let Ok(store) = ConfigStore::user() {
            let path = store.path();
            assert!(path.ends_with(Path::new(APP_NAME).join(CONFIG_FILE_NAME)));
        }
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let (_dir, store) = store();
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_blank_file_gives_defaults() {
        let (_dir, store) = store();
        fs::create_dir_all(&store.dir).unwrap();
        fs::write(store.path(), "  \n").unwrap();
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let (_dir, store) = store();
        let settings = Settings {
            theme: Theme::Light,
            font_size: FontSize::Small,
            placeholder: "Écrivez ici".into(),
            ..Settings::default()
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
        assert!(!store.dir.join(CONFIG_TEMP_NAME).exists());
    }

    #[test]
    fn test_load_sanitizes_hand_edits() {
        let (_dir, store) = store();
        fs::create_dir_all(&store.dir).unwrap();
        fs::write(
            store.path(),
            r#"{"min_resize_width": 0.5, "table_cols": 0, "window_size": 3}"#,
        )
        .unwrap();
        let settings = store.load().unwrap();
        assert_eq!(settings.min_resize_width, Settings::MIN_RESIZE_WIDTH);
        assert_eq!(settings.table_cols, Settings::MIN_TABLE_SIZE);
    }

    #[test]
    fn test_corrupt_file_is_a_parse_error() {
        let (_dir, store) = store();
        fs::create_dir_all(&store.dir).unwrap();
        fs::write(store.path(), "{ invalid json }").unwrap();
        assert!(matches!(store.load(), Err(Error::ConfigParse { .. })));

        fs::write(store.path(), r#"{"font_size": 14}"#).unwrap();
        assert!(matches!(store.load(), Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn test_update_saves_only_on_change() {
        let (_dir, store) = store();

        let unchanged = store.update(|_| {}).unwrap();
        assert_eq!(unchanged, Settings::default());
        assert!(!store.path().exists());

        let changed = store.update(|s| s.theme = s.theme.toggle()).unwrap();
        assert_eq!(changed.theme, Theme::Light);
        assert_eq!(store.load().unwrap().theme, Theme::Light);
    }

    #[test]
    fn test_update_sanitizes_before_saving() {
        let (_dir, store) = store();
        let settings = store.update(|s| s.table_rows = 0).unwrap();
        assert_eq!(settings.table_rows, Settings::MIN_TABLE_SIZE);
        assert_eq!(store.load().unwrap().table_rows, Settings::MIN_TABLE_SIZE);

        // Sanitized back to what is stored, so nothing changes
        store.update(|s| s.table_rows = 0).unwrap();
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn test_load_config_graceful_fallback() {
        let settings = load_config();
        assert!(settings.table_rows >= Settings::MIN_TABLE_SIZE);
    }
}
