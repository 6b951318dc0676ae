//! User settings and preferences for Scribe
//!
//! This module defines the `Settings` struct that holds the host
//! application's preferences and the editor options, with serde support for
//! JSON persistence.

use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::document::CssLength;
use crate::editor::{EditorOptions, TableShape};

// ─────────────────────────────────────────────────────────────────────────────
// Theme Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Available color themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    /// Switch between light and dark.
    pub fn toggle(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Get a display label for this theme.
    pub fn label(&self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{}' (expected light or dark)", other)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Font Size Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Text size preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    /// Get a display label for this size.
    pub fn label(&self) -> &'static str {
        match self {
            FontSize::Small => "Small",
            FontSize::Medium => "Medium",
            FontSize::Large => "Large",
        }
    }

    /// Size in points.
    pub fn points(&self) -> f32 {
        match self {
            FontSize::Small => 12.0,
            FontSize::Medium => 14.0,
            FontSize::Large => 18.0,
        }
    }

    /// All sizes, for selection lists.
    pub fn all() -> &'static [FontSize] {
        &[FontSize::Small, FontSize::Medium, FontSize::Large]
    }
}

impl FromStr for FontSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FontSize::all()
            .iter()
            .copied()
            .find(|size| size.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                format!(
                    "unknown font size '{}' (expected small, medium or large)",
                    wanted
                )
            })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// Application settings.
///
/// This struct is serialized to JSON and persisted to the user's config directory.
/// All fields have sensible defaults via the `Default` trait and `#[serde(default)]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Appearance
    // ─────────────────────────────────────────────────────────────────────────
    /// Color theme (light or dark)
    pub theme: Theme,

    /// Text size preset
    pub font_size: FontSize,

    // ─────────────────────────────────────────────────────────────────────────
    // Application Behavior
    // ─────────────────────────────────────────────────────────────────────────
    /// Whether to show notifications
    pub notifications: bool,

    /// Whether documents are saved automatically on change
    pub auto_save: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Editor
    // ─────────────────────────────────────────────────────────────────────────
    /// Text shown while the document is empty
    pub placeholder: String,

    /// Width given to newly inserted images (CSS length)
    pub default_image_width: String,

    /// Smallest width an image can be dragged to, in pixels
    pub min_resize_width: f32,

    /// Rows of a table inserted from the toolbar
    pub table_rows: usize,

    /// Columns of a table inserted from the toolbar
    pub table_cols: usize,

    /// Whether toolbar tables get a header row
    pub table_header_row: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Appearance
            theme: Theme::default(),
            font_size: FontSize::default(),

            // Application Behavior
            notifications: true,
            auto_save: true,

            // Editor
            placeholder: String::from("Start writing..."),
            default_image_width: String::from(CssLength::FULL),
            min_resize_width: 100.0,
            table_rows: 3,
            table_cols: 3,
            table_header_row: true,
        }
    }
}

impl Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Validation Constants and Sanitization
    // ─────────────────────────────────────────────────────────────────────────

    /// Minimum allowed resize width.
    pub const MIN_RESIZE_WIDTH: f32 = 16.0;
    /// Maximum allowed resize width.
    pub const MAX_RESIZE_WIDTH: f32 = 4000.0;
    /// Minimum table dimension.
    pub const MIN_TABLE_SIZE: usize = 1;
    /// Maximum table dimension.
    pub const MAX_TABLE_SIZE: usize = 20;

    /// Sanitize settings by clamping values to valid ranges.
    ///
    /// This is useful after loading settings from a file that might have
    /// been manually edited with invalid values.
    pub fn sanitize(&mut self) {
        if self.min_resize_width.is_finite() {
            self.min_resize_width = self
                .min_resize_width
                .clamp(Self::MIN_RESIZE_WIDTH, Self::MAX_RESIZE_WIDTH);
        } else {
            self.min_resize_width = Self::default().min_resize_width;
        }

        self.table_rows = self
            .table_rows
            .clamp(Self::MIN_TABLE_SIZE, Self::MAX_TABLE_SIZE);
        self.table_cols = self
            .table_cols
            .clamp(Self::MIN_TABLE_SIZE, Self::MAX_TABLE_SIZE);

        match CssLength::parse(&self.default_image_width) {
            Ok(width) => self.default_image_width = width.to_string(),
            Err(_) => {
                warn!(
                    "Invalid default image width {:?}, using {}",
                    self.default_image_width,
                    CssLength::FULL
                );
                self.default_image_width = String::from(CssLength::FULL);
            }
        }
    }

    /// Load settings and sanitize them to ensure validity.
    ///
    /// This is a convenience method that deserializes and then sanitizes.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Options an editor instance is constructed with.
    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions {
            placeholder: self.placeholder.clone(),
            default_image_width: CssLength::parse(&self.default_image_width)
                .unwrap_or_default(),
            min_resize_width: self.min_resize_width,
            table: TableShape {
                rows: self.table_rows,
                cols: self.table_cols,
                with_header_row: self.table_header_row,
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.font_size, FontSize::Medium);
        assert!(settings.notifications);
        assert!(settings.auto_save);
        assert_eq!(settings.default_image_width, "100%");
        assert_eq!(settings.min_resize_width, 100.0);
        assert_eq!((settings.table_rows, settings.table_cols), (3, 3));
    }

    #[test]
    fn test_theme_serialization() {
        assert_eq!(serde_json::to_string(&Theme::Light).unwrap(), "\"light\"");
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
        assert_eq!(
            serde_json::from_str::<Theme>("\"light\"").unwrap(),
            Theme::Light
        );
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Light.toggle(), Theme::Dark);
        assert_eq!(Theme::Dark.toggle(), Theme::Light);
        assert_eq!(Theme::Dark.label(), "Dark");
    }

    #[test]
    fn test_font_size_presets() {
        assert_eq!(
            serde_json::to_string(&FontSize::Large).unwrap(),
            "\"large\""
        );
        assert!(FontSize::Small.points() < FontSize::Large.points());
        assert_eq!(FontSize::all().len(), 3);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Light".parse::<Theme>(), Ok(Theme::Light));
        assert_eq!(" dark ".parse::<Theme>(), Ok(Theme::Dark));
        assert!("sepia".parse::<Theme>().is_err());
        assert_eq!("large".parse::<FontSize>(), Ok(FontSize::Large));
        assert!("huge".parse::<FontSize>().is_err());
    }

    #[test]
    fn test_settings_serialization_roundtrip() {
        let original = Settings::default();
        let json = serde_json::to_string_pretty(&original).unwrap();
        let deserialized: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        // Minimal JSON - should fill in defaults
        let json = r#"{"theme": "light"}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.font_size, FontSize::Medium);
        assert!(settings.auto_save);
    }

    #[test]
    fn test_settings_deserialize_empty_json() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sanitization tests
    // ─────────────────────────────────────────────────────────────────────────
    #[test]
    fn test_sanitize_table_shape() {
        let mut settings = Settings::default();
        settings.table_rows = 0;
        settings.table_cols = 500;
        settings.sanitize();
        assert_eq!(settings.table_rows, Settings::MIN_TABLE_SIZE);
        assert_eq!(settings.table_cols, Settings::MAX_TABLE_SIZE);
    }

    #[test]
    fn test_sanitize_resize_width() {
        let mut settings = Settings::default();
        settings.min_resize_width = 1.0;
        settings.sanitize();
        assert_eq!(settings.min_resize_width, Settings::MIN_RESIZE_WIDTH);

        settings.min_resize_width = f32::NAN;
        settings.sanitize();
        assert_eq!(settings.min_resize_width, 100.0);
    }

    #[test]
    fn test_sanitize_image_width() {
        let mut settings = Settings::default();
        settings.default_image_width = "wide".into();
        settings.sanitize();
        assert_eq!(settings.default_image_width, "100%");

        settings.default_image_width = " 320PX ".into();
        settings.sanitize();
        assert_eq!(settings.default_image_width, "320px");
    }

    #[test]
    fn test_from_json_sanitized() {
        let json = r#"{"table_rows": 0, "default_image_width": "nope"}"#;
        let settings = Settings::from_json_sanitized(json).unwrap();
        assert_eq!(settings.table_rows, 1);
        assert_eq!(settings.default_image_width, "100%");
    }

    #[test]
    fn test_editor_options() {
        let settings = Settings {
            placeholder: "Type here".into(),
            default_image_width: "50%".into(),
            table_header_row: false,
            ..Settings::default()
        };
        let options = settings.editor_options();
        assert_eq!(options.placeholder, "Type here");
        assert_eq!(options.default_image_width.as_str(), "50%");
        assert!(!options.table.with_header_row);
        assert_eq!(options.min_resize_width, 100.0);
    }
}
