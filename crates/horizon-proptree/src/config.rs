//! Table configuration.
//!
//! [`TableConfig`] holds every layout constant and behavior switch of a
//! [`TableEngine`](crate::TableEngine). It can be built in code with the
//! `with_*` methods or loaded from TOML; missing keys take their defaults.
//!
//! ```
//! use horizon_proptree::{SelectionMode, TableConfig};
//!
//! let config = TableConfig::from_toml_str(
//!     r##"
//!     floating_columns = true
//!     selection_mode = "row"
//!     default_row_height = 24
//!
//!     [colors]
//!     selection = "#3060C0"
//!     "##,
//! )
//! .unwrap();
//!
//! assert!(config.floating_columns);
//! assert_eq!(config.selection_mode, SelectionMode::Row);
//! assert_eq!(config.row_header_width, 30);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::geometry::Color;
use crate::paint::Font;
use crate::selection::SelectionMode;

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading or validating a [`TableConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse table config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize table config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Colors used when painting rows and headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableColors {
    pub even_row: Color,
    pub odd_row: Color,
    pub selection: Color,
    pub header: Color,
    pub text: Color,
}

impl Default for TableColors {
    fn default() -> Self {
        Self {
            even_row: Color::WHITE,
            odd_row: Color::from_rgba8(240, 240, 240, 255),
            selection: Color::from_rgba8(51, 102, 204, 255),
            header: Color::from_rgba8(216, 216, 216, 255),
            text: Color::BLACK,
        }
    }
}

/// Layout and behavior settings of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Columns keep their own widths and may overflow the viewport. When
    /// false, non-fixed columns are rescaled to exactly fill it.
    pub floating_columns: bool,
    pub show_row_header: bool,
    pub show_column_header: bool,
    /// Use each node's preferred height instead of the default row height.
    pub apply_best_height: bool,
    pub selection_mode: SelectionMode,
    pub default_row_height: u32,
    pub row_header_width: u32,
    pub column_header_height: u32,
    /// Horizontal indent per tree level in the first column.
    pub depth_indent: u32,
    /// Width of the open/close affordance.
    pub open_close_width: u32,
    pub min_column_width: u32,
    pub default_column_width: u32,
    pub font_family: String,
    pub font_size: f32,
    pub colors: TableColors,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            floating_columns: false,
            show_row_header: true,
            show_column_header: true,
            apply_best_height: true,
            selection_mode: SelectionMode::Cell,
            default_row_height: 20,
            row_header_width: 30,
            column_header_height: 20,
            depth_indent: 20,
            open_close_width: 15,
            min_column_width: 10,
            default_column_width: 140,
            font_family: "sans-serif".to_string(),
            font_size: 12.0,
            colors: TableColors::default(),
        }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// The preset used by [`TreeEngine`](crate::TreeEngine): a single fitted
    /// column without headers, every row at the default height.
    pub fn tree() -> Self {
        Self {
            floating_columns: false,
            show_row_header: false,
            show_column_header: false,
            apply_best_height: false,
            selection_mode: SelectionMode::Row,
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check values that would make layout meaningless.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_row_height == 0 {
            return Err(ConfigError::Invalid {
                field: "default_row_height",
                reason: "must be greater than zero".into(),
            });
        }
        if self.min_column_width > self.default_column_width {
            return Err(ConfigError::Invalid {
                field: "min_column_width",
                reason: format!(
                    "{} exceeds default_column_width {}",
                    self.min_column_width, self.default_column_width
                ),
            });
        }
        if !(self.font_size > 0.0) {
            return Err(ConfigError::Invalid {
                field: "font_size",
                reason: format!("{} is not a positive size", self.font_size),
            });
        }
        Ok(())
    }

    /// The font described by `font_family` and `font_size`.
    pub fn font(&self) -> Font {
        Font::new(self.font_family.clone(), self.font_size)
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    pub fn with_floating_columns(mut self, floating: bool) -> Self {
        self.floating_columns = floating;
        self
    }

    pub fn with_row_header(mut self, show: bool) -> Self {
        self.show_row_header = show;
        self
    }

    pub fn with_column_header(mut self, show: bool) -> Self {
        self.show_column_header = show;
        self
    }

    pub fn with_best_height(mut self, apply: bool) -> Self {
        self.apply_best_height = apply;
        self
    }

    pub fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection_mode = mode;
        self
    }

    pub fn with_default_row_height(mut self, height: u32) -> Self {
        self.default_row_height = height;
        self
    }

    pub fn with_row_header_width(mut self, width: u32) -> Self {
        self.row_header_width = width;
        self
    }

    pub fn with_column_header_height(mut self, height: u32) -> Self {
        self.column_header_height = height;
        self
    }

    pub fn with_depth_indent(mut self, indent: u32) -> Self {
        self.depth_indent = indent;
        self
    }

    pub fn with_open_close_width(mut self, width: u32) -> Self {
        self.open_close_width = width;
        self
    }

    pub fn with_min_column_width(mut self, width: u32) -> Self {
        self.min_column_width = width;
        self
    }

    pub fn with_default_column_width(mut self, width: u32) -> Self {
        self.default_column_width = width;
        self
    }

    pub fn with_font(mut self, family: impl Into<String>, size: f32) -> Self {
        self.font_family = family.into();
        self.font_size = size;
        self
    }

    pub fn with_colors(mut self, colors: TableColors) -> Self {
        self.colors = colors;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TableConfig::default();
        assert!(!config.floating_columns);
        assert_eq!(config.default_row_height, 20);
        assert_eq!(config.row_header_width, 30);
        assert_eq!(config.column_header_height, 20);
        assert_eq!(config.depth_indent, 20);
        assert_eq!(config.open_close_width, 15);
        assert_eq!(config.min_column_width, 10);
        assert_eq!(config.default_column_width, 140);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tree_preset() {
        let config = TableConfig::tree();
        assert!(!config.show_row_header);
        assert!(!config.show_column_header);
        assert!(!config.apply_best_height);
        assert!(!config.floating_columns);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = TableConfig::from_toml_str(
            r##"
            show_row_header = false
            selection_mode = "column"

            [colors]
            text = "#102030"
            "##,
        )
        .unwrap();
        assert!(!config.show_row_header);
        assert_eq!(config.selection_mode, SelectionMode::Column);
        assert_eq!(config.colors.text.to_hex(), "#102030");
        assert_eq!(config.colors.even_row, Color::WHITE);
        assert_eq!(config.default_column_width, 140);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = TableConfig::default()
            .with_floating_columns(true)
            .with_default_row_height(24)
            .with_font("monospace", 10.0);
        let text = config.to_toml_string().unwrap();
        assert_eq!(TableConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_zero_row_height() {
        let err = TableConfig::from_toml_str("default_row_height = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "default_row_height",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_min_width_above_default() {
        let err = TableConfig::from_toml_str("min_column_width = 200").unwrap_err();
        assert!(err.to_string().contains("min_column_width"));
    }

    #[test]
    fn test_rejects_bad_color_and_syntax() {
        assert!(matches!(
            TableConfig::from_toml_str("[colors]\ntext = \"blue\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            TableConfig::from_toml_str("floating_columns = "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = TableConfig::from_file("/nonexistent/table.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
