//! Designer configuration from environment variables.
//!
//! Load configuration using `DesignerConfig::from_env()` after calling `dotenvy::dotenv()`.

use std::path::PathBuf;

/// Default key prefix for persisted node positions
pub const DEFAULT_STORAGE_PREFIX: &str = "schema-positions-";

/// Spacing of the default grid layout
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// Horizontal distance between grid columns
    pub spacing_x: f64,
    /// Vertical distance between grid rows
    pub spacing_y: f64,
    /// X of the first node
    pub origin_x: f64,
    /// Y of the first node
    pub origin_y: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            spacing_x: 350.0,
            spacing_y: 300.0,
            origin_x: 50.0,
            origin_y: 50.0,
        }
    }
}

/// Designer configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignerConfig {
    pub grid: GridConfig,

    /// Directory for file-backed layout persistence.
    /// Example: ./.joinery
    pub storage_dir: Option<PathBuf>,

    /// Prefix of the per-connection layout key
    pub storage_prefix: String,

    /// Reject connections between columns of incompatible types instead of warning
    pub strict_type_check: bool,
}

impl DesignerConfig {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` before this to load from `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    /// Unset or unparsable values use defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GridConfig::default();
        let number = |key: &str, default: f64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(default)
        };

        Self {
            grid: GridConfig {
                spacing_x: number("JOINERY_GRID_SPACING_X", defaults.spacing_x),
                spacing_y: number("JOINERY_GRID_SPACING_Y", defaults.spacing_y),
                origin_x: number("JOINERY_GRID_ORIGIN_X", defaults.origin_x),
                origin_y: number("JOINERY_GRID_ORIGIN_Y", defaults.origin_y),
            },
            storage_dir: lookup("JOINERY_STORAGE_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            storage_prefix: lookup("JOINERY_STORAGE_PREFIX")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_STORAGE_PREFIX.to_string()),
            strict_type_check: lookup("JOINERY_STRICT_TYPES")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    /// Check if file-backed storage is configured
    pub fn has_storage_dir(&self) -> bool {
        self.storage_dir.is_some()
    }

    /// Storage key for the layout of one connection
    pub fn layout_key(&self, connection_id: &str) -> String {
        format!("{}{}", self.storage_prefix, connection_id)
    }
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            storage_dir: None,
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_string(),
            strict_type_check: false,
        }
    }
}
