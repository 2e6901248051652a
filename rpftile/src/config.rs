//! Map source configuration.
//!
//! `MapConfig` names the dataset directories to load, the pager window
//! size, and an optional initial scale. It can be assembled in code with
//! the builder methods or loaded from an INI file:
//!
//! ```ini
//! [map]
//! paths = /data/cadrg-west,/data/cadrg-east
//! window = 5
//! scale = 1:250K
//! ```

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

/// Default pager window edge (radius 2).
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or parsed as INI.
    #[error("failed to load config: {0}")]
    Load(#[from] ini::Error),

    /// The file parsed but its contents are unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for a [`crate::service::MapService`].
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Dataset directories, each containing an `A.TOC` and frame files.
    pub source_dirs: Vec<PathBuf>,

    /// Pager window edge length in tiles; must be odd and positive.
    pub window_size: usize,

    /// Initial scale label; nearest available level is used when absent.
    pub scale: Option<String>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            source_dirs: Vec::new(),
            window_size: DEFAULT_WINDOW_SIZE,
            scale: None,
        }
    }
}

impl MapConfig {
    /// Create a configuration with a single source directory.
    pub fn new(source_dir: PathBuf) -> Self {
        Self {
            source_dirs: vec![source_dir],
            ..Default::default()
        }
    }

    /// Add a source directory.
    pub fn with_source_dir(mut self, dir: PathBuf) -> Self {
        self.source_dirs.push(dir);
        self
    }

    /// Set the pager window size.
    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    /// Set the initial scale label.
    pub fn with_scale(mut self, scale: impl Into<String>) -> Self {
        self.scale = Some(scale.into());
        self
    }

    /// Load configuration from an INI file's `[map]` section.
    pub fn from_ini(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path)?;
        let section = ini
            .section(Some("map"))
            .ok_or_else(|| ConfigError::Invalid("missing [map] section".to_string()))?;

        let paths = section
            .get("paths")
            .ok_or_else(|| ConfigError::Invalid("missing paths key".to_string()))?;
        let source_dirs: Vec<PathBuf> = paths
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect();
        if source_dirs.is_empty() {
            return Err(ConfigError::Invalid("paths key is empty".to_string()));
        }

        let window_size = match section.get("window") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::Invalid(format!("bad window size: {raw}")))?,
            None => DEFAULT_WINDOW_SIZE,
        };

        Ok(Self {
            source_dirs,
            window_size,
            scale: section.get("scale").map(|s| s.trim().to_string()),
        })
    }
}
