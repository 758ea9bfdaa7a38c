//! Highlighter configuration.
//!
//! ## Learning: Serde for Serialization
//!
//! `#[derive(Serialize, Deserialize)]` generates the TOML mapping, and
//! `#[serde(default)]` fills missing fields from `Default::default()`, so a
//! config file only needs the keys it changes.

use linelex_syntax::{DirectorySource, LanguageOverride, Limits, Registry, Theme};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::CoreResult;

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Grammar lookup and engine limits
    pub syntax: SyntaxConfig,

    /// Display theme
    pub theme: ThemeConfig,

    /// Per-grammar overrides, keyed by grammar id
    pub languages: HashMap<String, LanguageOverride>,
}

impl Config {
    /// Loads config from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Using default config: {}", e);
                Self::default()
            }
        }
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("linelex").join("config.toml"))
    }

    /// Saves the config to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path()?)
    }

    /// Saves the config to `path`, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_include_depth: self.syntax.max_include_depth,
            max_zero_progress_steps: self.syntax.max_zero_progress_steps,
        }
    }

    /// Grammar directories in lookup order: configured paths, then
    /// `LINELEX_SYNTAX_PATH` and the user data dir, then the bundled set.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        let mut dirs = self.syntax.search_paths.clone();
        dirs.extend(DirectorySource::from_env().dirs().iter().cloned());
        dirs.push(bundled_syntax_dir());
        dirs
    }

    /// Builds a grammar registry from this configuration.
    pub fn registry(&self) -> Registry {
        Registry::new(DirectorySource::new(self.search_paths()))
            .with_limits(self.limits())
            .with_overrides(self.languages.clone())
    }

    /// Resolves the configured theme.
    pub fn theme(&self) -> CoreResult<Theme> {
        if let Some(path) = &self.theme.path {
            return Ok(Theme::load(path)?);
        }
        Ok(match self.theme.name.to_lowercase().as_str() {
            "light" => Theme::light(),
            "dark" => Theme::dark(),
            other => {
                tracing::warn!("Unknown theme '{}', using dark", other);
                Theme::dark()
            }
        })
    }
}

/// The shipped grammar set.
///
/// An installed binary finds it at `syntax/` next to the executable or at
/// `../share/linelex/syntax`; otherwise the source checkout's `syntax/`
/// is used.
pub fn bundled_syntax_dir() -> PathBuf {
    let exe = std::env::current_exe().ok();
    bundled_syntax_dir_for(exe.as_deref())
}

fn bundled_syntax_dir_for(exe: Option<&Path>) -> PathBuf {
    let installed = exe.and_then(Path::parent).and_then(|bin| {
        [bin.join("syntax"), bin.join("..").join("share").join("linelex").join("syntax")]
            .into_iter()
            .find(|dir| dir.is_dir())
    });
    match installed {
        Some(dir) => {
            tracing::debug!("Using installed grammars in {}", dir.display());
            dir
        }
        None => Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("syntax"),
    }
}

/// Grammar lookup configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntaxConfig {
    /// Extra directories holding `<id>.xml` grammars
    pub search_paths: Vec<PathBuf>,

    /// Grammar used when nothing else matches
    pub default_grammar: Option<String>,

    /// Maximum `IncludeRules` nesting
    pub max_include_depth: usize,

    /// Context switches allowed at one column before a char is forced
    pub max_zero_progress_steps: usize,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        let limits = Limits::default();
        Self {
            search_paths: Vec::new(),
            default_grammar: None,
            max_include_depth: limits.max_include_depth,
            max_zero_progress_steps: limits.max_zero_progress_steps,
        }
    }
}

/// Theme selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Built-in theme name (`dark` or `light`)
    pub name: String,

    /// JSON theme file; wins over `name`
    pub path: Option<PathBuf>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: "dark".to_string(),
            path: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
