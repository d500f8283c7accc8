//! Configuration management for fparse.
//!
//! This module provides the [`Config`] struct which controls parsing
//! behavior. Configuration can be loaded from:
//! - TOML files (`fparse.toml`)
//! - CLI arguments (which override file settings)
//!
//! Config files are auto-discovered by searching parent directories from
//! the file being parsed up to the filesystem root, plus the user's home
//! directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::source::Dialect;

/// Config file name to search for.
const CONFIG_FILE_NAME: &str = "fparse.toml";

/// Get the user's home directory
fn dirs_home() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home));
    }
    if let Ok(userprofile) = std::env::var("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }
    None
}

// Serde default functions
fn default_max_nesting_depth() -> usize {
    200
}
fn default_fixed_extensions() -> Vec<String> {
    ["f", "for", "ftn", "f77"].map(str::to_string).to_vec()
}
fn default_free_extensions() -> Vec<String> {
    ["f90", "f95", "f03", "f08"].map(str::to_string).to_vec()
}
fn default_signature_extensions() -> Vec<String> {
    vec!["pyf".to_string()]
}

/// Main configuration struct for fparse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum block nesting depth before the parse is aborted
    /// (default: 200)
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,

    /// Force a dialect for all inputs instead of guessing from the file
    /// extension (`fixed77`, `fixed90`, `free90`, `signature`)
    #[serde(default)]
    pub dialect: Option<String>,

    /// Treat fixed-form files as Fortran 90 fixed form instead of
    /// FORTRAN 77 (default: false)
    #[serde(default)]
    pub fixed_is_f90: bool,

    /// Extensions parsed as fixed form
    #[serde(default = "default_fixed_extensions")]
    pub fixed_extensions: Vec<String>,

    /// Extensions parsed as free form
    #[serde(default = "default_free_extensions")]
    pub free_extensions: Vec<String>,

    /// Extensions parsed as signature files
    #[serde(default = "default_signature_extensions")]
    pub signature_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_nesting_depth: default_max_nesting_depth(),
            dialect: None,
            fixed_is_f90: false,
            fixed_extensions: default_fixed_extensions(),
            free_extensions: default_free_extensions(),
            signature_extensions: default_signature_extensions(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Discover a config file for `start`: each parent directory up to the
    /// root, then the home directory. The nearest file wins.
    #[must_use]
    pub fn discover(start: &Path) -> Option<PathBuf> {
        let mut dir = if start.is_dir() {
            Some(start)
        } else {
            start.parent()
        };
        while let Some(d) = dir {
            let candidate = d.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            dir = d.parent();
        }
        let home = dirs_home()?.join(CONFIG_FILE_NAME);
        home.is_file().then_some(home)
    }

    /// The dialect used for `path`, honoring the forced dialect and the
    /// extension tables.
    #[must_use]
    pub fn dialect_for_path(&self, path: &Path) -> Option<Dialect> {
        if let Some(name) = &self.dialect {
            if let Ok(d) = name.parse() {
                return Some(d);
            }
        }
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if self.fixed_extensions.contains(&ext) {
            return Some(if self.fixed_is_f90 {
                Dialect::Fixed90
            } else {
                Dialect::Fixed77
            });
        }
        if self.free_extensions.contains(&ext) {
            return Some(Dialect::Free90);
        }
        if self.signature_extensions.contains(&ext) {
            return Some(Dialect::Signature);
        }
        None
    }

    /// Whether `path` has an extension this config will parse.
    #[must_use]
    pub fn handles_path(&self, path: &Path) -> bool {
        self.dialect_for_path(path).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_nesting_depth, 200);
        assert!(config.dialect.is_none());
        assert!(config.fixed_extensions.contains(&"f".to_string()));
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str("max_nesting_depth = 32\n").unwrap();
        assert_eq!(config.max_nesting_depth, 32);
        assert!(config.free_extensions.contains(&"f90".to_string()));
    }

    #[test]
    fn test_dialect_for_path() {
        let config = Config::default();
        assert_eq!(
            config.dialect_for_path(Path::new("a.f90")),
            Some(Dialect::Free90)
        );
        assert_eq!(
            config.dialect_for_path(Path::new("a.f")),
            Some(Dialect::Fixed77)
        );
        assert_eq!(
            config.dialect_for_path(Path::new("a.pyf")),
            Some(Dialect::Signature)
        );
        assert_eq!(config.dialect_for_path(Path::new("a.c")), None);

        let fixed90 = Config {
            fixed_is_f90: true,
            ..Config::default()
        };
        assert_eq!(
            fixed90.dialect_for_path(Path::new("a.f")),
            Some(Dialect::Fixed90)
        );

        let forced = Config {
            dialect: Some("free90".into()),
            ..Config::default()
        };
        assert_eq!(
            forced.dialect_for_path(Path::new("a.f")),
            Some(Dialect::Free90)
        );
    }
}
