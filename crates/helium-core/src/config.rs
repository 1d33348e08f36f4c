//! `helium.toml` configuration.
//!
//! Controls which stages of the pipeline the command-line tool reports.
//! The file is optional; a missing file means every stage is enabled.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the configuration file looked up next to a source file.
pub const CONFIG_FILE_NAME: &str = "helium.toml";

/// Configuration file structure for helium.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
}

/// The `[output]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Dump the raw token stream
    pub tokens: bool,
    /// Print the parsed tree
    pub ast: bool,
    /// Execute the program
    pub evaluate: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            tokens: true,
            ast: true,
            evaluate: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Config {
    /// Load configuration from an explicit path. The file must exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `helium.toml` from the directory holding `source_file`, falling
    /// back to defaults when there is none.
    pub fn for_source(source_file: &Path) -> Result<Self, ConfigError> {
        let dir = source_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let path = dir.join(CONFIG_FILE_NAME);

        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}
