//! User configuration, read from `<config_dir>/config.toml`.
//!
//! ```toml
//! restore_session = true
//! data_dirs = ["/home/me/kidshell-words"]
//! exit_words = ["bye", "quit", ":q!"]
//!
//! [evaluator]
//! max_allocations = 10000
//! max_duration_ms = 1000
//! max_memory_bytes = 1048576
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::paths;
use crate::safe_math::EvaluatorLimits;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KidshellConfig {
    /// Pick up the last session on startup.
    pub restore_session: bool,

    /// Custom-data directories, merged in order. Empty means the defaults.
    pub data_dirs: Vec<PathBuf>,

    pub evaluator: EvaluatorLimits,

    /// Lines that save and leave the REPL.
    pub exit_words: Vec<String>,
}

impl Default for KidshellConfig {
    fn default() -> Self {
        Self {
            restore_session: true,
            data_dirs: Vec::new(),
            evaluator: EvaluatorLimits::default(),
            exit_words: vec!["bye".into(), "quit".into(), ":q!".into()],
        }
    }
}

impl KidshellConfig {
    /// Load from the default location; a missing file means defaults.
    pub fn load() -> Result<Self> {
        let path = paths::config_path();

        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Configured data directories, or the defaults when none are set.
    pub fn data_dirs(&self) -> Vec<PathBuf> {
        if self.data_dirs.is_empty() {
            paths::default_data_dirs()
        } else {
            self.data_dirs.clone()
        }
    }

    pub fn is_exit_word(&self, line: &str) -> bool {
        self.exit_words.iter().any(|word| word == line)
    }
}
