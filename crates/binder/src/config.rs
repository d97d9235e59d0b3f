//! # Configuration
//!
//! Binder configuration is managed by [`confique`], layering an optional
//! `binder.toml` in the project directory over compiled defaults.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `compact_warn_threshold` | `50` | Compaction warns when it would rename more files than this |
//! | `lock_file` | `.binder.lock` | Advisory lock file, relative to the project directory |
//! | `reservations_file` | `.binder-sids.json` | Reserved stable ids, relative to the project directory |
//! | `sid_length` | `10` | Length of newly generated stable ids (8-12) |

use crate::error::{BinderError, Result};
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "binder.toml";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BinderConfig {
    /// Compaction renaming more files than this is flagged for review.
    #[config(default = 50)]
    pub compact_warn_threshold: usize,

    #[config(default = ".binder.lock")]
    pub lock_file: String,

    #[config(default = ".binder-sids.json")]
    pub reservations_file: String,

    /// Length of generated stable ids, clamped to 8..=12.
    #[config(default = 10)]
    pub sid_length: usize,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            compact_warn_threshold: 50,
            lock_file: ".binder.lock".to_string(),
            reservations_file: ".binder-sids.json".to_string(),
            sid_length: 10,
        }
    }
}

impl BinderConfig {
    /// Loads `<project_dir>/binder.toml` over the defaults.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(CONFIG_FILE);
        BinderConfig::builder()
            .file(&path)
            .load()
            .map_err(|e| BinderError::Config(e.to_string()))
    }
}
