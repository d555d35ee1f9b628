//! API 层配置
//!
//! `RunConfig` composes the config crate's pieces into what one run needs.
//! A JSON file carries the hook options at the top level:
//!
//! ```json
//! { "log_file": "/var/log/caught.log", "include": "backend", "exclude": ["vendor"],
//!   "restrict_to_packages": false, "search_path": ["lib"],
//!   "limits": { "max_recursion_depth": 512 } }
//! ```

use crate::error::SnitchError;
use serde::Deserialize;
use snitch_config::{HookConfig, LimitConfig};
use snitch_vfs::VirtualFileSystem;
use std::path::{Path, PathBuf};

/// Execution configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Directories searched for top-level modules, after the entry's own
    pub search_path: Vec<PathBuf>,
    /// Execution limits
    pub limits: LimitConfig,
    /// Exception-logging hook
    #[serde(flatten)]
    pub hook: HookConfig,
}

impl RunConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Load a JSON config file.
    pub fn load(vfs: &dyn VirtualFileSystem, path: &Path) -> Result<Self, SnitchError> {
        let bytes = vfs.read_file(path).map_err(|source| SnitchError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| SnitchError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
