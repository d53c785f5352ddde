//! Mount configuration.
//!
//! A configuration is an ordered list of mounts plus dispatcher options,
//! read from JSON:
//!
//! ```json
//! {
//!   "mounts": [
//!     {"prefix": "local", "kind": "local", "config": {"root_dir": "/srv/notebooks"}},
//!     {"prefix": "gdrive", "kind": "clientside"}
//!   ],
//!   "list_mounts_at_root": true,
//!   "virtual_paths": true
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use mixedfs_core_store::{Error, Result};

/// One mount: which store kind to build, its settings, and where it lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountSpec {
    /// Top-level path component the store is mounted under.
    pub prefix: String,
    /// Store kind, as registered with the store registry.
    pub kind: String,
    /// Store-specific settings; `null` means the store's defaults.
    #[serde(default)]
    pub config: Value,
    /// Hand the store paths relative to the mount point. When false the store
    /// receives the full path, prefix included.
    #[serde(default = "default_strip_prefix")]
    pub strip_prefix: bool,
}

fn default_strip_prefix() -> bool {
    true
}

impl MountSpec {
    pub fn new(prefix: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            kind: kind.into(),
            config: Value::Null,
            strip_prefix: true,
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    pub fn strip_prefix(mut self, strip: bool) -> Self {
        self.strip_prefix = strip;
        self
    }
}

/// Everything needed to build a [`MountStore`](crate::MountStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixedConfig {
    pub mounts: Vec<MountSpec>,
    /// Include one directory entry per mount in the root listing.
    #[serde(default)]
    pub list_mounts_at_root: bool,
    /// Report returned model paths (and directory listing entries) as
    /// dispatcher paths, mount prefix included.
    #[serde(default)]
    pub virtual_paths: bool,
}

impl Default for MixedConfig {
    /// The working directory under `local`, client-side Drive under `gdrive`.
    fn default() -> Self {
        Self {
            mounts: vec![
                MountSpec::new("local", "local").with_config(json!({"root_dir": "."})),
                MountSpec::new("gdrive", "clientside"),
            ],
            list_mounts_at_root: false,
            virtual_paths: false,
        }
    }
}

impl MixedConfig {
    pub fn from_json_str(source: &str) -> Result<Self> {
        serde_json::from_str(source)
            .map_err(|e| Error::configuration(format!("invalid mount configuration: {}", e)))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading mount configuration from {}...", path.display());
        let source = fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!(
                "cannot read mount configuration '{}': {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&source).map_err(|e| {
            Error::configuration(format!(
                "invalid mount configuration '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
