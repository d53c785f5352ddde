//! The fixed set of mounted stores.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use mixedfs_core_store::{join, Error, Result, SplitPath, StoreHandle};

use crate::config::MountSpec;
use crate::registry::StoreFactory;

/// Kind reported for stores mounted from a ready-made handle.
pub const CUSTOM_KIND: &str = "custom";

/// Information about a mount point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountInfo {
    pub prefix: String,
    pub kind: String,
}

/// A store bound to a top-level prefix.
#[derive(Clone)]
pub struct MountEntry {
    prefix: String,
    kind: String,
    backend: StoreHandle,
    strip_prefix: bool,
}

impl MountEntry {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn backend(&self) -> &StoreHandle {
        &self.backend
    }

    pub fn info(&self) -> MountInfo {
        MountInfo {
            prefix: self.prefix.clone(),
            kind: self.kind.clone(),
        }
    }

    /// The path this entry's store sees for `split`.
    pub fn backend_path(&self, split: &SplitPath) -> String {
        if self.strip_prefix {
            split.remainder.clone()
        } else {
            split.normalized.clone()
        }
    }

    /// The dispatcher path for a path this entry's store reported.
    pub fn virtual_path(&self, backend_path: &str) -> String {
        if self.strip_prefix {
            join(&self.prefix, backend_path)
        } else {
            backend_path.to_string()
        }
    }
}

impl fmt::Debug for MountEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountEntry")
            .field("prefix", &self.prefix)
            .field("kind", &self.kind)
            .field("strip_prefix", &self.strip_prefix)
            .finish_non_exhaustive()
    }
}

/// Ordered, immutable prefix to store bindings.
///
/// Prefixes are unique, non-empty, and contain no `/`. Every store is built
/// when the table is; nothing is constructed on first use.
#[derive(Debug, Clone, Default)]
pub struct MountTable {
    entries: Vec<MountEntry>,
}

impl MountTable {
    /// Build every store named in `specs`, in order.
    ///
    /// Prefixes and kinds are all checked before the first store is
    /// constructed, so a rejected table builds nothing. Store construction
    /// errors are returned as the store reported them.
    pub fn build(specs: &[MountSpec], factory: &dyn StoreFactory) -> Result<Self> {
        validate_prefixes(specs.iter().map(|spec| spec.prefix.as_str()))?;
        if let Some(spec) = specs.iter().find(|spec| !factory.knows(&spec.kind)) {
            return Err(Error::configuration(format!(
                "unknown store kind '{}' for mount '{}'",
                spec.kind, spec.prefix
            )));
        }

        let mut entries = Vec::with_capacity(specs.len());
        for spec in specs {
            let backend = factory.create(&spec.kind, &spec.config)?;
            tracing::info!(prefix = %spec.prefix, kind = %spec.kind, "mounted store");
            entries.push(MountEntry {
                prefix: spec.prefix.clone(),
                kind: spec.kind.clone(),
                backend,
                strip_prefix: spec.strip_prefix,
            });
        }
        Ok(Self { entries })
    }

    /// Mount already-built stores. They receive paths relative to their
    /// mount point.
    pub fn from_backends<I, P>(backends: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, StoreHandle)>,
        P: Into<String>,
    {
        let backends: Vec<(String, StoreHandle)> = backends
            .into_iter()
            .map(|(prefix, backend)| (prefix.into(), backend))
            .collect();
        validate_prefixes(backends.iter().map(|(prefix, _)| prefix.as_str()))?;

        let entries = backends
            .into_iter()
            .map(|(prefix, backend)| {
                tracing::info!(prefix = %prefix, kind = CUSTOM_KIND, "mounted store");
                MountEntry {
                    prefix,
                    kind: CUSTOM_KIND.to_string(),
                    backend,
                    strip_prefix: true,
                }
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn get(&self, prefix: &str) -> Option<&MountEntry> {
        self.entries.iter().find(|entry| entry.prefix == prefix)
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.get(prefix).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MountEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn infos(&self) -> Vec<MountInfo> {
        self.entries.iter().map(MountEntry::info).collect()
    }
}

fn validate_prefixes<'a>(prefixes: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for prefix in prefixes {
        if prefix.is_empty() {
            return Err(Error::configuration("mount prefix must not be empty"));
        }
        if prefix.contains('/') {
            return Err(Error::configuration(format!(
                "mount prefix '{}' must not contain '/'",
                prefix
            )));
        }
        if !seen.insert(prefix) {
            return Err(Error::configuration(format!(
                "duplicate mount prefix '{}'",
                prefix
            )));
        }
    }
    Ok(())
}
