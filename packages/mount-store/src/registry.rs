//! Store construction by kind name.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use mixedfs_client_store::{ClientSideConfig, ClientSideStore};
use mixedfs_core_store::{Error, Result, StoreHandle};
use mixedfs_local_store::{InMemoryConfig, InMemoryStore, LocalDiskConfig, LocalDiskStore};

/// Builds a store from its mount settings.
pub type StoreConstructor = Box<dyn Fn(&Value) -> Result<StoreHandle> + Send + Sync>;

/// A factory for creating stores from mount configurations.
pub trait StoreFactory: Send + Sync {
    /// Can this factory build stores of `kind`?
    fn knows(&self, kind: &str) -> bool;

    fn create(&self, kind: &str, config: &Value) -> Result<StoreHandle>;
}

/// A [`StoreFactory`] backed by a map from kind name to constructor.
///
/// ```rust
/// use std::sync::Arc;
/// use mixedfs_local_store::InMemoryStore;
/// use mixedfs_mount_store::{StoreFactory, StoreRegistry};
///
/// let mut registry = StoreRegistry::with_defaults();
/// registry.register("scratch", |_config| Ok(Arc::new(InMemoryStore::new())));
/// assert!(registry.knows("scratch"));
/// assert!(registry.knows("local"));
/// ```
#[derive(Default)]
pub struct StoreRegistry {
    constructors: BTreeMap<String, StoreConstructor>,
}

impl StoreRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in kinds: `local`, `memory` and `clientside`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register("local", |config| {
                let config: LocalDiskConfig = parse_config("local", config)?;
                Ok(Arc::new(LocalDiskStore::from_config(&config)?))
            })
            .register("memory", |config| {
                let config: InMemoryConfig = parse_config("memory", config)?;
                Ok(Arc::new(InMemoryStore::from_config(&config)?))
            })
            .register("clientside", |config| {
                let config: ClientSideConfig = parse_config("clientside", config)?;
                Ok(Arc::new(ClientSideStore::from_config(&config)))
            });
        registry
    }

    /// Register (or replace) the constructor for `kind`.
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&Value) -> Result<StoreHandle> + Send + Sync + 'static,
    {
        self.constructors.insert(kind.into(), Box::new(constructor));
        self
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

impl fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("kinds", &self.kinds().collect::<Vec<_>>())
            .finish()
    }
}

impl StoreFactory for StoreRegistry {
    fn knows(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    fn create(&self, kind: &str, config: &Value) -> Result<StoreHandle> {
        let constructor = self
            .constructors
            .get(kind)
            .ok_or_else(|| Error::configuration(format!("unknown store kind '{}'", kind)))?;
        constructor(config)
    }
}

/// Decode a store's typed settings; `null` means defaults.
pub fn parse_config<T: DeserializeOwned + Default>(kind: &str, config: &Value) -> Result<T> {
    if config.is_null() {
        return Ok(T::default());
    }
    T::deserialize(config).map_err(|e| {
        Error::configuration(format!("invalid configuration for '{}' store: {}", kind, e))
    })
}
