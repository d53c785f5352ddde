//! Path-routed contents store.
//!
//! The first component of every path picks a mounted store; the rest of the
//! path is handed to that store. The empty path is a virtual root whose only
//! children are the mount points:
//!
//! ```text
//! ""                     virtual root, answered here
//! "local"                mount point, forwarded as "" (dir_exists answered here)
//! "local/notes/a.ipynb"  forwarded to the `local` store as "notes/a.ipynb"
//! "nowhere/a.txt"        not mounted: rejected as unsupported
//! ```
//!
//! Results and errors from mounted stores are returned untouched unless the
//! dispatcher reports virtual paths, in which case returned models (and the
//! entries of directory listings) get their mount prefix back. Moving or
//! copying between two mounts is refused with [`Error::CrossMount`] before
//! either store is called.

use std::fmt;

use mixedfs_core_store::{
    normalize, split, Checkpoint, CheckpointId, ContentsManager, Error, Format, GetOptions, Model,
    ModelKind, Result,
};

use crate::config::MixedConfig;
use crate::mount_table::{MountEntry, MountInfo, MountTable};
use crate::registry::StoreFactory;

/// The contents operations the dispatcher routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    DirExists,
    IsHidden,
    FileExists,
    Exists,
    Get,
    Save,
    Update,
    Delete,
    Rename,
    Copy,
    NewUntitled,
    CreateCheckpoint,
    ListCheckpoints,
    RestoreCheckpoint,
    DeleteCheckpoint,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::DirExists => "dir_exists",
            Operation::IsHidden => "is_hidden",
            Operation::FileExists => "file_exists",
            Operation::Exists => "exists",
            Operation::Get => "get",
            Operation::Save => "save",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Rename => "rename",
            Operation::Copy => "copy",
            Operation::NewUntitled => "new_untitled",
            Operation::CreateCheckpoint => "create_checkpoint",
            Operation::ListCheckpoints => "list_checkpoints",
            Operation::RestoreCheckpoint => "restore_checkpoint",
            Operation::DeleteCheckpoint => "delete_checkpoint",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a path lands.
#[derive(Debug, Clone)]
pub enum Route<'a> {
    /// The virtual root.
    Root,
    /// Inside (or at) a mount point.
    Mount {
        entry: &'a MountEntry,
        /// Path to hand to the mounted store.
        path: String,
        /// The path names the mount point itself.
        at_mount_point: bool,
    },
    /// First component names no mount.
    Unmounted {
        /// The whole normalized path.
        path: String,
    },
}

impl<'a> Route<'a> {
    /// The mount this route lands in, if any.
    pub fn entry(&self) -> Option<&'a MountEntry> {
        match self {
            Route::Mount { entry, .. } => Some(*entry),
            _ => None,
        }
    }

    /// Normalized path for error messages on non-mounted routes.
    fn virtual_path(&self) -> &str {
        match self {
            Route::Root => "",
            Route::Mount { path, .. } | Route::Unmounted { path } => path.as_str(),
        }
    }
}

/// A [`ContentsManager`] that routes each call to the store mounted at the
/// path's first component.
///
/// The mount table is fixed at construction, so the dispatcher holds no
/// mutable state and can be shared across threads freely.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use mixedfs_core_store::{ContentsManager, Error, GetOptions, Model, StoreHandle};
/// use mixedfs_local_store::InMemoryStore;
/// use mixedfs_mount_store::{MountStore, MountTable};
///
/// let a: StoreHandle = Arc::new(InMemoryStore::new());
/// let b: StoreHandle = Arc::new(InMemoryStore::new());
/// let store = MountStore::new(MountTable::from_backends(vec![("a", a.clone()), ("b", b)]).unwrap());
///
/// store.save(Model::file("x.txt").with_text("hi"), "a/x.txt").unwrap();
/// assert!(a.file_exists("x.txt").unwrap());
///
/// assert!(store.dir_exists("").unwrap());
/// assert!(matches!(store.rename("a/x.txt", "b/x.txt"), Err(Error::CrossMount { .. })));
/// ```
#[derive(Debug)]
pub struct MountStore {
    table: MountTable,
    list_mounts_at_root: bool,
    virtual_paths: bool,
}

impl MountStore {
    pub fn new(table: MountTable) -> Self {
        Self {
            table,
            list_mounts_at_root: false,
            virtual_paths: false,
        }
    }

    /// Build every configured store through `factory`.
    pub fn from_config(config: &MixedConfig, factory: &dyn StoreFactory) -> Result<Self> {
        let table = MountTable::build(&config.mounts, factory)?;
        Ok(Self::new(table)
            .list_mounts_at_root(config.list_mounts_at_root)
            .virtual_paths(config.virtual_paths))
    }

    /// List the mount points as the root directory's content.
    pub fn list_mounts_at_root(mut self, enabled: bool) -> Self {
        self.list_mounts_at_root = enabled;
        self
    }

    /// Return model paths as dispatcher paths, so a fetched model can be
    /// handed straight back to `save` or `update`.
    pub fn virtual_paths(mut self, enabled: bool) -> Self {
        self.virtual_paths = enabled;
        self
    }

    pub fn table(&self) -> &MountTable {
        &self.table
    }

    pub fn mounts(&self) -> Vec<MountInfo> {
        self.table.infos()
    }

    /// Work out which store (if any) handles `path`.
    pub fn resolve(&self, path: &str) -> Route<'_> {
        let split = split(path);
        if split.is_root() {
            return Route::Root;
        }
        match self.table.get(&split.prefix) {
            Some(entry) => Route::Mount {
                entry,
                path: entry.backend_path(&split),
                at_mount_point: split.is_top_level(),
            },
            None => Route::Unmounted {
                path: split.normalized,
            },
        }
    }

    /// Run `call` against the store `route` lands in, or `virtual_root` when
    /// it lands in no store.
    fn dispatch<T>(
        &self,
        operation: Operation,
        route: Route<'_>,
        virtual_root: impl FnOnce(&Route<'_>) -> Result<T>,
        call: impl FnOnce(&dyn ContentsManager, &str) -> Result<T>,
    ) -> Result<T> {
        match route {
            Route::Mount { entry, path, .. } => {
                tracing::debug!(
                    operation = %operation,
                    prefix = entry.prefix(),
                    path = %path,
                    "dispatching to mounted store"
                );
                call(entry.backend().as_ref(), &path)
            }
            route => virtual_root(&route),
        }
    }

    /// Forward a single-path operation; the root and unmounted paths reject it.
    fn forward<T>(
        &self,
        operation: Operation,
        path: &str,
        call: impl FnOnce(&dyn ContentsManager, &str) -> Result<T>,
    ) -> Result<T> {
        self.dispatch(
            operation,
            self.resolve(path),
            |route| Err(unsupported(operation, route)),
            call,
        )
    }

    /// Resolve both paths of a two-path operation to one mount.
    fn resolve_pair(
        &self,
        operation: Operation,
        from: &str,
        to: &str,
    ) -> Result<(&MountEntry, String, String)> {
        match (self.resolve(from), self.resolve(to)) {
            (
                Route::Mount {
                    entry: from_entry,
                    path: from_path,
                    ..
                },
                Route::Mount {
                    entry: to_entry,
                    path: to_path,
                    ..
                },
            ) if from_entry.prefix() == to_entry.prefix() => {
                tracing::debug!(
                    operation = %operation,
                    prefix = from_entry.prefix(),
                    from = %from_path,
                    to = %to_path,
                    "dispatching to mounted store"
                );
                Ok((from_entry, from_path, to_path))
            }
            (Route::Mount { .. }, _) | (_, Route::Mount { .. }) => {
                let (from, to) = (normalize(from), normalize(to));
                tracing::debug!(operation = %operation, from, to, "rejected cross-mount operation");
                Err(Error::cross_mount(from, to))
            }
            (from_route, _) => Err(unsupported(operation, &from_route)),
        }
    }

    /// Rewrite a model returned by `entry`'s store into dispatcher paths,
    /// when enabled. Listing entries are rewritten too.
    fn to_virtual(&self, entry: Option<&MountEntry>, mut model: Model) -> Result<Model> {
        let entry = match entry {
            Some(entry) if self.virtual_paths => entry,
            _ => return Ok(model),
        };
        model.set_path(entry.virtual_path(&model.path));
        if model.is_directory() {
            if let Some(content) = model.content.take() {
                let mut children: Vec<Model> = serde_json::from_value(content)?;
                for child in &mut children {
                    child.set_path(entry.virtual_path(&child.path));
                }
                model.content = Some(serde_json::to_value(children)?);
            }
        }
        Ok(model)
    }

    fn root_model(&self, options: &GetOptions) -> Result<Model> {
        let model = Model::directory("");
        if !(self.list_mounts_at_root && options.content) {
            return Ok(model);
        }
        let children: Vec<Model> = self
            .table
            .iter()
            .map(|entry| Model::directory(entry.prefix()))
            .collect();
        Ok(model.with_content(serde_json::to_value(children)?, Format::Json))
    }
}

fn unsupported(operation: Operation, route: &Route<'_>) -> Error {
    let path = route.virtual_path();
    tracing::debug!(operation = %operation, path, "rejected operation outside any mount");
    Error::unsupported(operation, path)
}

impl ContentsManager for MountStore {
    fn dir_exists(&self, path: &str) -> Result<bool> {
        match self.resolve(path) {
            Route::Mount {
                at_mount_point: true,
                ..
            } => Ok(true),
            route => self.dispatch(
                Operation::DirExists,
                route,
                |route| Ok(matches!(route, Route::Root)),
                |store, path| store.dir_exists(path),
            ),
        }
    }

    fn is_hidden(&self, path: &str) -> Result<bool> {
        match self.resolve(path) {
            Route::Mount {
                at_mount_point: true,
                ..
            } => Ok(false),
            route => self.dispatch(
                Operation::IsHidden,
                route,
                |route| match route {
                    Route::Root => Ok(false),
                    route => Err(unsupported(Operation::IsHidden, route)),
                },
                |store, path| store.is_hidden(path),
            ),
        }
    }

    fn file_exists(&self, path: &str) -> Result<bool> {
        self.dispatch(
            Operation::FileExists,
            self.resolve(path),
            |route| match route {
                Route::Root => Ok(false),
                route => Err(unsupported(Operation::FileExists, route)),
            },
            |store, path| store.file_exists(path),
        )
    }

    fn exists(&self, path: &str) -> Result<bool> {
        self.dispatch(
            Operation::Exists,
            self.resolve(path),
            |route| match route {
                Route::Root => Ok(true),
                route => Err(unsupported(Operation::Exists, route)),
            },
            |store, path| store.exists(path),
        )
    }

    fn get(&self, path: &str, options: &GetOptions) -> Result<Model> {
        let route = self.resolve(path);
        let entry = route.entry();
        let model = self.dispatch(
            Operation::Get,
            route,
            |route| match route {
                Route::Root => self.root_model(options),
                route => Err(unsupported(Operation::Get, route)),
            },
            |store, path| store.get(path, options),
        )?;
        self.to_virtual(entry, model)
    }

    fn save(&self, model: Model, path: &str) -> Result<Model> {
        let entry = self.resolve(path).entry();
        let saved = self.forward(Operation::Save, path, |store, path| store.save(model, path))?;
        self.to_virtual(entry, saved)
    }

    /// Both `path` and a non-empty `model.path` must land in the same mount.
    /// The model is forwarded with its path made relative to that mount.
    fn update(&self, mut model: Model, path: &str) -> Result<Model> {
        if normalize(&model.path).is_empty() {
            let entry = self.resolve(path).entry();
            let updated = self.forward(Operation::Update, path, |store, path| {
                store.update(model, path)
            })?;
            return self.to_virtual(entry, updated);
        }

        let target = model.path.clone();
        let (entry, path, target) = self.resolve_pair(Operation::Update, path, &target)?;
        model.set_path(target);
        let updated = entry.backend().update(model, &path)?;
        self.to_virtual(Some(entry), updated)
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.forward(Operation::Delete, path, |store, path| store.delete(path))
    }

    fn rename(&self, old_path: &str, new_path: &str) -> Result<()> {
        let (entry, old_path, new_path) =
            self.resolve_pair(Operation::Rename, old_path, new_path)?;
        entry.backend().rename(&old_path, &new_path)
    }

    fn create_checkpoint(&self, path: &str) -> Result<Checkpoint> {
        self.forward(Operation::CreateCheckpoint, path, |store, path| {
            store.create_checkpoint(path)
        })
    }

    fn list_checkpoints(&self, path: &str) -> Result<Vec<Checkpoint>> {
        self.forward(Operation::ListCheckpoints, path, |store, path| {
            store.list_checkpoints(path)
        })
    }

    fn restore_checkpoint(&self, id: &CheckpointId, path: &str) -> Result<()> {
        self.forward(Operation::RestoreCheckpoint, path, |store, path| {
            store.restore_checkpoint(id, path)
        })
    }

    fn delete_checkpoint(&self, id: &CheckpointId, path: &str) -> Result<()> {
        self.forward(Operation::DeleteCheckpoint, path, |store, path| {
            store.delete_checkpoint(id, path)
        })
    }

    fn copy(&self, from_path: &str, to_path: &str) -> Result<Model> {
        let (entry, from_path, to_path) = self.resolve_pair(Operation::Copy, from_path, to_path)?;
        let copied = entry.backend().copy(&from_path, &to_path)?;
        self.to_virtual(Some(entry), copied)
    }

    fn new_untitled(&self, path: &str, kind: ModelKind, ext: &str) -> Result<Model> {
        let entry = self.resolve(path).entry();
        let created = self.forward(Operation::NewUntitled, path, |store, path| {
            store.new_untitled(path, kind, ext)
        })?;
        self.to_virtual(entry, created)
    }
}
