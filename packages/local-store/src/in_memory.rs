//! In-memory contents store.
//!
//! Keeps every model in a flat map keyed by API path. Useful for scratch
//! mounts and tests.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use mixedfs_core_store::path::{self as api_path, normalize};
use mixedfs_core_store::{
    Checkpoint, CheckpointId, ContentsManager, Error, Format, GetOptions, Model, ModelKind,
    Result,
};

const STORE: &str = "memory";

/// Configuration for an [`InMemoryStore`] mount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryConfig {
    /// Text files to create at startup, keyed by path. Parent directories are
    /// created as needed.
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

#[derive(Default)]
struct State {
    /// Every node except the root, which always exists.
    nodes: BTreeMap<String, Model>,
    checkpoints: BTreeMap<String, Vec<(Checkpoint, Model)>>,
    next_checkpoint: u64,
}

impl State {
    fn is_dir(&self, path: &str) -> bool {
        path.is_empty() || self.nodes.get(path).is_some_and(Model::is_directory)
    }

    fn is_file(&self, path: &str) -> bool {
        self.nodes.get(path).is_some_and(|m| !m.is_directory())
    }

    /// Paths strictly below `path`.
    fn descendants(&self, path: &str) -> Vec<String> {
        let prefix = format!("{}/", path);
        self.nodes
            .keys()
            .filter(|k| path.is_empty() || k.starts_with(&prefix))
            .cloned()
            .collect()
    }

    fn children(&self, path: &str) -> Vec<Model> {
        self.nodes
            .iter()
            .filter(|(k, _)| api_path::parent(k) == path)
            .map(|(_, m)| m.clone().without_content())
            .collect()
    }

    /// Create missing directories along `path`. Fails on the first ancestor
    /// that is a file.
    fn mkdirs(&mut self, path: &str) -> Result<()> {
        let mut current = String::new();
        for component in path.split('/').filter(|c| !c.is_empty()) {
            current = api_path::join(&current, component);
            let node = self
                .nodes
                .entry(current.clone())
                .or_insert_with(|| Model::directory(current.as_str()));
            if !node.is_directory() {
                return Err(Error::already_exists(current));
            }
        }
        Ok(())
    }
}

/// A thread-safe store that keeps everything in memory.
///
/// # Example
///
/// ```rust
/// use mixedfs_local_store::InMemoryStore;
/// use mixedfs_core_store::{ContentsManager, GetOptions, Model};
///
/// let store = InMemoryStore::new();
/// store.save(Model::file("hello.txt").with_text("hi"), "hello.txt").unwrap();
///
/// let model = store.get("hello.txt", &GetOptions::default()).unwrap();
/// assert_eq!(model.text(), Some("hi"));
/// ```
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &InMemoryConfig) -> Result<Self> {
        let store = Self::new();
        {
            let mut state = store.write()?;
            for (path, text) in &config.files {
                let path = normalize(path);
                if path.is_empty() {
                    return Err(Error::configuration("memory store seed file has an empty path"));
                }
                state.mkdirs(api_path::parent(path)).map_err(|_| {
                    Error::configuration(format!(
                        "memory store seed file '{}' lies beneath another seed file",
                        path
                    ))
                })?;
                if state.is_dir(path) {
                    return Err(Error::configuration(format!(
                        "memory store seed file '{}' is also a directory",
                        path
                    )));
                }
                let mut model = Model::file(path).with_text(text.as_str());
                model.last_modified = Some(Utc::now());
                state.nodes.insert(path.to_string(), model);
            }
        }
        Ok(store)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| Error::backend(STORE, "read", "state lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| Error::backend(STORE, "write", "state lock poisoned"))
    }
}

impl ContentsManager for InMemoryStore {
    fn dir_exists(&self, path: &str) -> Result<bool> {
        Ok(self.read()?.is_dir(normalize(path)))
    }

    fn is_hidden(&self, path: &str) -> Result<bool> {
        Ok(normalize(path).split('/').any(|c| c.starts_with('.')))
    }

    fn file_exists(&self, path: &str) -> Result<bool> {
        Ok(self.read()?.is_file(normalize(path)))
    }

    fn get(&self, path: &str, options: &GetOptions) -> Result<Model> {
        let path = normalize(path);
        let state = self.read()?;

        if state.is_dir(path) {
            if options.kind.is_some_and(|k| k != ModelKind::Directory) {
                return Err(Error::invalid_path(path, "is a directory"));
            }
            let model = state
                .nodes
                .get(path)
                .cloned()
                .unwrap_or_else(|| Model::directory(""));
            if !options.content {
                return Ok(model);
            }
            let children = serde_json::to_value(state.children(path))?;
            return Ok(model.with_content(children, Format::Json));
        }

        let model = state
            .nodes
            .get(path)
            .cloned()
            .ok_or_else(|| Error::not_found(path))?;
        if options.kind == Some(ModelKind::Directory) {
            return Err(Error::invalid_path(path, "not a directory"));
        }
        Ok(if options.content {
            model
        } else {
            model.without_content()
        })
    }

    fn save(&self, model: Model, path: &str) -> Result<Model> {
        let path = normalize(path);
        if path.is_empty() {
            return Err(Error::invalid_path(path, "cannot save over the store root"));
        }

        let mut state = self.write()?;
        let parent = api_path::parent(path);
        if !state.is_dir(parent) {
            return Err(Error::not_found(parent));
        }
        match (model.is_directory(), state.nodes.get(path)) {
            (false, Some(existing)) if existing.is_directory() => {
                return Err(Error::invalid_path(path, "is a directory"));
            }
            (true, Some(existing)) if !existing.is_directory() => {
                return Err(Error::already_exists(path));
            }
            _ => {}
        }
        if !model.is_directory() && model.content.is_none() {
            return Err(Error::invalid_path(path, "no content provided"));
        }

        let mut model = model.with_path(path);
        if model.is_directory() {
            model.content = None;
            model.format = None;
        }
        model.last_modified = Some(Utc::now());
        state.nodes.insert(path.to_string(), model.clone());
        Ok(model.without_content())
    }

    fn delete(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        if path.is_empty() {
            return Err(Error::invalid_path(path, "cannot delete the store root"));
        }

        let mut state = self.write()?;
        if state.nodes.remove(path).is_none() {
            return Err(Error::not_found(path));
        }
        state.checkpoints.remove(path);
        for descendant in state.descendants(path) {
            state.nodes.remove(&descendant);
            state.checkpoints.remove(&descendant);
        }
        Ok(())
    }

    fn rename(&self, old_path: &str, new_path: &str) -> Result<()> {
        let (old_path, new_path) = (normalize(old_path), normalize(new_path));
        if old_path == new_path {
            return Ok(());
        }
        if old_path.is_empty() || new_path.is_empty() {
            return Err(Error::invalid_path(old_path, "cannot rename the store root"));
        }

        let mut state = self.write()?;
        if !state.nodes.contains_key(old_path) {
            return Err(Error::not_found(old_path));
        }
        if state.nodes.contains_key(new_path) {
            return Err(Error::already_exists(new_path));
        }
        let new_parent = api_path::parent(new_path);
        if !state.is_dir(new_parent) {
            return Err(Error::not_found(new_parent));
        }
        if new_path.starts_with(&format!("{}/", old_path)) {
            return Err(Error::invalid_path(new_path, "cannot move a directory into itself"));
        }

        let mut moved = state.descendants(old_path);
        moved.push(old_path.to_string());
        for from in moved {
            let to = format!("{}{}", new_path, &from[old_path.len()..]);
            if let Some(model) = state.nodes.remove(&from) {
                state.nodes.insert(to.clone(), model.with_path(to.as_str()));
            }
            if let Some(checkpoints) = state.checkpoints.remove(&from) {
                state.checkpoints.insert(to, checkpoints);
            }
        }
        Ok(())
    }

    fn create_checkpoint(&self, path: &str) -> Result<Checkpoint> {
        let path = normalize(path);
        let mut state = self.write()?;
        let model = match state.nodes.get(path) {
            Some(model) if !model.is_directory() => model.clone(),
            _ => return Err(Error::not_found(path)),
        };

        state.next_checkpoint += 1;
        let checkpoint = Checkpoint {
            id: CheckpointId::new(format!("checkpoint-{}", state.next_checkpoint)),
            last_modified: Utc::now(),
        };
        state
            .checkpoints
            .entry(path.to_string())
            .or_default()
            .push((checkpoint.clone(), model));
        Ok(checkpoint)
    }

    fn list_checkpoints(&self, path: &str) -> Result<Vec<Checkpoint>> {
        let path = normalize(path);
        let state = self.read()?;
        if !state.is_file(path) {
            return Err(Error::not_found(path));
        }
        Ok(state
            .checkpoints
            .get(path)
            .map(|list| list.iter().map(|(cp, _)| cp.clone()).collect())
            .unwrap_or_default())
    }

    fn restore_checkpoint(&self, id: &CheckpointId, path: &str) -> Result<()> {
        let path = normalize(path);
        let mut state = self.write()?;
        let snapshot = state
            .checkpoints
            .get(path)
            .and_then(|list| list.iter().find(|(cp, _)| &cp.id == id))
            .map(|(_, model)| model.clone())
            .ok_or_else(|| Error::not_found(format!("checkpoint '{}' of {}", id, path)))?;

        let mut restored = snapshot.with_path(path);
        restored.last_modified = Some(Utc::now());
        state.nodes.insert(path.to_string(), restored);
        Ok(())
    }

    fn delete_checkpoint(&self, id: &CheckpointId, path: &str) -> Result<()> {
        let path = normalize(path);
        let mut state = self.write()?;
        let list = state
            .checkpoints
            .get_mut(path)
            .ok_or_else(|| Error::not_found(format!("checkpoint '{}' of {}", id, path)))?;
        let before = list.len();
        list.retain(|(cp, _)| &cp.id != id);
        if list.len() == before {
            return Err(Error::not_found(format!("checkpoint '{}' of {}", id, path)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> InMemoryStore {
        let mut files = BTreeMap::new();
        files.insert("docs/readme.md".to_string(), "# hi".to_string());
        files.insert("a.txt".to_string(), "a".to_string());
        InMemoryStore::from_config(&InMemoryConfig { files }).unwrap()
    }

    #[test]
    fn root_always_exists() {
        let store = InMemoryStore::new();
        assert!(store.dir_exists("").unwrap());
        assert!(store.dir_exists("/").unwrap());
        assert!(!store.file_exists("").unwrap());
    }

    #[test]
    fn seed_creates_parents() {
        let store = seeded();
        assert!(store.dir_exists("docs").unwrap());
        assert!(store.file_exists("docs/readme.md").unwrap());
    }

    #[test]
    fn seed_beneath_seed_file_fails() {
        let mut files = BTreeMap::new();
        files.insert("a".to_string(), "file".to_string());
        files.insert("a/b".to_string(), "nested".to_string());
        let result = InMemoryStore::from_config(&InMemoryConfig { files });
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn seed_with_empty_path_fails() {
        let mut files = BTreeMap::new();
        files.insert("/".to_string(), "x".to_string());
        let result = InMemoryStore::from_config(&InMemoryConfig { files });
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn basic_save_get() {
        let store = InMemoryStore::new();
        let saved = store
            .save(Model::file("x.txt").with_text("hello"), "x.txt")
            .unwrap();
        assert!(saved.content.is_none());
        assert!(saved.last_modified.is_some());

        let model = store.get("x.txt", &GetOptions::default()).unwrap();
        assert_eq!(model.text(), Some("hello"));
        let meta = store.get("x.txt", &GetOptions::metadata()).unwrap();
        assert!(meta.content.is_none());
    }

    #[test]
    fn save_uses_request_path() {
        let store = InMemoryStore::new();
        store
            .save(Model::file("elsewhere.txt").with_text("x"), "here.txt")
            .unwrap();
        let model = store.get("here.txt", &GetOptions::default()).unwrap();
        assert_eq!(model.path, "here.txt");
        assert_eq!(model.name, "here.txt");
    }

    #[test]
    fn directory_listing_is_direct_children() {
        let store = seeded();
        let root = store.get("", &GetOptions::default()).unwrap();
        assert!(root.is_directory());
        assert_eq!(root.format, Some(Format::Json));
        let children: Vec<Model> = serde_json::from_value(root.content.unwrap()).unwrap();
        let names: Vec<&str> = children.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "docs"]);
    }

    #[test]
    fn save_requires_parent_directory() {
        let store = InMemoryStore::new();
        let result = store.save(Model::file("a/b.txt").with_text("x"), "a/b.txt");
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn delete_removes_subtree() {
        let store = seeded();
        store.delete("docs").unwrap();
        assert!(!store.dir_exists("docs").unwrap());
        assert!(!store.file_exists("docs/readme.md").unwrap());
        assert!(store.file_exists("a.txt").unwrap());
    }

    #[test]
    fn rename_moves_subtree() {
        let store = seeded();
        store.rename("docs", "manual").unwrap();
        assert!(store.file_exists("manual/readme.md").unwrap());
        let model = store.get("manual/readme.md", &GetOptions::default()).unwrap();
        assert_eq!(model.path, "manual/readme.md");
        assert!(!store.dir_exists("docs").unwrap());
    }

    #[test]
    fn rename_into_itself_fails() {
        let store = seeded();
        assert!(store.rename("docs", "docs/inner").is_err());
    }

    #[test]
    fn rename_onto_existing_fails() {
        let store = seeded();
        store
            .save(Model::file("b.txt").with_text("b"), "b.txt")
            .unwrap();
        assert!(matches!(
            store.rename("a.txt", "b.txt"),
            Err(Error::AlreadyExists { .. })
        ));
    }

    #[test]
    fn checkpoints_snapshot_and_restore() {
        let store = seeded();
        let first = store.create_checkpoint("a.txt").unwrap();
        store
            .save(Model::file("a.txt").with_text("changed"), "a.txt")
            .unwrap();
        let second = store.create_checkpoint("a.txt").unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(store.list_checkpoints("a.txt").unwrap().len(), 2);

        store.restore_checkpoint(&first.id, "a.txt").unwrap();
        let model = store.get("a.txt", &GetOptions::default()).unwrap();
        assert_eq!(model.text(), Some("a"));

        store.delete_checkpoint(&first.id, "a.txt").unwrap();
        let remaining = store.list_checkpoints("a.txt").unwrap();
        assert_eq!(remaining, vec![second]);
        assert!(store.delete_checkpoint(&first.id, "a.txt").is_err());
    }

    #[test]
    fn checkpoint_of_directory_fails() {
        let store = seeded();
        assert!(matches!(
            store.create_checkpoint("docs"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn copy_and_new_untitled_use_defaults() {
        let store = seeded();
        let copy = store.copy("a.txt", "docs").unwrap();
        assert_eq!(copy.path, "docs/a.txt");
        let nb = store.new_untitled("docs", ModelKind::Notebook, "").unwrap();
        assert_eq!(nb.path, "docs/Untitled.ipynb");
        assert_eq!(nb.kind, ModelKind::Notebook);
    }

    #[test]
    fn update_renames() {
        let store = seeded();
        let updated = store.update(Model::file("b.txt"), "a.txt").unwrap();
        assert_eq!(updated.path, "b.txt");
        assert!(store.file_exists("b.txt").unwrap());
    }

    #[test]
    fn concurrent_saves() {
        let store = std::sync::Arc::new(InMemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let path = format!("f{}.txt", i);
                    store
                        .save(Model::file(path.as_str()).with_text("x"), &path)
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let root = store.get("", &GetOptions::default()).unwrap();
        let children: Vec<Model> = serde_json::from_value(root.content.unwrap()).unwrap();
        assert_eq!(children.len(), 8);
    }
}
