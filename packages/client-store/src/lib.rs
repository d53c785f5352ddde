//! A placeholder store for contents the browser client manages itself
//! (Google Drive and similar client-side APIs).
//!
//! The server never sees these files. Page handlers still ask whether a path
//! exists before rendering, so this store answers "yes" to every existence
//! query and reports every path as a notebook. Anything that would touch
//! content is refused.

use serde::{Deserialize, Serialize};

use mixedfs_core_store::{
    normalize, Checkpoint, CheckpointId, ContentsManager, Error, GetOptions, Model, ModelKind,
    Result,
};

const STORE: &str = "clientside";

/// Configuration for a [`ClientSideStore`] mount. There is nothing to set;
/// unknown keys are rejected so typos surface at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSideConfig {}

/// Store whose contents live entirely on the client.
#[derive(Debug, Clone, Default)]
pub struct ClientSideStore;

impl ClientSideStore {
    pub fn new() -> Self {
        Self
    }

    pub fn from_config(_config: &ClientSideConfig) -> Self {
        Self
    }

    fn refuse<T>(&self, operation: &str, path: &str) -> Result<T> {
        tracing::debug!(operation, path, "client-side store refused operation");
        Err(Error::not_supported(STORE, operation))
    }
}

impl ContentsManager for ClientSideStore {
    fn dir_exists(&self, _path: &str) -> Result<bool> {
        Ok(true)
    }

    fn is_hidden(&self, _path: &str) -> Result<bool> {
        Ok(false)
    }

    fn file_exists(&self, _path: &str) -> Result<bool> {
        Ok(true)
    }

    fn exists(&self, _path: &str) -> Result<bool> {
        Ok(true)
    }

    fn get(&self, path: &str, _options: &GetOptions) -> Result<Model> {
        Ok(Model::notebook(normalize(path)))
    }

    fn save(&self, _model: Model, path: &str) -> Result<Model> {
        self.refuse("save", path)
    }

    fn update(&self, _model: Model, path: &str) -> Result<Model> {
        self.refuse("update", path)
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.refuse("delete", path)
    }

    fn rename(&self, old_path: &str, _new_path: &str) -> Result<()> {
        self.refuse("rename", old_path)
    }

    fn create_checkpoint(&self, path: &str) -> Result<Checkpoint> {
        self.refuse("create_checkpoint", path)
    }

    fn list_checkpoints(&self, _path: &str) -> Result<Vec<Checkpoint>> {
        Ok(Vec::new())
    }

    fn restore_checkpoint(&self, _id: &CheckpointId, path: &str) -> Result<()> {
        self.refuse("restore_checkpoint", path)
    }

    fn delete_checkpoint(&self, _id: &CheckpointId, path: &str) -> Result<()> {
        self.refuse("delete_checkpoint", path)
    }

    // Every name "exists" here, so the default free-name search would never end.
    fn copy(&self, from_path: &str, _to_path: &str) -> Result<Model> {
        self.refuse("copy", from_path)
    }

    fn new_untitled(&self, path: &str, _kind: ModelKind, _ext: &str) -> Result<Model> {
        self.refuse("new_untitled", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everything_exists() {
        let store = ClientSideStore::new();
        for path in ["", "a", "a/b/c.ipynb", "/weird//path/"] {
            assert!(store.dir_exists(path).unwrap());
            assert!(store.file_exists(path).unwrap());
            assert!(store.exists(path).unwrap());
            assert!(!store.is_hidden(path).unwrap());
        }
    }

    #[test]
    fn get_reports_a_notebook_without_content() {
        let store = ClientSideStore::new();
        let model = store.get("folder/x.ipynb", &GetOptions::default()).unwrap();
        assert_eq!(model.kind, ModelKind::Notebook);
        assert_eq!(model.path, "folder/x.ipynb");
        assert!(model.content.is_none());
    }

    #[test]
    fn mutations_are_refused() {
        let store = ClientSideStore::new();
        let id = CheckpointId::new("checkpoint");
        assert!(matches!(
            store.save(Model::file("a"), "a"),
            Err(Error::NotSupported { backend: "clientside", .. })
        ));
        assert!(store.delete("a").is_err());
        assert!(store.rename("a", "b").is_err());
        assert!(store.update(Model::file("b"), "a").is_err());
        assert!(store.create_checkpoint("a").is_err());
        assert!(store.restore_checkpoint(&id, "a").is_err());
        assert!(store.delete_checkpoint(&id, "a").is_err());
        assert!(store.copy("a", "b").is_err());
        assert!(store.new_untitled("", ModelKind::Notebook, "").is_err());
    }

    #[test]
    fn no_checkpoints() {
        let store = ClientSideStore::new();
        assert!(store.list_checkpoints("x.ipynb").unwrap().is_empty());
    }

    #[test]
    fn config_accepts_empty_object_only() {
        let config: ClientSideConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(ClientSideStore::from_config(&config).exists("x").ok(), Some(true));
        assert!(serde_json::from_str::<ClientSideConfig>(r#"{"token": "x"}"#).is_err());
    }
}
