use std::fs;
use std::path::{Component, Path, PathBuf};

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use mixedfs_core_store::path::{self as api_path, normalize};
use mixedfs_core_store::{
    Checkpoint, CheckpointId, ContentsManager, Error, Format, GetOptions, Model, ModelKind, Result,
};

const CHECKPOINT_DIR: &str = ".ipynb_checkpoints";
const CHECKPOINT_ID: &str = "checkpoint";
const NOTEBOOK_EXT: &str = ".ipynb";

/// Configuration for a [`LocalDiskStore`] mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDiskConfig {
    /// Directory the store serves. Relative paths resolve against the
    /// process working directory.
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
    /// Include dotfiles in directory listings.
    #[serde(default)]
    pub allow_hidden: bool,
}

fn default_root_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for LocalDiskConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            allow_hidden: false,
        }
    }
}

/// A contents store backed by a directory on the local filesystem.
///
/// Files ending in `.ipynb` are notebooks. Each file can have one checkpoint,
/// kept as `<stem>-checkpoint<ext>` in a `.ipynb_checkpoints` directory next
/// to it.
pub struct LocalDiskStore {
    root: PathBuf,
    allow_hidden: bool,
}

impl LocalDiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<LocalDiskStore> {
        let root = root.into();
        let attr = fs::metadata(&root).map_err(|error| {
            Error::configuration(format!(
                "local store root '{}' is invalid: {}",
                root.display(),
                error
            ))
        })?;

        if !attr.is_dir() {
            return Err(Error::configuration(format!(
                "local store root '{}' must be a directory",
                root.display()
            )));
        }

        let root = root.canonicalize()?;
        Ok(LocalDiskStore {
            root,
            allow_hidden: false,
        })
    }

    pub fn from_config(config: &LocalDiskConfig) -> Result<LocalDiskStore> {
        Ok(Self::new(&config.root_dir)?.allow_hidden(config.allow_hidden))
    }

    #[must_use]
    pub fn allow_hidden(mut self, allow: bool) -> Self {
        self.allow_hidden = allow;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an API path onto the filesystem, refusing to leave the root.
    fn os_path(&self, path: &str) -> Result<PathBuf> {
        let mut os_path = self.root.clone();
        for component in normalize(path).split('/').filter(|c| !c.is_empty()) {
            let mut parts = Path::new(component).components();
            match (parts.next(), parts.next()) {
                (Some(Component::Normal(_)), None) => os_path.push(component),
                (Some(Component::CurDir), None) => {}
                _ => {
                    return Err(Error::invalid_path(
                        path,
                        format!("component '{}' escapes the store root", component),
                    ))
                }
            }
        }
        Ok(os_path)
    }

    fn checkpoint_path(&self, path: &str) -> Result<PathBuf> {
        let path = normalize(path);
        let (stem, ext) = api_path::split_extension(api_path::file_name(path));
        let dir = self.os_path(api_path::parent(path))?;
        Ok(dir
            .join(CHECKPOINT_DIR)
            .join(format!("{}-{}{}", stem, CHECKPOINT_ID, ext)))
    }

    fn kind_of(path: &str, meta: &fs::Metadata) -> ModelKind {
        if meta.is_dir() {
            ModelKind::Directory
        } else if path.ends_with(NOTEBOOK_EXT) {
            ModelKind::Notebook
        } else {
            ModelKind::File
        }
    }

    fn base_model(path: &str, kind: ModelKind, meta: &fs::Metadata) -> Model {
        let mut model = Model::new(kind, path);
        model.last_modified = meta.modified().ok().map(DateTime::<Utc>::from);
        model.created = meta.created().ok().map(DateTime::<Utc>::from);
        model.writable = !meta.permissions().readonly();
        model
    }

    fn directory_model(&self, path: &str, os_path: &Path, options: &GetOptions) -> Result<Model> {
        let meta = fs::metadata(os_path)?;
        let mut model = Self::base_model(path, ModelKind::Directory, &meta);
        if !options.content {
            return Ok(model);
        }

        let mut children = Vec::new();
        for entry in fs::read_dir(os_path)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::debug!(dir = %os_path.display(), "skipping entry with non UTF-8 name");
                continue;
            };
            if !self.allow_hidden && name.starts_with('.') {
                continue;
            }
            // Broken symlinks and special files have no model.
            let Ok(child_meta) = fs::metadata(entry.path()) else {
                continue;
            };
            if !child_meta.is_dir() && !child_meta.is_file() {
                continue;
            }
            let child_path = api_path::join(path, &name);
            let kind = Self::kind_of(&child_path, &child_meta);
            children.push(Self::base_model(&child_path, kind, &child_meta));
        }
        children.sort_by(|a, b| a.name.cmp(&b.name));

        model.content = Some(serde_json::to_value(children)?);
        model.format = Some(Format::Json);
        Ok(model)
    }

    fn file_model(
        &self,
        path: &str,
        os_path: &Path,
        kind: ModelKind,
        options: &GetOptions,
    ) -> Result<Model> {
        let meta = fs::metadata(os_path)?;
        let mut model = Self::base_model(path, kind, &meta);
        if !options.content {
            return Ok(model);
        }

        tracing::debug!("Reading {}...", os_path.display());
        let bytes = fs::read(os_path)?;

        if kind == ModelKind::Notebook {
            let notebook: Value = serde_json::from_slice(&bytes)
                .map_err(|e| Error::decode(path, format!("invalid notebook JSON: {}", e)))?;
            model.content = Some(notebook);
            model.format = Some(Format::Json);
            return Ok(model);
        }

        let (content, format) = match options.format {
            Some(Format::Text) => {
                let text = String::from_utf8(bytes)
                    .map_err(|_| Error::decode(path, "file is not UTF-8 encoded"))?;
                (text, Format::Text)
            }
            Some(Format::Base64) => (
                base64::engine::general_purpose::STANDARD.encode(&bytes),
                Format::Base64,
            ),
            Some(Format::Json) => {
                return Err(Error::decode(path, "files cannot be read as json"));
            }
            None => match String::from_utf8(bytes) {
                Ok(text) => (text, Format::Text),
                Err(e) => (
                    base64::engine::general_purpose::STANDARD.encode(e.as_bytes()),
                    Format::Base64,
                ),
            },
        };

        model.mimetype = Some(
            match format {
                Format::Text => "text/plain",
                _ => "application/octet-stream",
            }
            .to_string(),
        );
        model.content = Some(Value::String(content));
        model.format = Some(format);
        Ok(model)
    }

    fn encode_for_disk(path: &str, model: &Model) -> Result<Vec<u8>> {
        let content = model
            .content
            .as_ref()
            .ok_or_else(|| Error::invalid_path(path, "no content provided"))?;

        match model.kind {
            ModelKind::Notebook => Ok(serde_json::to_vec_pretty(content)?),
            _ => match (model.format, content) {
                (Some(Format::Base64), Value::String(s)) => base64::engine::general_purpose::STANDARD
                    .decode(s.as_bytes())
                    .map_err(|e| Error::decode(path, format!("invalid base64 content: {}", e))),
                (Some(Format::Text) | None, Value::String(s)) => Ok(s.clone().into_bytes()),
                (Some(Format::Json), value) => Ok(serde_json::to_vec_pretty(value)?),
                _ => Err(Error::decode(path, "file content must be a string")),
            },
        }
    }

    fn require_file(&self, path: &str) -> Result<PathBuf> {
        let os_path = self.os_path(path)?;
        if !os_path.is_file() {
            return Err(Error::not_found(path));
        }
        Ok(os_path)
    }

    fn checkpoint_from(path: &Path) -> Result<Checkpoint> {
        let modified = fs::metadata(path)?.modified()?;
        Ok(Checkpoint {
            id: CheckpointId::new(CHECKPOINT_ID),
            last_modified: DateTime::<Utc>::from(modified),
        })
    }

    fn check_checkpoint_id(id: &CheckpointId, path: &str) -> Result<()> {
        if id.as_str() != CHECKPOINT_ID {
            return Err(Error::not_found(format!("checkpoint '{}' of {}", id, path)));
        }
        Ok(())
    }
}

impl ContentsManager for LocalDiskStore {
    fn dir_exists(&self, path: &str) -> Result<bool> {
        Ok(self.os_path(path)?.is_dir())
    }

    fn is_hidden(&self, path: &str) -> Result<bool> {
        Ok(normalize(path).split('/').any(|c| c.starts_with('.')))
    }

    fn file_exists(&self, path: &str) -> Result<bool> {
        Ok(self.os_path(path)?.is_file())
    }

    fn get(&self, path: &str, options: &GetOptions) -> Result<Model> {
        let path = normalize(path);
        let os_path = self.os_path(path)?;
        let meta = match fs::metadata(&os_path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::not_found(path))
            }
            Err(e) => return Err(e.into()),
        };

        let on_disk = Self::kind_of(path, &meta);
        match (on_disk, options.kind) {
            (ModelKind::Directory, None | Some(ModelKind::Directory)) => {
                self.directory_model(path, &os_path, options)
            }
            (ModelKind::Directory, Some(_)) => {
                Err(Error::invalid_path(path, "is a directory"))
            }
            (_, Some(ModelKind::Directory)) => Err(Error::invalid_path(path, "not a directory")),
            (ModelKind::File, Some(ModelKind::Notebook)) => {
                Err(Error::invalid_path(path, "not a notebook"))
            }
            (kind, requested) => {
                self.file_model(path, &os_path, requested.unwrap_or(kind), options)
            }
        }
    }

    fn save(&self, model: Model, path: &str) -> Result<Model> {
        let path = normalize(path);
        if path.is_empty() && model.kind != ModelKind::Directory {
            return Err(Error::invalid_path(path, "the store root is a directory"));
        }

        let os_path = self.os_path(path)?;
        let parent = api_path::parent(path);
        if !self.os_path(parent)?.is_dir() {
            return Err(Error::not_found(parent));
        }

        match model.kind {
            ModelKind::Directory => {
                if os_path.is_file() {
                    return Err(Error::already_exists(path));
                }
                tracing::debug!("Creating directory {}...", os_path.display());
                fs::create_dir_all(&os_path)?;
            }
            _ => {
                if os_path.is_dir() {
                    return Err(Error::invalid_path(path, "is a directory"));
                }
                let bytes = Self::encode_for_disk(path, &model)?;
                tracing::debug!("Writing {}...", os_path.display());
                fs::write(&os_path, bytes)?;
            }
        }

        self.get(path, &GetOptions::metadata())
    }

    fn delete(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        if path.is_empty() {
            return Err(Error::invalid_path(path, "cannot delete the store root"));
        }

        let os_path = self.os_path(path)?;
        if os_path.is_dir() {
            tracing::debug!("Removing directory {}...", os_path.display());
            fs::remove_dir_all(&os_path)?;
        } else if os_path.is_file() {
            tracing::debug!("Removing {}...", os_path.display());
            fs::remove_file(&os_path)?;
            let checkpoint = self.checkpoint_path(path)?;
            if checkpoint.is_file() {
                fs::remove_file(checkpoint)?;
            }
        } else {
            return Err(Error::not_found(path));
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

        let from = self.os_path(old_path)?;
        let to = self.os_path(new_path)?;
        if !from.exists() {
            return Err(Error::not_found(old_path));
        }
        if to.exists() {
            return Err(Error::already_exists(new_path));
        }

        tracing::debug!("Renaming {} -> {}...", from.display(), to.display());
        fs::rename(&from, &to)?;

        let old_checkpoint = self.checkpoint_path(old_path)?;
        if old_checkpoint.is_file() {
            let new_checkpoint = self.checkpoint_path(new_path)?;
            if let Some(dir) = new_checkpoint.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::rename(old_checkpoint, new_checkpoint)?;
        }
        Ok(())
    }

    fn create_checkpoint(&self, path: &str) -> Result<Checkpoint> {
        let source = self.require_file(path)?;
        let checkpoint = self.checkpoint_path(path)?;
        if let Some(dir) = checkpoint.parent() {
            fs::create_dir_all(dir)?;
        }
        tracing::debug!("Checkpointing {}...", source.display());
        fs::copy(&source, &checkpoint)?;
        Self::checkpoint_from(&checkpoint)
    }

    fn list_checkpoints(&self, path: &str) -> Result<Vec<Checkpoint>> {
        self.require_file(path)?;
        let checkpoint = self.checkpoint_path(path)?;
        if !checkpoint.is_file() {
            return Ok(Vec::new());
        }
        Ok(vec![Self::checkpoint_from(&checkpoint)?])
    }

    fn restore_checkpoint(&self, id: &CheckpointId, path: &str) -> Result<()> {
        Self::check_checkpoint_id(id, path)?;
        let checkpoint = self.checkpoint_path(path)?;
        if !checkpoint.is_file() {
            return Err(Error::not_found(format!("checkpoint '{}' of {}", id, path)));
        }
        let target = self.os_path(path)?;
        tracing::debug!("Restoring {} from checkpoint...", target.display());
        fs::copy(&checkpoint, &target)?;
        Ok(())
    }

    fn delete_checkpoint(&self, id: &CheckpointId, path: &str) -> Result<()> {
        Self::check_checkpoint_id(id, path)?;
        let checkpoint = self.checkpoint_path(path)?;
        if !checkpoint.is_file() {
            return Err(Error::not_found(format!("checkpoint '{}' of {}", id, path)));
        }
        fs::remove_file(checkpoint)?;
        Ok(())
    }
}
