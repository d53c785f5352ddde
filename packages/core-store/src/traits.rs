//! The contents manager contract every store implements.

use std::sync::Arc;

use serde_json::json;

use crate::path::{self, normalize};
use crate::{Checkpoint, CheckpointId, Error, GetOptions, Model, ModelKind, Result};

/// A shared handle to a store. The mount table holds one per mount point.
pub type StoreHandle = Arc<dyn ContentsManager>;

/// Storage contract for files, directories and notebooks.
///
/// All paths are API-style (`/`-separated, relative to the store's own root).
/// Implementations must be safe to call from several threads at once: every
/// method takes `&self`, so a store guards its own state.
///
/// # Object Safety
///
/// This trait is object-safe: stores are mounted as `Arc<dyn ContentsManager>`.
pub trait ContentsManager: Send + Sync {
    /// Does `path` name an existing directory?
    fn dir_exists(&self, path: &str) -> Result<bool>;

    /// Is `path` hidden (or inside a hidden directory)?
    fn is_hidden(&self, path: &str) -> Result<bool>;

    /// Does `path` name an existing file or notebook?
    fn file_exists(&self, path: &str) -> Result<bool>;

    /// Does anything exist at `path`?
    fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.file_exists(path)? || self.dir_exists(path)?)
    }

    /// Fetch the model at `path`.
    fn get(&self, path: &str, options: &GetOptions) -> Result<Model>;

    /// Store `model` at `path`, returning the saved model without content.
    fn save(&self, model: Model, path: &str) -> Result<Model>;

    /// Apply a model update at `path`.
    ///
    /// The default treats a differing `model.path` as a rename, then returns
    /// metadata for the (possibly new) path.
    fn update(&self, model: Model, path: &str) -> Result<Model> {
        let old_path = normalize(path);
        let new_path = normalize(&model.path);
        if !new_path.is_empty() && new_path != old_path {
            self.rename(old_path, new_path)?;
            return self.get(new_path, &GetOptions::metadata());
        }
        self.get(old_path, &GetOptions::metadata())
    }

    /// Delete the file or directory at `path`.
    fn delete(&self, path: &str) -> Result<()>;

    /// Move `old_path` to `new_path` within this store.
    fn rename(&self, old_path: &str, new_path: &str) -> Result<()>;

    /// Snapshot the current state of the file at `path`.
    fn create_checkpoint(&self, path: &str) -> Result<Checkpoint>;

    fn list_checkpoints(&self, path: &str) -> Result<Vec<Checkpoint>>;

    /// Replace the file at `path` with checkpoint `id`.
    fn restore_checkpoint(&self, id: &CheckpointId, path: &str) -> Result<()>;

    fn delete_checkpoint(&self, id: &CheckpointId, path: &str) -> Result<()>;

    /// Copy a file.
    ///
    /// When `to_path` is an existing directory the copy keeps the source name,
    /// or `<stem>-Copy<n><ext>` if that name is taken.
    fn copy(&self, from_path: &str, to_path: &str) -> Result<Model> {
        let from_path = normalize(from_path);
        let model = self.get(from_path, &GetOptions::default())?;
        if model.is_directory() {
            return Err(Error::invalid_path(from_path, "cannot copy a directory"));
        }

        let to_path = normalize(to_path);
        let target = if self.dir_exists(to_path)? {
            let (stem, ext) = path::split_extension(&model.name);
            unique_name(self, to_path, stem, "-Copy", ext)?
        } else {
            to_path.to_string()
        };

        self.save(model.with_path(target.as_str()), &target)
    }

    /// Create a new untitled file, notebook or directory inside `path`.
    ///
    /// `ext` applies to plain files only (notebooks are always `.ipynb`).
    fn new_untitled(&self, path: &str, kind: ModelKind, ext: &str) -> Result<Model> {
        let dir = normalize(path);
        if !self.dir_exists(dir)? {
            return Err(Error::not_found(dir));
        }

        let (target, model) = match kind {
            ModelKind::Directory => {
                let target = unique_name(self, dir, "Untitled Folder", " ", "")?;
                let model = Model::directory(target.as_str());
                (target, model)
            }
            ModelKind::Notebook => {
                let target = unique_name(self, dir, "Untitled", "", ".ipynb")?;
                let model = Model::notebook(target.as_str())
                    .with_content(empty_notebook(), crate::Format::Json);
                (target, model)
            }
            ModelKind::File => {
                let target = unique_name(self, dir, "untitled", "", ext)?;
                let model = Model::file(target.as_str()).with_text("");
                (target, model)
            }
        };

        self.save(model, &target)
    }
}

/// An empty nbformat 4 document.
pub fn empty_notebook() -> serde_json::Value {
    json!({
        "cells": [],
        "metadata": {},
        "nbformat": 4,
        "nbformat_minor": 5,
    })
}

/// First free `<stem><ext>`, `<stem><insert>1<ext>`, `<stem><insert>2<ext>`, ... in `dir`.
pub fn unique_name<M: ContentsManager + ?Sized>(
    store: &M,
    dir: &str,
    stem: &str,
    insert: &str,
    ext: &str,
) -> Result<String> {
    let mut n = 0usize;
    loop {
        let name = if n == 0 {
            format!("{}{}", stem, ext)
        } else {
            format!("{}{}{}{}", stem, insert, n, ext)
        };
        let candidate = path::join(dir, &name);
        if !store.exists(&candidate)? {
            return Ok(candidate);
        }
        n += 1;
    }
}
