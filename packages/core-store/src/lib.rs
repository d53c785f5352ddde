//! Core mixedfs types: the contents manager contract and what flows through it.
//!
//! - [`ContentsManager`]: the storage contract every backend implements
//! - [`Model`]: a file, directory or notebook record
//! - [`Checkpoint`]: a saved snapshot of a file
//! - [`split`] / [`join`]: API path handling used for mount routing
//! - [`Error`]: the shared error taxonomy
//!
//! # Example
//!
//! ```rust
//! use mixedfs_core_store::{ContentsManager, GetOptions, Model, Result};
//!
//! fn read_text(store: &dyn ContentsManager, path: &str) -> Result<Option<String>> {
//!     let model: Model = store.get(path, &GetOptions::default())?;
//!     Ok(model.text().map(str::to_string))
//! }
//! ```

mod error;
mod model;
pub mod path;
mod traits;

pub use error::{Error, Result};
pub use model::{Checkpoint, CheckpointId, Format, GetOptions, Model, ModelKind};
pub use path::{join, normalize, split, SplitPath};
pub use traits::{empty_notebook, unique_name, ContentsManager, StoreHandle};
