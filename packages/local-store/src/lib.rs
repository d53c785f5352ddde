//! Stores that keep contents on this machine.
//!
//! - [`LocalDiskStore`]: files and notebooks under a root directory, with
//!   checkpoints kept in `.ipynb_checkpoints`
//! - [`InMemoryStore`]: a map of models, for scratch mounts and tests

pub mod in_memory;
pub mod local_disk;

pub use in_memory::{InMemoryConfig, InMemoryStore};
pub use local_disk::{LocalDiskConfig, LocalDiskStore};
