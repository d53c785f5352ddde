//! Path-routed contents store.
//!
//! A [`MountStore`] presents several contents stores as one tree. Each store
//! is mounted under a top-level name, and the root is a virtual directory
//! holding the mount points.
//!
//! - [`MixedConfig`] / [`MountSpec`]: which stores to mount where
//! - [`StoreRegistry`]: builds stores by kind (`local`, `memory`, `clientside`)
//! - [`MountTable`]: the validated, immutable prefix bindings
//! - [`MountStore`]: the dispatcher, itself a [`ContentsManager`]
//!
//! # Example
//!
//! ```rust
//! use mixedfs_core_store::{ContentsManager, GetOptions, Model};
//! use mixedfs_mount_store::{MixedConfig, MountStore, StoreRegistry};
//!
//! let config = MixedConfig::from_json_str(r#"{
//!     "mounts": [
//!         {"prefix": "scratch", "kind": "memory"},
//!         {"prefix": "gdrive", "kind": "clientside"}
//!     ]
//! }"#).unwrap();
//! let store = MountStore::from_config(&config, &StoreRegistry::with_defaults()).unwrap();
//!
//! store.save(Model::file("a.txt").with_text("hello"), "scratch/a.txt").unwrap();
//! let model = store.get("scratch/a.txt", &GetOptions::default()).unwrap();
//! assert_eq!(model.text(), Some("hello"));
//! assert!(store.dir_exists("gdrive").unwrap());
//! ```
//!
//! [`ContentsManager`]: mixedfs_core_store::ContentsManager

pub mod config;
pub mod mount_store;
pub mod mount_table;
pub mod registry;

pub use config::{MixedConfig, MountSpec};
pub use mount_store::{MountStore, Operation, Route};
pub use mount_table::{MountEntry, MountInfo, MountTable, CUSTOM_KIND};
pub use registry::{parse_config, StoreConstructor, StoreFactory, StoreRegistry};
