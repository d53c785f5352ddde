//! Error types shared by every contents store.
//!
//! The dispatcher adds three kinds of its own (`Configuration`, `CrossMount`,
//! `Unsupported`). Everything else is raised by a backend and travels through
//! the dispatcher untouched.

use std::io;

/// Errors produced by contents stores and the mount dispatcher.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The mount table or its configuration is invalid.
    ///
    /// Raised once, at startup. A store with a broken mount table never serves
    /// requests.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// An operation's paths resolve to different mount points.
    #[error("cannot move across mount points: '{from}' -> '{to}'")]
    CrossMount { from: String, to: String },

    /// The operation has no meaning at this path (virtual root or an unmounted
    /// top-level name).
    #[error("operation '{operation}' is not supported at path '{path}'")]
    Unsupported { operation: String, path: String },

    /// A backend does not implement the operation at all.
    #[error("operation '{operation}' is not supported by the {backend} store")]
    NotSupported {
        backend: &'static str,
        operation: String,
    },

    #[error("no such file or directory: {path}")]
    NotFound { path: String },

    #[error("already exists: {path}")]
    AlreadyExists { path: String },

    #[error("invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// Stored bytes could not be interpreted in the requested format.
    #[error("cannot decode '{path}': {message}")]
    Decode { path: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend-specific failure that fits no other variant.
    #[error("{store} store failed during {operation}: {message}")]
    Backend {
        store: &'static str,
        operation: String,
        message: String,
    },
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    pub fn cross_mount(from: impl Into<String>, to: impl Into<String>) -> Self {
        Error::CrossMount {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn unsupported(operation: impl ToString, path: impl Into<String>) -> Self {
        Error::Unsupported {
            operation: operation.to_string(),
            path: path.into(),
        }
    }

    pub fn not_supported(backend: &'static str, operation: impl Into<String>) -> Self {
        Error::NotSupported {
            backend,
            operation: operation.into(),
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Error::NotFound { path: path.into() }
    }

    pub fn already_exists(path: impl Into<String>) -> Self {
        Error::AlreadyExists { path: path.into() }
    }

    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Build a backend failure tagged with the store name and operation.
    pub fn backend(
        store: &'static str,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Backend {
            store,
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// True for the errors the dispatcher itself raises at call time.
    pub fn is_dispatch_error(&self) -> bool {
        matches!(self, Error::CrossMount { .. } | Error::Unsupported { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
