//! Models: the records stores hand back and accept.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path;

/// What a model describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    File,
    Directory,
    Notebook,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::File => write!(f, "file"),
            ModelKind::Directory => write!(f, "directory"),
            ModelKind::Notebook => write!(f, "notebook"),
        }
    }
}

/// Encoding of a model's `content`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// UTF-8 text in a JSON string.
    Text,
    /// Binary data, base64 encoded in a JSON string.
    Base64,
    /// Structured JSON (notebooks and directory listings).
    Json,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Text => write!(f, "text"),
            Format::Base64 => write!(f, "base64"),
            Format::Json => write!(f, "json"),
        }
    }
}

/// A file, directory or notebook.
///
/// `content` is `None` whenever content was not requested or not fetched.
/// Directory content is a JSON array of child models (themselves without
/// content).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: ModelKind,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub format: Option<Format>,
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default = "default_writable")]
    pub writable: bool,
}

fn default_writable() -> bool {
    true
}

impl Model {
    /// A content-less model of the given kind at `path`.
    pub fn new(kind: ModelKind, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: path::file_name(&path).to_string(),
            path,
            kind,
            content: None,
            format: None,
            mimetype: None,
            created: None,
            last_modified: None,
            writable: true,
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self::new(ModelKind::Directory, path)
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self::new(ModelKind::File, path)
    }

    pub fn notebook(path: impl Into<String>) -> Self {
        Self::new(ModelKind::Notebook, path)
    }

    /// Attach content in the given format.
    #[must_use]
    pub fn with_content(mut self, content: Value, format: Format) -> Self {
        self.content = Some(content);
        self.format = Some(format);
        self
    }

    /// Attach UTF-8 text content.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_content(Value::String(text.into()), Format::Text)
    }

    /// Replace the path (and the name derived from it).
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.set_path(path);
        self
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
        self.name = path::file_name(&self.path).to_string();
    }

    /// Drop content and format, keeping metadata.
    #[must_use]
    pub fn without_content(mut self) -> Self {
        self.content = None;
        self.format = None;
        self
    }

    pub fn is_directory(&self) -> bool {
        self.kind == ModelKind::Directory
    }

    /// Content as text, if it is a JSON string.
    pub fn text(&self) -> Option<&str> {
        self.content.as_ref().and_then(Value::as_str)
    }
}

/// Options for `get`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetOptions {
    /// Fetch content (file bytes, notebook JSON, directory listing).
    pub content: bool,
    /// Expected kind; a mismatch is an error.
    pub kind: Option<ModelKind>,
    /// Requested content format for files.
    pub format: Option<Format>,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            content: true,
            kind: None,
            format: None,
        }
    }
}

impl GetOptions {
    /// Metadata only.
    pub fn metadata() -> Self {
        Self {
            content: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: ModelKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }
}

/// Identifier of a checkpoint, unique per file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckpointId(pub String);

impl CheckpointId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CheckpointId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A saved checkpoint of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: CheckpointId,
    pub last_modified: DateTime<Utc>,
}
