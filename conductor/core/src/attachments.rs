//! Attachment Collector
//!
//! Files the user picked are staged here until the next send. Staged files
//! are counted and shown to the user but never serialized into a request.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while staging files
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// The path does not exist
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// The path exists but is not a regular file
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),

    /// Reading file metadata failed
    #[error("Failed to read {path}: {source}")]
    Io {
        /// The path that was inspected
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },
}

/// A locally selected file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    /// Where the file lives
    pub path: PathBuf,
    /// File name shown to the user
    pub name: String,
    /// Size in bytes at selection time
    pub size_bytes: u64,
}

impl Attachment {
    /// Stage a file, reading its metadata
    ///
    /// # Errors
    ///
    /// Returns an error if the path is missing, is not a regular file, or its
    /// metadata cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, AttachmentError> {
        let path = path.as_ref().to_path_buf();
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AttachmentError::NotFound(path));
            }
            Err(source) => return Err(AttachmentError::Io { path, source }),
        };

        if !metadata.is_file() {
            return Err(AttachmentError::NotAFile(path));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            size_bytes: metadata.len(),
            path,
        })
    }
}

/// Ordered list of staged files
#[derive(Clone, Debug, Default)]
pub struct AttachmentSet {
    files: Vec<Attachment>,
}

impl AttachmentSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the staged files wholesale
    pub fn replace(&mut self, files: impl IntoIterator<Item = Attachment>) {
        self.files = files.into_iter().collect();
    }

    /// Stage every path, replacing the current selection
    ///
    /// The selection is all-or-nothing: if any path fails, the previous
    /// selection is kept.
    ///
    /// # Errors
    ///
    /// Returns the first [`AttachmentError`] encountered.
    pub async fn select<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<usize, AttachmentError> {
        let mut staged = Vec::with_capacity(paths.len());
        for path in paths {
            staged.push(Attachment::from_path(path).await?);
        }
        self.replace(staged);
        tracing::debug!(count = self.files.len(), "Attachments staged");
        Ok(self.files.len())
    }

    /// Drop all staged files
    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Number of staged files
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing is staged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate staged files in selection order
    pub fn iter(&self) -> std::slice::Iter<'_, Attachment> {
        self.files.iter()
    }

    /// Count line for the UI, `None` when nothing is staged
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        if self.files.is_empty() {
            None
        } else {
            Some(format!("{} file(s) selected", self.files.len()))
        }
    }
}
