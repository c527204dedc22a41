use crate::error::StagingError;
use parking_lot::Mutex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const ACCEPTED_EXTENSIONS: &[&str] = &["framer", "json", "zip", "txt", "js", "jsx", "ts", "tsx"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentContent {
    Bytes(Arc<[u8]>),
    /// Read when the request is dispatched.
    Path(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub size_bytes: u64,
    pub content: AttachmentContent,
}

impl Attachment {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size_bytes: bytes.len() as u64,
            content: AttachmentContent::Bytes(bytes.into()),
        }
    }

    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Ok(Self {
            name,
            size_bytes: metadata.len(),
            content: AttachmentContent::Path(path.to_path_buf()),
        })
    }

    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }

    pub async fn read_content(&self) -> io::Result<Vec<u8>> {
        match &self.content {
            AttachmentContent::Bytes(bytes) => Ok(bytes.to_vec()),
            AttachmentContent::Path(path) => tokio::fs::read(path).await,
        }
    }
}

pub fn is_accepted(name: &str) -> bool {
    let lowered = name.to_lowercase();
    ACCEPTED_EXTENSIONS.iter().any(|extension| {
        lowered
            .strip_suffix(extension)
            .is_some_and(|stem| stem.ends_with('.'))
    })
}

/// Files waiting to be sent with the next generation request.
#[derive(Debug, Default)]
pub struct AttachmentStaging {
    items: Vec<Attachment>,
}

impl AttachmentStaging {
    /// Replaces the staged set with the accepted files of `files`, keeping
    /// their order. Returns how many were staged.
    pub fn add(&mut self, files: Vec<Attachment>) -> usize {
        self.items = files
            .into_iter()
            .filter(|file| is_accepted(&file.name))
            .collect();
        self.items.len()
    }

    pub fn remove(&mut self, index: usize) -> Result<Attachment, StagingError> {
        if index >= self.items.len() {
            return Err(StagingError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn list(&self) -> Vec<Attachment> {
        self.items.clone()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Staging shared between file intake and the request orchestrator. Each
/// call takes the lock once, so a snapshot is never observed half-updated.
#[derive(Debug, Clone, Default)]
pub struct SharedStaging {
    inner: Arc<Mutex<AttachmentStaging>>,
}

impl SharedStaging {
    pub fn add(&self, files: Vec<Attachment>) -> usize {
        self.inner.lock().add(files)
    }

    pub fn remove(&self, index: usize) -> Result<Attachment, StagingError> {
        self.inner.lock().remove(index)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn snapshot(&self) -> Vec<Attachment> {
        self.inner.lock().list()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }
}
