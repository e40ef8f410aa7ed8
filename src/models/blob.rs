//! Audio blob abstraction for files selected in the host UI.
//!
//! The core never owns the selected file — it borrows byte ranges from an
//! `AudioBlob` and reads nothing it does not need. `FileBlob` backs a blob
//! with a path on disk; `MemoryBlob` holds bytes directly (in-memory
//! recordings, tests).

use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{AppError, Result};

/// A named, sized, immutable sequence of bytes selected for upload.
///
/// Implementations must be cheap to share (`Arc<dyn AudioBlob>`) and must
/// never mutate the underlying bytes. `read_range` is synchronous; async
/// callers wrap it with [`read_range_async`].
pub trait AudioBlob: Send + Sync + 'static {
    /// Declared file name, including extension.
    fn file_name(&self) -> &str;

    /// Content type declared by the host (browser/OS), if any.
    fn content_type(&self) -> Option<&str>;

    /// Total length in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read up to `size` bytes starting at `offset`.
    ///
    /// Reads past the end of the blob are truncated, not errors.
    fn read_range(&self, offset: u64, size: u64) -> Result<Vec<u8>>;

    /// Lower-cased last `.`-delimited segment of the file name.
    ///
    /// A name without a dot yields the whole name, matching how hosts
    /// typically split extensions.
    fn extension(&self) -> Option<String> {
        self.file_name()
            .split('.')
            .next_back()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_ascii_lowercase())
    }
}

/// Read a byte range from a shared blob without blocking the runtime.
pub async fn read_range_async(
    blob: Arc<dyn AudioBlob>,
    offset: u64,
    size: u64,
) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || blob.read_range(offset, size))
        .await
        .map_err(|e| AppError::Internal(format!("spawn_blocking join error: {}", e)))?
}

/// Blob backed by a file on disk.
#[derive(Debug, Clone)]
pub struct FileBlob {
    file_name: String,
    path: PathBuf,
    file_size: u64,
    content_type: Option<String>,
}

impl FileBlob {
    /// Open a path, capturing its name and size. The size is fixed at open
    /// time; the file is expected not to change while selected.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::Io(format!("Invalid file name: {}", path.display())))?
            .to_string();
        let metadata = std::fs::metadata(path)?;
        Ok(Self {
            file_name,
            path: path.to_path_buf(),
            file_size: metadata.len(),
            content_type: None,
        })
    }

    /// Attach a declared content type (e.g. from the host's file picker).
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AudioBlob for FileBlob {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn len(&self) -> u64 {
        self.file_size
    }

    fn read_range(&self, offset: u64, size: u64) -> Result<Vec<u8>> {
        let mut file = std::fs::File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; size as usize];
        let mut filled = 0;
        while filled < buf.len() {
            let n = file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        Ok(buf)
    }
}

/// Blob held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryBlob {
    file_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

impl MemoryBlob {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl AudioBlob for MemoryBlob {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read_range(&self, offset: u64, size: u64) -> Result<Vec<u8>> {
        let start = (offset as usize).min(self.bytes.len());
        let end = start.saturating_add(size as usize).min(self.bytes.len());
        Ok(self.bytes[start..end].to_vec())
    }
}
