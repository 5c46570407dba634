use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the bytes of a selected file come from.
#[derive(Clone)]
pub enum FileSource {
    Path(PathBuf),
    Memory(Arc<[u8]>),
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            FileSource::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
        }
    }
}

/// One file of a batch, normalized from whichever selection mechanism produced it.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    pub name: String,
    pub size: u64,
    pub extension: String,
    pub source: FileSource,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, size: u64, source: FileSource) -> Self {
        let name = name.into();
        let extension = extension_of(&name);
        Self {
            name,
            size,
            extension,
            source,
        }
    }

    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        let name = path
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?
            .to_string_lossy()
            .to_string();

        Ok(Self::new(
            name,
            metadata.len(),
            FileSource::Path(path.to_path_buf()),
        ))
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Arc<[u8]>) -> Self {
        let size = bytes.len() as u64;
        Self::new(name, size, FileSource::Memory(bytes))
    }
}

/// Lowercased text after the last `.` of the name. A name without a dot
/// yields the whole name, which never matches an accepted extension.
fn extension_of(name: &str) -> String {
    name.rsplit('.').next().unwrap_or_default().to_lowercase()
}

/// One event of a file transfer channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// Completion of this file alone, 0 to 100.
    Progress(f64),
    Done { id: Option<String> },
    Failed(String),
}

impl ChannelEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ChannelEvent::Progress(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileUploadStatus {
    Pending,
    Uploading,
    Succeeded,
    Failed,
}

impl FileUploadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, FileUploadStatus::Succeeded | FileUploadStatus::Failed)
    }
}

#[derive(Debug, Clone)]
pub struct FileUploadState {
    pub index: usize,
    pub name: String,
    pub status: FileUploadStatus,
    pub last_progress: f64,
    pub result_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub name: String,
    pub reason: String,
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failures: Vec<FileFailure>,
    pub result_ids: Vec<String>,
    /// Whether the completion policy considers the batch done well enough to move on.
    pub advance: bool,
}

/// Notifications published while a run progresses.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started {
        total: usize,
    },
    Progress {
        overall: u8,
    },
    FileSucceeded {
        index: usize,
        name: String,
        id: String,
    },
    FileFailed {
        index: usize,
        name: String,
        reason: String,
    },
    Finished(BatchReport),
}

/// Read-only copy of a run for renderers.
#[derive(Debug, Clone)]
pub struct RunSnapshot {
    pub overall: u8,
    pub files: Vec<FileUploadState>,
    pub result_ids: Vec<String>,
    pub finished: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased_suffix() {
        let file = FileDescriptor::from_bytes("Notes.Final.PDF", Arc::from(&b"x"[..]));
        assert_eq!(file.extension, "pdf");
        assert_eq!(file.size, 1);
    }

    #[test]
    fn name_without_dot_keeps_whole_name() {
        assert_eq!(extension_of("README"), "readme");
        assert_eq!(extension_of(".md"), "md");
    }

    #[test]
    fn from_path_reads_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chapter.txt");
        std::fs::write(&path, b"hello world").unwrap();

        let file = FileDescriptor::from_path(&path).unwrap();
        assert_eq!(file.name, "chapter.txt");
        assert_eq!(file.size, 11);
        assert_eq!(file.extension, "txt");
        assert!(matches!(file.source, FileSource::Path(_)));
    }

    #[test]
    fn from_path_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileDescriptor::from_path(dir.path()).is_err());
    }
}
