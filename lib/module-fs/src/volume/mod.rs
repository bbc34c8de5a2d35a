//! Backing stores that contribute content to a module.
//!
//! Every [`Location`] is exposed through a [`Volume`]: plain directories by
//! [`DirVolume`], archives by whatever an [`ArchiveOpener`] produces
//! ([`ZipVolume`] by default). Volumes are read-only.

mod archive;
mod dir;

use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

pub use self::{
    archive::{ZipOpener, ZipVolume},
    dir::DirVolume,
};
use crate::{Location, Result, VirtualPath};

/// What a directory entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
    /// A symbolic link to a directory, or a dangling one. Listed, but never
    /// walked into. Links to files are reported as [`EntryKind::File`].
    Symlink,
}

/// The "basic" attribute view: existence, kind, size and timestamps.
///
/// Archive backends can't be assumed to provide anything richer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicMetadata {
    pub kind: EntryKind,
    pub len: u64,
    pub modified: Option<SystemTime>,
    pub created: Option<SystemTime>,
}

impl BasicMetadata {
    pub fn directory() -> Self {
        BasicMetadata {
            kind: EntryKind::Directory,
            len: 0,
            modified: None,
            created: None,
        }
    }

    pub fn file(len: u64) -> Self {
        BasicMetadata {
            kind: EntryKind::File,
            len,
            modified: None,
            created: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

impl From<std::fs::Metadata> for BasicMetadata {
    fn from(meta: std::fs::Metadata) -> Self {
        BasicMetadata {
            kind: if meta.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            },
            len: meta.len(),
            modified: meta.modified().ok(),
            created: meta.created().ok(),
        }
    }
}

/// A single child of a directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Where a virtual path actually lives on the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BackingPath {
    /// A file or directory on the host filesystem.
    Host(PathBuf),
    /// An entry inside an archive file.
    Archive {
        archive: PathBuf,
        /// The entry's path inside the archive, always absolute.
        entry: String,
    },
}

/// A read-only view of one location, rooted at the location's own root.
///
/// Paths handed to a volume are interpreted relative to that root whether or
/// not they are absolute. Absence is reported as `None`/`Ok(None)`; errors are
/// reserved for I/O failures.
pub trait Volume: Debug + Send + Sync {
    /// Basic attributes of `path`, or `None` if it doesn't exist.
    fn metadata(&self, path: &VirtualPath) -> Option<BasicMetadata>;

    /// The children of the directory at `path`, sorted by name, or `None` if
    /// `path` is not a directory.
    fn read_dir(&self, path: &VirtualPath) -> Result<Option<Vec<DirEntry>>>;

    /// The full contents of the file at `path`.
    fn read_file(&self, path: &VirtualPath) -> Result<Vec<u8>>;

    /// The host-level location backing `path`.
    fn backing_path(&self, path: &VirtualPath) -> BackingPath;

    /// Release any resources held by the volume.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// The host primitive that opens an archive [`Location`] as a nested
/// filesystem.
pub trait ArchiveOpener: Debug + Send + Sync {
    fn open(&self, location: &Location) -> Result<Arc<dyn Volume>>;
}
