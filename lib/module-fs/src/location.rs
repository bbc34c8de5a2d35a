use std::fmt;
use std::path::{Path, PathBuf};

/// How a [`Location`] is backed on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationKind {
    /// A plain directory, exposed as-is.
    Directory,
    /// A single archive file, mounted lazily as a nested filesystem.
    Archive,
}

/// One physical root contributing content to a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    path: PathBuf,
    kind: LocationKind,
}

impl Location {
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Location {
            path: path.into(),
            kind: LocationKind::Directory,
        }
    }

    pub fn archive(path: impl Into<PathBuf>) -> Self {
        Location {
            path: path.into(),
            kind: LocationKind::Archive,
        }
    }

    /// Classify `path` by looking at the host filesystem: directories are
    /// [`LocationKind::Directory`], anything else is treated as an archive.
    pub fn detect(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            Location::directory(path)
        } else {
            Location::archive(path)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> LocationKind {
        self.kind
    }

    pub fn is_archive(&self) -> bool {
        self.kind == LocationKind::Archive
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
