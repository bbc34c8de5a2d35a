use std::path::{Component, Path, PathBuf};

use tracing::warn;

use super::{BackingPath, BasicMetadata, DirEntry, EntryKind, Volume};
use crate::{ModuleFsError, Result, VirtualPath};

/// A [`Volume`] exposing a directory on the host.
#[derive(Debug, Clone)]
pub struct DirVolume {
    root: PathBuf,
}

impl DirVolume {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirVolume { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map `path` onto the host, refusing any segment that isn't a plain name
    /// (`.`, `..`, drive prefixes) so lookups can't escape the root.
    fn host_path(&self, path: &VirtualPath) -> Option<PathBuf> {
        let mut host = self.root.clone();
        for segment in path.segments() {
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(_)), None) => host.push(segment),
                _ => return None,
            }
        }
        Some(host)
    }
}

impl Volume for DirVolume {
    fn metadata(&self, path: &VirtualPath) -> Option<BasicMetadata> {
        let host = self.host_path(path)?;
        std::fs::metadata(host).ok().map(BasicMetadata::from)
    }

    fn read_dir(&self, path: &VirtualPath) -> Result<Option<Vec<DirEntry>>> {
        let Some(host) = self.host_path(path) else {
            return Ok(None);
        };
        if !host.is_dir() {
            return Ok(None);
        }

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&host).map_err(|e| ModuleFsError::io(&host, e))? {
            let entry = entry.map_err(|e| ModuleFsError::io(&host, e))?;
            let Ok(name) = entry.file_name().into_string() else {
                warn!(path = %entry.path().display(), "Skipping a non UTF-8 file name");
                continue;
            };
            let file_type = entry
                .file_type()
                .map_err(|e| ModuleFsError::io(entry.path(), e))?;
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_symlink() {
                // only links to regular files are followed
                match std::fs::metadata(entry.path()) {
                    Ok(target) if target.is_file() => EntryKind::File,
                    _ => EntryKind::Symlink,
                }
            } else {
                EntryKind::File
            };
            entries.push(DirEntry { name, kind });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Some(entries))
    }

    fn read_file(&self, path: &VirtualPath) -> Result<Vec<u8>> {
        let host = self
            .host_path(path)
            .ok_or_else(|| ModuleFsError::NotFound {
                path: path.to_string(),
            })?;
        if host.is_dir() {
            return Err(ModuleFsError::NotAFile {
                path: path.to_string(),
            });
        }

        std::fs::read(&host).map_err(|error| match error.kind() {
            std::io::ErrorKind::NotFound => ModuleFsError::NotFound {
                path: path.to_string(),
            },
            _ => ModuleFsError::io(&host, error),
        })
    }

    fn backing_path(&self, path: &VirtualPath) -> BackingPath {
        let host = self
            .host_path(path)
            .unwrap_or_else(|| self.root.clone());
        BackingPath::Host(host)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn lists_sorted_and_reads() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        std::fs::write(temp.path().join("b.txt"), "b").unwrap();
        std::fs::write(temp.path().join("a.txt"), "a").unwrap();
        let volume = DirVolume::new(temp.path());

        let names: Vec<_> = volume
            .read_dir(&VirtualPath::root())
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|e| (e.name, e.kind))
            .collect();
        assert_eq!(
            names,
            [
                ("a.txt".to_string(), EntryKind::File),
                ("b.txt".to_string(), EntryKind::File),
                ("sub".to_string(), EntryKind::Directory),
            ]
        );

        assert_eq!(volume.read_file(&"/a.txt".into()).unwrap(), b"a");
        assert!(volume.metadata(&"sub".into()).unwrap().is_dir());
        assert_eq!(volume.metadata(&"b.txt".into()).unwrap().len, 1);
        assert!(volume.read_dir(&"a.txt".into()).unwrap().is_none());
    }

    #[test]
    fn cannot_escape_the_root() {
        let temp = TempDir::new().unwrap();
        let inner = temp.path().join("inner");
        std::fs::create_dir(&inner).unwrap();
        std::fs::write(temp.path().join("secret"), "nope").unwrap();
        let volume = DirVolume::new(&inner);

        assert!(volume.metadata(&"../secret".into()).is_none());
        assert!(matches!(
            volume.read_file(&"../secret".into()),
            Err(ModuleFsError::NotFound { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn links_are_classified_without_following_directories() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("dir");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("x.txt"), "x").unwrap();
        std::os::unix::fs::symlink(&dir, dir.join("loop")).unwrap();
        std::os::unix::fs::symlink(dir.join("x.txt"), dir.join("y.txt")).unwrap();
        std::os::unix::fs::symlink(dir.join("gone"), dir.join("dangling")).unwrap();
        let volume = DirVolume::new(temp.path());

        let entries: Vec<_> = volume
            .read_dir(&"dir".into())
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|e| (e.name, e.kind))
            .collect();
        assert_eq!(
            entries,
            [
                ("dangling".to_string(), EntryKind::Symlink),
                ("loop".to_string(), EntryKind::Symlink),
                ("x.txt".to_string(), EntryKind::File),
                ("y.txt".to_string(), EntryKind::File),
            ]
        );
        assert_eq!(volume.read_file(&"dir/y.txt".into()).unwrap(), b"x");
        assert_eq!(volume.read_file(&"dir/loop/x.txt".into()).unwrap(), b"x");
    }

    #[test]
    fn missing_and_directory_reads() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("dir")).unwrap();
        let volume = DirVolume::new(temp.path());

        assert!(matches!(
            volume.read_file(&"missing".into()),
            Err(ModuleFsError::NotFound { .. })
        ));
        assert!(matches!(
            volume.read_file(&"dir".into()),
            Err(ModuleFsError::NotAFile { .. })
        ));
    }
}
