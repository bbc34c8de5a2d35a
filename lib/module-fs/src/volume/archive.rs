use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};
use zip::ZipArchive;

use super::{
    ArchiveOpener, BackingPath, BasicMetadata, DirEntry, EntryKind, Volume,
};
use crate::{Location, ModuleFsError, Result, VirtualPath};

/// Upper bound on the buffer reserved up front when reading an entry.
const MAX_PREALLOCATION: u64 = 1 << 20;

#[derive(Debug, Clone, Copy)]
struct ZipEntry {
    kind: EntryKind,
    len: u64,
    index: Option<usize>,
}

impl ZipEntry {
    const DIRECTORY: ZipEntry = ZipEntry {
        kind: EntryKind::Directory,
        len: 0,
        index: None,
    };
}

/// A read-only [`Volume`] over the contents of a zip archive.
///
/// The central directory is indexed once when the archive is opened,
/// including directories that are only implied by the files inside them.
/// File contents are decompressed on every read.
pub struct ZipVolume {
    path: PathBuf,
    archive: Mutex<Option<ZipArchive<BufReader<File>>>>,
    entries: BTreeMap<VirtualPath, ZipEntry>,
}

impl ZipVolume {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ModuleFsError::io(path, e))?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| ModuleFsError::archive(path, e))?;

        let mut entries = BTreeMap::new();
        entries.insert(VirtualPath::root(), ZipEntry::DIRECTORY);

        for index in 0..archive.len() {
            let file = archive
                .by_index_raw(index)
                .map_err(|e| ModuleFsError::archive(path, e))?;
            let entry_path = VirtualPath::parse(file.name()).to_absolute();
            if entry_path.is_root() {
                continue;
            }

            let mut ancestor = entry_path.parent();
            while let Some(dir) = ancestor {
                if dir.is_root() {
                    break;
                }
                entries.entry(dir.clone()).or_insert(ZipEntry::DIRECTORY);
                ancestor = dir.parent();
            }

            let entry = if file.is_dir() {
                ZipEntry::DIRECTORY
            } else {
                ZipEntry {
                    kind: EntryKind::File,
                    len: file.size(),
                    index: Some(index),
                }
            };
            trace!(archive = %path.display(), entry = %entry_path, "Indexed archive entry");
            entries.insert(entry_path, entry);
        }

        debug!(
            archive = %path.display(),
            entries = entries.len(),
            "Opened archive",
        );

        Ok(ZipVolume {
            path: path.to_path_buf(),
            archive: Mutex::new(Some(archive)),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entry(&self, path: &VirtualPath) -> Option<&ZipEntry> {
        self.entries.get(&path.to_absolute())
    }
}

impl fmt::Debug for ZipVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipVolume")
            .field("path", &self.path)
            .field("entries", &self.entries.len())
            .field("open", &self.archive.lock().is_some())
            .finish()
    }
}

impl Volume for ZipVolume {
    fn metadata(&self, path: &VirtualPath) -> Option<BasicMetadata> {
        self.entry(path).map(|entry| BasicMetadata {
            kind: entry.kind,
            len: entry.len,
            modified: None,
            created: None,
        })
    }

    fn read_dir(&self, path: &VirtualPath) -> Result<Option<Vec<DirEntry>>> {
        let dir = path.to_absolute();
        match self.entries.get(&dir) {
            Some(entry) if entry.kind == EntryKind::Directory => {}
            _ => return Ok(None),
        }

        let depth = dir.segments().len() + 1;
        let children = self
            .entries
            .range((Bound::Excluded(&dir), Bound::Unbounded))
            .take_while(|(child, _)| child.starts_with(&dir))
            .filter(|(child, _)| child.segments().len() == depth)
            .filter_map(|(child, entry)| {
                Some(DirEntry {
                    name: child.file_name()?.to_string(),
                    kind: entry.kind,
                })
            })
            .collect();

        Ok(Some(children))
    }

    fn read_file(&self, path: &VirtualPath) -> Result<Vec<u8>> {
        let entry = self.entry(path).ok_or_else(|| ModuleFsError::NotFound {
            path: path.to_string(),
        })?;
        let index = entry.index.ok_or_else(|| ModuleFsError::NotAFile {
            path: path.to_string(),
        })?;

        let mut archive = self.archive.lock();
        let archive = archive.as_mut().ok_or(ModuleFsError::Closed)?;
        let mut file = archive
            .by_index(index)
            .map_err(|e| ModuleFsError::archive(&self.path, e))?;

        // the declared size is untrusted input
        let capacity = entry.len.min(MAX_PREALLOCATION) as usize;
        let mut bytes = Vec::with_capacity(capacity);
        file.read_to_end(&mut bytes)
            .map_err(|e| ModuleFsError::io(&self.path, e))?;
        Ok(bytes)
    }

    fn backing_path(&self, path: &VirtualPath) -> BackingPath {
        BackingPath::Archive {
            archive: self.path.clone(),
            entry: path.to_absolute().to_string(),
        }
    }

    fn close(&self) -> Result<()> {
        if self.archive.lock().take().is_some() {
            debug!(archive = %self.path.display(), "Closed archive");
        }
        Ok(())
    }
}

/// Opens archive locations as [`ZipVolume`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipOpener;

impl ArchiveOpener for ZipOpener {
    fn open(&self, location: &Location) -> Result<Arc<dyn Volume>> {
        Ok(Arc::new(ZipVolume::open(location.path())?))
    }
}
