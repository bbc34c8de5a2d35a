//! The composite, read-only filesystem presenting every location of a module
//! as one namespace.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::finder::{FileFinder, FinderFs};
use crate::matcher::{PathFilter, PathMatcher};
use crate::volume::{
    ArchiveOpener, BackingPath, BasicMetadata, DirEntry, DirVolume, EntryKind, Volume, ZipOpener,
};
use crate::{Location, LocationKind, ModuleFsError, Result, VirtualPath};

const SEPARATOR: &str = "/";
const SUPPORTED_FILE_ATTRIBUTE_VIEWS: &[&str] = &["basic"];

/// The first location containing a virtual path, and where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    /// Index of the winning location, in declaration order.
    pub location: usize,
    pub kind: EntryKind,
    pub backing: BackingPath,
}

impl ResolvedEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

enum Slot {
    Directory(Arc<dyn Volume>),
    Archive,
}

/// A read-only filesystem composed from an ordered list of [`Location`]s.
///
/// Directory locations are exposed directly. Archive locations are mounted
/// the first time a lookup reaches them, through the configured
/// [`ArchiveOpener`], and each one is opened at most once for the lifetime of
/// the filesystem. A failed mount is remembered and the location contributes
/// nothing from then on.
///
/// When several locations contain the same path the first one, in
/// declaration order, wins. Directory listings are the union of every
/// location's listing of that directory.
///
/// After [`ModuleFileSystem::close`] every operation touching the backing
/// stores fails with [`ModuleFsError::Closed`].
pub struct ModuleFileSystem {
    locations: Vec<Location>,
    slots: Vec<Slot>,
    opener: Arc<dyn ArchiveOpener>,
    mounts: Mutex<BTreeMap<usize, Option<Arc<dyn Volume>>>>,
    open: AtomicBool,
}

impl ModuleFileSystem {
    /// Compose `locations`, opening archives as zip files.
    pub fn new(locations: Vec<Location>) -> Self {
        ModuleFileSystem::with_opener(locations, Arc::new(ZipOpener))
    }

    pub fn with_opener(locations: Vec<Location>, opener: Arc<dyn ArchiveOpener>) -> Self {
        let slots = locations
            .iter()
            .map(|location| match location.kind() {
                LocationKind::Directory => {
                    Slot::Directory(Arc::new(DirVolume::new(location.path())) as Arc<dyn Volume>)
                }
                LocationKind::Archive => Slot::Archive,
            })
            .collect();

        ModuleFileSystem {
            locations,
            slots,
            opener,
            mounts: Mutex::new(BTreeMap::new()),
            open: AtomicBool::new(true),
        }
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn separator(&self) -> &'static str {
        SEPARATOR
    }

    pub fn is_read_only(&self) -> bool {
        true
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub fn root_directories(&self) -> Vec<VirtualPath> {
        vec![VirtualPath::root()]
    }

    pub fn supported_file_attribute_views(&self) -> &'static [&'static str] {
        SUPPORTED_FILE_ATTRIBUTE_VIEWS
    }

    /// Build a [`VirtualPath`] from raw fragments.
    pub fn path<I, S>(&self, parts: I) -> VirtualPath
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        VirtualPath::new(parts)
    }

    /// Compile a `glob:` or `regex:` matcher specification.
    pub fn path_matcher(&self, spec: &str) -> Result<PathMatcher> {
        self.ensure_open()?;
        PathMatcher::new(spec)
    }

    /// Find the first location that contains `path`.
    ///
    /// Returns `Ok(None)` when no location does; that is not an error.
    pub fn resolve(&self, path: &VirtualPath) -> Result<Option<ResolvedEntry>> {
        self.ensure_open()?;
        for index in 0..self.locations.len() {
            let Some(volume) = self.volume(index) else {
                continue;
            };
            if let Some(meta) = volume.metadata(path) {
                return Ok(Some(ResolvedEntry {
                    location: index,
                    kind: meta.kind,
                    backing: volume.backing_path(path),
                }));
            }
        }
        Ok(None)
    }

    pub fn exists(&self, path: &VirtualPath) -> Result<bool> {
        Ok(self.resolve(path)?.is_some())
    }

    pub fn is_dir(&self, path: &VirtualPath) -> Result<bool> {
        Ok(self.metadata(path)?.is_some_and(|meta| meta.is_dir()))
    }

    /// Basic attributes of `path` as seen through the winning location.
    pub fn metadata(&self, path: &VirtualPath) -> Result<Option<BasicMetadata>> {
        self.ensure_open()?;
        Ok((0..self.locations.len())
            .filter_map(|index| self.volume(index))
            .find_map(|volume| volume.metadata(path)))
    }

    /// Read the contents of the file at `path` from the winning location.
    pub fn read(&self, path: &VirtualPath) -> Result<Vec<u8>> {
        self.ensure_open()?;
        for index in 0..self.locations.len() {
            let Some(volume) = self.volume(index) else {
                continue;
            };
            match volume.metadata(path) {
                Some(meta) if meta.is_file() => return volume.read_file(path),
                Some(_) => {
                    return Err(ModuleFsError::NotAFile {
                        path: path.to_string(),
                    });
                }
                None => {}
            }
        }
        Err(ModuleFsError::NotFound {
            path: path.to_string(),
        })
    }

    /// List the directory at `path`, merged across every location and
    /// sorted by name.
    ///
    /// If a name appears in several locations the entry from the first one
    /// wins. A path that isn't a directory anywhere lists as empty.
    pub fn read_dir(&self, path: &VirtualPath) -> Result<Vec<DirEntry>> {
        self.ensure_open()?;
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for index in 0..self.locations.len() {
            let Some(volume) = self.volume(index) else {
                continue;
            };
            let listing = match volume.read_dir(path) {
                Ok(Some(listing)) => listing,
                Ok(None) => continue,
                Err(e) => {
                    warn!(
                        location = %self.locations[index],
                        path = %path,
                        error = &e as &dyn std::error::Error,
                        "Unable to list a directory, skipping the location",
                    );
                    continue;
                }
            };
            for entry in listing {
                if seen.insert(entry.name.clone()) {
                    entries.push(entry);
                }
            }
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Enumerate files under `root`; see [`FileFinder`].
    pub fn find_files(
        &self,
        root: &VirtualPath,
        descend: &dyn PathFilter,
        report: &dyn PathFilter,
    ) -> Result<Vec<VirtualPath>> {
        self.ensure_open()?;
        FileFinder::new(self)
            .with_descend_filter(descend)
            .with_report_filter(report)
            .find(root)
    }

    /// Has the archive at location `index` been mounted successfully?
    pub fn is_mounted(&self, index: usize) -> bool {
        matches!(self.mounts.lock().get(&index), Some(Some(_)))
    }

    /// Close the filesystem and release every mounted archive.
    ///
    /// Every archive is released even if some fail; the failures are
    /// returned together as [`ModuleFsError::Close`]. Closing an already
    /// closed filesystem does nothing.
    pub fn close(&self) -> Result<()> {
        if !self.open.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        let mounts = std::mem::take(&mut *self.mounts.lock());
        let mut failures = Vec::new();

        for (index, volume) in mounts {
            let Some(volume) = volume else {
                continue;
            };
            if let Err(e) = volume.close() {
                error!(
                    location = %self.locations[index],
                    error = &e as &dyn std::error::Error,
                    "Unable to release a mounted archive",
                );
                failures.push(e);
            }
        }

        debug!(locations = self.locations.len(), "Closed module filesystem");

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ModuleFsError::Close { failures })
        }
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(ModuleFsError::Closed)
        }
    }

    /// The volume backing location `index`, mounting it if necessary.
    pub(crate) fn location_volume(&self, index: usize) -> Result<Option<Arc<dyn Volume>>> {
        self.ensure_open()?;
        Ok(self.volume(index))
    }

    fn volume(&self, index: usize) -> Option<Arc<dyn Volume>> {
        match self.slots.get(index)? {
            Slot::Directory(volume) => Some(Arc::clone(volume)),
            Slot::Archive => self.mount(index),
        }
    }

    /// Get-or-create the mount for an archive location. The lock is held
    /// across the open so concurrent callers observe a single mount.
    fn mount(&self, index: usize) -> Option<Arc<dyn Volume>> {
        let mut mounts = self.mounts.lock();
        if let Some(mounted) = mounts.get(&index) {
            return mounted.clone();
        }
        // close() may have drained the cache while we waited for the lock
        if !self.is_open() {
            return None;
        }

        let location = &self.locations[index];
        debug!(location = %location, "Mounting archive");
        let mounted = match self.opener.open(location) {
            Ok(volume) => Some(volume),
            Err(e) => {
                warn!(
                    location = %location,
                    error = &e as &dyn std::error::Error,
                    "Unable to mount archive, it will contribute nothing",
                );
                None
            }
        };

        mounts.insert(index, mounted.clone());
        mounted
    }
}

impl FinderFs for ModuleFileSystem {
    fn entry_kind(&self, path: &VirtualPath) -> Result<Option<EntryKind>> {
        Ok(self.metadata(path)?.map(|meta| meta.kind))
    }

    fn list(&self, path: &VirtualPath) -> Result<Vec<DirEntry>> {
        self.read_dir(path)
    }
}

impl fmt::Debug for ModuleFileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleFileSystem")
            .field("locations", &self.locations)
            .field("opener", &self.opener)
            .field("mounted", &self.mounts.lock().len())
            .field("open", &self.is_open())
            .finish()
    }
}

impl Drop for ModuleFileSystem {
    fn drop(&mut self) {
        // failures have already been logged by close()
        let _ = self.close();
    }
}
