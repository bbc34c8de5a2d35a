use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use semver::Version;
use tracing::{debug, error};

use crate::class_index::{
    ClassIndexFragment, ClassIndexProvider, ClassIndexSource, CLASS_INDEX_CACHE_FILE,
};
use crate::matcher::{AcceptAll, PathFilter, PathMatcher};
use crate::{
    Location, ModuleFileSystem, ModuleFsError, ModuleMetadata, Name, Result, VirtualPath,
};

/// A named, versioned unit of content spread over one or more [`Location`]s.
///
/// Two modules are the same module when their id and version match,
/// regardless of where their content lives or what else the metadata says.
pub struct Module {
    metadata: ModuleMetadata,
    fs: ModuleFileSystem,
    code: Option<Arc<dyn ClassIndexProvider>>,
    class_index: OnceCell<Arc<ClassIndexFragment>>,
}

impl Module {
    /// Create a module that only carries assets.
    pub fn new(locations: Vec<Location>, metadata: ModuleMetadata) -> Result<Self> {
        Module::from_file_system(ModuleFileSystem::new(locations), metadata, None)
    }

    /// Create a module carrying executable code, whose types are discovered
    /// through `provider`.
    pub fn with_code(
        locations: Vec<Location>,
        metadata: ModuleMetadata,
        provider: Arc<dyn ClassIndexProvider>,
    ) -> Result<Self> {
        Module::from_file_system(ModuleFileSystem::new(locations), metadata, Some(provider))
    }

    /// Create a module over an already configured filesystem.
    pub fn from_file_system(
        fs: ModuleFileSystem,
        metadata: ModuleMetadata,
        code: Option<Arc<dyn ClassIndexProvider>>,
    ) -> Result<Self> {
        if fs.locations().is_empty() {
            return Err(ModuleFsError::NoLocations {
                module: format!("{}-{}", metadata.id, metadata.version),
            });
        }

        Ok(Module {
            metadata,
            fs,
            code,
            class_index: OnceCell::new(),
        })
    }

    pub fn id(&self) -> &Name {
        &self.metadata.id
    }

    pub fn version(&self) -> &Version {
        &self.metadata.version
    }

    pub fn metadata(&self) -> &ModuleMetadata {
        &self.metadata
    }

    pub fn locations(&self) -> &[Location] {
        self.fs.locations()
    }

    pub fn required_permissions(&self) -> &BTreeSet<String> {
        &self.metadata.required_permissions
    }

    pub fn file_system(&self) -> &ModuleFileSystem {
        &self.fs
    }

    pub fn is_code_module(&self) -> bool {
        self.code.is_some()
    }

    /// Every file in the module.
    pub fn find_files(&self) -> Result<Vec<VirtualPath>> {
        self.find_files_in(&VirtualPath::root(), &AcceptAll, &AcceptAll)
    }

    /// Every file whose absolute path matches the glob `pattern`.
    pub fn find_files_glob(&self, pattern: &str) -> Result<Vec<VirtualPath>> {
        self.fs.ensure_open()?;
        let matcher = PathMatcher::glob(pattern)?;
        self.find_files_in(&VirtualPath::root(), &AcceptAll, &matcher)
    }

    /// Every file matching a `glob:` or `regex:` specification.
    pub fn find_files_matching(&self, spec: &str) -> Result<Vec<VirtualPath>> {
        let matcher = self.fs.path_matcher(spec)?;
        self.find_files_in(&VirtualPath::root(), &AcceptAll, &matcher)
    }

    pub fn find_files_in(
        &self,
        root: &VirtualPath,
        descend: &dyn PathFilter,
        report: &dyn PathFilter,
    ) -> Result<Vec<VirtualPath>> {
        self.fs.find_files(root, descend, report)
    }

    /// The class index of this module.
    ///
    /// Locations are searched in order for a precomputed
    /// [`CLASS_INDEX_CACHE_FILE`]; the first one that loads is used. If none
    /// does, the provider scans the module. Either way the result is computed
    /// once and shared by every later call.
    ///
    /// # Panics
    ///
    /// If this isn't a code module (see [`Module::is_code_module`]).
    pub fn resolve_class_index(&self) -> Result<Arc<ClassIndexFragment>> {
        let Some(provider) = &self.code else {
            panic!("{self} does not carry code, it has no class index");
        };
        self.fs.ensure_open()?;

        self.class_index
            .get_or_try_init(|| {
                let fragment = match self.load_precomputed(provider.as_ref())? {
                    Some(fragment) => fragment,
                    None => self.scan(provider.as_ref())?,
                };
                Ok(Arc::new(fragment))
            })
            .cloned()
    }

    fn load_precomputed(
        &self,
        provider: &dyn ClassIndexProvider,
    ) -> Result<Option<ClassIndexFragment>> {
        let cache = VirtualPath::root().child(CLASS_INDEX_CACHE_FILE);

        for (index, location) in self.locations().iter().enumerate() {
            let Some(volume) = self.fs.location_volume(index)? else {
                continue;
            };
            if !volume.metadata(&cache).is_some_and(|meta| meta.is_file()) {
                continue;
            }

            let loaded = volume
                .read_file(&cache)
                .map_err(anyhow::Error::from)
                .and_then(|bytes| provider.load(&bytes));

            match loaded {
                Ok(data) => {
                    debug!(module = %self, location = %location, "Loaded a precomputed class index");
                    let source = ClassIndexSource::Precomputed {
                        location: location.path().to_path_buf(),
                    };
                    return Ok(Some(ClassIndexFragment::new(self.to_string(), source, data)));
                }
                Err(e) => {
                    error!(
                        module = %self,
                        location = %location,
                        error = &*e as &dyn std::error::Error,
                        "Unable to load the precomputed class index",
                    );
                }
            }
        }

        Ok(None)
    }

    fn scan(&self, provider: &dyn ClassIndexProvider) -> Result<ClassIndexFragment> {
        debug!(module = %self, "Scanning for a class index");
        let data = provider
            .scan(self.locations())
            .map_err(ModuleFsError::ClassIndex)?;
        Ok(ClassIndexFragment::new(
            self.to_string(),
            ClassIndexSource::Scanned,
            data,
        ))
    }
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id() && self.version() == other.version()
    }
}

impl Eq for Module {}

impl Hash for Module {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
        self.version().hash(state);
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.id(), self.version())
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("id", self.id())
            .field("version", self.version())
            .field("locations", &self.locations())
            .field("code", &self.code.is_some())
            .finish_non_exhaustive()
    }
}
