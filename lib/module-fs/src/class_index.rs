//! Discovery of the types declared by a code module.
//!
//! The crate never looks inside a class index. Building one (scanning) and
//! decoding a precomputed one (loading) are both delegated to a
//! [`ClassIndexProvider`]; the result is carried around as an opaque
//! [`ClassIndexFragment`].

use std::any::Any;
use std::fmt;
use std::path::PathBuf;

use crate::Location;

/// The reserved entry, at the root of a location, holding a precomputed
/// class index.
pub const CLASS_INDEX_CACHE_FILE: &str = "class-index.cache";

/// Builds and decodes class indexes on behalf of a module.
pub trait ClassIndexProvider: fmt::Debug + Send + Sync {
    /// Decode a precomputed index read from [`CLASS_INDEX_CACHE_FILE`].
    fn load(&self, bytes: &[u8]) -> anyhow::Result<Box<dyn Any + Send + Sync>>;

    /// Scan every location of a module for declared types.
    fn scan(&self, locations: &[Location]) -> anyhow::Result<Box<dyn Any + Send + Sync>>;
}

/// How a fragment was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassIndexSource {
    /// Loaded from the cache file inside this location.
    Precomputed { location: PathBuf },
    /// Built by the provider's scan.
    Scanned,
}

/// The class index of a single module.
pub struct ClassIndexFragment {
    module: String,
    source: ClassIndexSource,
    data: Box<dyn Any + Send + Sync>,
}

impl ClassIndexFragment {
    pub fn new(
        module: impl Into<String>,
        source: ClassIndexSource,
        data: Box<dyn Any + Send + Sync>,
    ) -> Self {
        ClassIndexFragment {
            module: module.into(),
            source,
            data,
        }
    }

    /// The `id-version` of the module this fragment describes.
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn source(&self) -> &ClassIndexSource {
        &self.source
    }

    pub fn is_precomputed(&self) -> bool {
        matches!(self.source, ClassIndexSource::Precomputed { .. })
    }

    /// The provider's payload, if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref()
    }
}

impl fmt::Debug for ClassIndexFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassIndexFragment")
            .field("module", &self.module)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
