//! A read-only virtual filesystem over the content of versioned modules.
//!
//! A [`Module`] is backed by an ordered list of [`Location`]s, each one a
//! directory or an archive on the host. The [`ModuleFileSystem`] presents
//! them as a single tree addressed by [`VirtualPath`]s, where the first
//! location containing a path shadows the others. Archives are mounted
//! lazily, the first time something looks inside them.
//!
//! ```no_run
//! use module_fs::{Location, Module, ModuleMetadata};
//!
//! # fn main() -> Result<(), module_fs::ModuleFsError> {
//! let metadata = ModuleMetadata::from_file("core/module.json")?;
//! let module = Module::new(
//!     vec![Location::directory("core"), Location::archive("core-extras.zip")],
//!     metadata,
//! )?;
//!
//! for texture in module.find_files_glob("/textures/**/*.png")? {
//!     let bytes = module.file_system().read(&texture)?;
//!     println!("{texture}: {} bytes", bytes.len());
//! }
//! # Ok(())
//! # }
//! ```

mod class_index;
mod error;
mod filesystem;
mod finder;
pub mod glob;
mod location;
mod matcher;
mod metadata;
mod module;
mod name;
mod path;
pub mod volume;

pub use crate::{
    class_index::{
        ClassIndexFragment, ClassIndexProvider, ClassIndexSource, CLASS_INDEX_CACHE_FILE,
    },
    error::{ModuleFsError, Result},
    filesystem::{ModuleFileSystem, ResolvedEntry},
    finder::{FileFinder, FinderFs},
    location::{Location, LocationKind},
    matcher::{AcceptAll, MatcherSyntax, PathFilter, PathMatcher},
    metadata::ModuleMetadata,
    module::Module,
    name::Name,
    path::VirtualPath,
    volume::{ArchiveOpener, BackingPath, BasicMetadata, DirEntry, EntryKind, Volume},
};
