use std::path::PathBuf;

use crate::glob::GlobError;

/// Convenience alias used throughout the crate.
pub type Result<T, E = ModuleFsError> = std::result::Result<T, E>;

/// Errors that may occur while working with a module's filesystem.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ModuleFsError {
    /// The filesystem was closed; no further operations are possible.
    #[error("filesystem closed")]
    Closed,
    /// The matcher syntax tag is neither `glob` nor `regex`.
    #[error("unsupported syntax \"{syntax}\"")]
    UnsupportedSyntax {
        /// The tag that was found before the `:`.
        syntax: String,
    },
    /// A matcher specification without a `syntax:` prefix.
    #[error("invalid matcher specification \"{spec}\"")]
    InvalidMatcherSpec {
        /// The full specification string.
        spec: String,
    },
    /// A glob pattern that can't be translated.
    #[error(transparent)]
    InvalidGlob(#[from] GlobError),
    /// A regular expression the engine refused to compile.
    #[error("invalid regular expression \"{pattern}\"")]
    InvalidRegex {
        /// The expression that was compiled.
        pattern: String,
        /// The underlying error.
        #[source]
        error: regex::Error,
    },
    /// A module needs at least one location.
    #[error("module \"{module}\" has no locations")]
    NoLocations {
        /// The module being constructed.
        module: String,
    },
    /// Nothing in the module backs the requested path.
    #[error("\"{path}\" not found")]
    NotFound {
        /// The virtual path being accessed.
        path: String,
    },
    /// Expected a file but found a directory.
    #[error("\"{path}\" is not a file")]
    NotAFile {
        /// The virtual path being accessed.
        path: String,
    },
    /// Unable to read from the host filesystem.
    #[error("Unable to read \"{}\"", path.display())]
    Io {
        /// The host path being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        error: std::io::Error,
    },
    /// Unable to open or read an archive.
    #[error("Unable to read the archive \"{}\"", path.display())]
    Archive {
        /// The archive being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        error: zip::result::ZipError,
    },
    /// Unable to deserialize module metadata.
    #[error("Unable to deserialize module metadata")]
    Metadata(#[source] serde_json::Error),
    /// The class index provider failed to load or scan.
    #[error("class index resolution failed")]
    ClassIndex(#[source] anyhow::Error),
    /// One or more mounted archives could not be released on close.
    #[error("{} archive(s) failed to close", failures.len())]
    Close {
        /// Each failure, in the order the archives were released.
        failures: Vec<ModuleFsError>,
    },
}

impl ModuleFsError {
    pub(crate) fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        ModuleFsError::Io {
            path: path.into(),
            error,
        }
    }

    pub(crate) fn archive(path: impl Into<PathBuf>, error: zip::result::ZipError) -> Self {
        ModuleFsError::Archive {
            path: path.into(),
            error,
        }
    }
}
