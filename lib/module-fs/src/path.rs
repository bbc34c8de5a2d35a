//! Normalized paths inside a module's virtual namespace.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// The only separator understood by the virtual namespace.
pub const SEPARATOR: char = '/';

/// An immutable, normalized location inside a module's unified namespace.
///
/// Paths are stored as a sequence of non-empty segments plus an "absolute"
/// flag. Repeated separators collapse and surrounding whitespace on each
/// fragment is ignored, so any input string is accepted.
///
/// Two paths are equal when their segments and absolute flag are equal,
/// regardless of how they were spelled originally.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualPath {
    absolute: bool,
    segments: Vec<String>,
}

impl VirtualPath {
    /// Build a path from one or more raw fragments.
    ///
    /// The result is absolute if the first fragment that is non-empty after
    /// trimming starts with `/`.
    ///
    /// ```
    /// use module_fs::VirtualPath;
    ///
    /// let a = VirtualPath::new(["a", "b/c"]);
    /// let b = VirtualPath::new(["a//b///c"]);
    /// assert_eq!(a, b);
    /// assert_eq!(VirtualPath::new(["/x ", "y"]).to_string(), "/x/y");
    /// ```
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut absolute = None;
        let mut segments = Vec::new();

        for part in parts {
            let part = part.as_ref().trim();
            if part.is_empty() {
                continue;
            }
            absolute.get_or_insert(part.starts_with(SEPARATOR));
            segments.extend(
                part.split(SEPARATOR)
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_owned),
            );
        }

        VirtualPath {
            absolute: absolute.unwrap_or(false),
            segments,
        }
    }

    /// Normalize a single path string.
    pub fn parse(path: &str) -> Self {
        VirtualPath::new([path])
    }

    /// The root of the namespace, `/`.
    pub fn root() -> Self {
        VirtualPath {
            absolute: true,
            segments: Vec::new(),
        }
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Is this the absolute root, `/`?
    pub fn is_root(&self) -> bool {
        self.absolute && self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The last segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The path without its last segment, or `None` if there are no segments.
    pub fn parent(&self) -> Option<VirtualPath> {
        let (_, rest) = self.segments.split_last()?;
        Some(VirtualPath {
            absolute: self.absolute,
            segments: rest.to_vec(),
        })
    }

    /// Append `other` to this path. Joining an absolute path replaces `self`,
    /// the same way [`std::path::Path::join`] behaves.
    pub fn join(&self, other: &VirtualPath) -> VirtualPath {
        if other.absolute {
            return other.clone();
        }
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        VirtualPath {
            absolute: self.absolute,
            segments,
        }
    }

    /// Append a raw fragment, normalizing it first.
    pub fn child(&self, name: &str) -> VirtualPath {
        let mut segments = self.segments.clone();
        segments.extend(
            name.split(SEPARATOR)
                .filter(|segment| !segment.is_empty())
                .map(str::to_owned),
        );
        VirtualPath {
            absolute: self.absolute,
            segments,
        }
    }

    /// Segment-wise prefix test; `/a/bc` does not start with `/a/b`.
    pub fn starts_with(&self, prefix: &VirtualPath) -> bool {
        self.absolute == prefix.absolute && self.segments.starts_with(&prefix.segments)
    }

    /// The same segments, anchored at the root.
    pub fn to_absolute(&self) -> VirtualPath {
        VirtualPath {
            absolute: true,
            segments: self.segments.clone(),
        }
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("/")?;
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl fmt::Debug for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VirtualPath")
            .field(&self.to_string())
            .finish()
    }
}

impl FromStr for VirtualPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(VirtualPath::parse(s))
    }
}

impl From<&str> for VirtualPath {
    fn from(value: &str) -> Self {
        VirtualPath::parse(value)
    }
}

impl From<String> for VirtualPath {
    fn from(value: String) -> Self {
        VirtualPath::parse(&value)
    }
}
