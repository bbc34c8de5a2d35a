//! `syntax:pattern` matchers over virtual paths.

use std::fmt;

use regex::Regex;

use crate::glob::glob_to_regex;
use crate::{ModuleFsError, Result, VirtualPath};

/// The pattern languages a [`PathMatcher`] understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatcherSyntax {
    Glob,
    Regex,
}

impl MatcherSyntax {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatcherSyntax::Glob => "glob",
            MatcherSyntax::Regex => "regex",
        }
    }
}

impl fmt::Display for MatcherSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled predicate over the string form of a [`VirtualPath`].
///
/// Both syntaxes must match the whole path, not a substring of it.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    syntax: MatcherSyntax,
    pattern: String,
    regex: Regex,
}

impl PathMatcher {
    /// Parse a `glob:<pattern>` or `regex:<pattern>` specification.
    ///
    /// Only the first `:` separates the syntax from the pattern, so the
    /// pattern itself may contain colons.
    pub fn new(spec: &str) -> Result<Self> {
        let (syntax, pattern) =
            spec.split_once(':')
                .ok_or_else(|| ModuleFsError::InvalidMatcherSpec {
                    spec: spec.to_string(),
                })?;

        let syntax = match syntax {
            "glob" => MatcherSyntax::Glob,
            "regex" => MatcherSyntax::Regex,
            other => {
                return Err(ModuleFsError::UnsupportedSyntax {
                    syntax: other.to_string(),
                });
            }
        };

        PathMatcher::with_syntax(syntax, pattern)
    }

    pub fn glob(pattern: &str) -> Result<Self> {
        PathMatcher::with_syntax(MatcherSyntax::Glob, pattern)
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        PathMatcher::with_syntax(MatcherSyntax::Regex, pattern)
    }

    pub fn with_syntax(syntax: MatcherSyntax, pattern: &str) -> Result<Self> {
        let expression = match syntax {
            MatcherSyntax::Glob => glob_to_regex(pattern)?,
            MatcherSyntax::Regex => format!("^(?:{pattern})$"),
        };
        let regex = Regex::new(&expression).map_err(|error| ModuleFsError::InvalidRegex {
            pattern: expression,
            error,
        })?;

        Ok(PathMatcher {
            syntax,
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn syntax(&self) -> MatcherSyntax {
        self.syntax
    }

    /// The pattern as written, without the syntax prefix.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The anchored expression the pattern was compiled to.
    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }

    pub fn matches(&self, path: &VirtualPath) -> bool {
        self.matches_str(&path.to_string())
    }

    pub fn matches_str(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

impl fmt::Display for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.syntax, self.pattern)
    }
}

/// A predicate deciding whether a path is accepted during enumeration.
///
/// Implemented by [`PathMatcher`], [`AcceptAll`] and any
/// `Fn(&VirtualPath) -> bool` closure.
pub trait PathFilter {
    fn accept(&self, path: &VirtualPath) -> bool;
}

impl PathFilter for PathMatcher {
    fn accept(&self, path: &VirtualPath) -> bool {
        self.matches(path)
    }
}

impl<F> PathFilter for F
where
    F: Fn(&VirtualPath) -> bool,
{
    fn accept(&self, path: &VirtualPath) -> bool {
        self(path)
    }
}

/// A filter that accepts every path.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl PathFilter for AcceptAll {
    fn accept(&self, _path: &VirtualPath) -> bool {
        true
    }
}
