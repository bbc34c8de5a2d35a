use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A module identifier, compared without regard to ASCII case.
///
/// The original spelling is kept for display and serialization.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Name {
    original: String,
    normalized: String,
}

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        let original = name.into();
        let normalized = original.to_ascii_lowercase();
        Name {
            original,
            normalized,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// The lowercase form used for comparisons.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized.cmp(&other.normalized)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.original)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name::new(value)
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

impl From<Name> for String {
    fn from(value: Name) -> Self {
        value.original
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn case_is_ignored_but_preserved() {
        let a = Name::new("CoreAssets");
        let b = Name::new("coreassets");

        assert_eq!(a, b);
        assert_eq!(a.to_string(), "CoreAssets");
        assert_eq!(a.normalized(), "coreassets");

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn serializes_as_a_plain_string() {
        let name: Name = serde_json::from_str("\"Engine\"").unwrap();
        assert_eq!(name.as_str(), "Engine");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"Engine\"");
    }
}
