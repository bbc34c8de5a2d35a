use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::{ModuleFsError, Name, Result};

/// The descriptor of a module, typically read from a `module.json` file.
///
/// Only the identity and the declared permissions are interpreted here.
/// Anything else in the descriptor is kept verbatim in [`ModuleMetadata::extra`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleMetadata {
    pub id: Name,
    pub version: Version,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Permissions the module's code needs to be granted by the host.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub required_permissions: BTreeSet<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ModuleMetadata {
    pub fn new(id: impl Into<Name>, version: Version) -> Self {
        ModuleMetadata {
            id: id.into(),
            version,
            display_name: None,
            description: None,
            required_permissions: BTreeSet::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_required_permission(mut self, permission: impl Into<String>) -> Self {
        self.required_permissions.insert(permission.into());
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(ModuleFsError::Metadata)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        serde_json::from_reader(reader).map_err(ModuleFsError::Metadata)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| ModuleFsError::io(path, e))?;
        ModuleMetadata::from_reader(std::io::BufReader::new(file))
    }
}
