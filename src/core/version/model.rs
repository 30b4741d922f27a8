use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::LauncherError;

/// Supported loaders.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LoaderType {
    #[default]
    Vanilla,
    Forge,
    Fabric,
}

impl fmt::Display for LoaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderType::Vanilla => write!(f, "vanilla"),
            LoaderType::Forge => write!(f, "forge"),
            LoaderType::Fabric => write!(f, "fabric"),
        }
    }
}

impl FromStr for LoaderType {
    type Err = LauncherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vanilla" => Ok(LoaderType::Vanilla),
            "forge" => Ok(LoaderType::Forge),
            "fabric" => Ok(LoaderType::Fabric),
            other => Err(LauncherError::Other(format!("Unknown loader type: {other}"))),
        }
    }
}

/// A game or loader build plus whether it was installed at the last catalog refresh.
///
/// Identity is `(loader, version_id)`; `installed` does not take part in equality.
#[derive(Debug, Clone, Serialize)]
pub struct VersionDescriptor {
    pub loader: LoaderType,
    pub version_id: String,
    pub installed: bool,
}

impl VersionDescriptor {
    pub fn new(loader: LoaderType, version_id: impl Into<String>, installed: bool) -> Self {
        Self {
            loader,
            version_id: version_id.into(),
            installed,
        }
    }
}

impl PartialEq for VersionDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.loader == other.loader && self.version_id == other.version_id
    }
}

impl Eq for VersionDescriptor {}

/// `{id}` record as returned by the master list and the installed scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub id: String,
}

impl VersionRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_type_parses_case_insensitively() {
        assert_eq!("Forge".parse::<LoaderType>().unwrap(), LoaderType::Forge);
        assert_eq!(" fabric ".parse::<LoaderType>().unwrap(), LoaderType::Fabric);
        assert!("quilt".parse::<LoaderType>().is_err());
    }

    #[test]
    fn descriptor_identity_ignores_installed_flag() {
        let a = VersionDescriptor::new(LoaderType::Vanilla, "1.21", true);
        let b = VersionDescriptor::new(LoaderType::Vanilla, "1.21", false);
        let c = VersionDescriptor::new(LoaderType::Forge, "1.21", true);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
