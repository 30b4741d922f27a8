use serde::Deserialize;

use crate::core::error::{LauncherError, LauncherResult};

/// One entry of Fabric Meta's `/v2/versions/loader` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct FabricLoaderEntry {
    pub version: String,
    pub maven: String,
}

pub fn loader_versions(entries: &[FabricLoaderEntry]) -> Vec<String> {
    entries.iter().map(|e| e.version.clone()).collect()
}

/// Maven coordinate of the loader whose version equals `loader_version` exactly.
pub fn resolve_build(entries: &[FabricLoaderEntry], loader_version: &str) -> LauncherResult<String> {
    entries
        .iter()
        .find(|e| e.version == loader_version)
        .map(|e| e.maven.clone())
        .ok_or_else(|| LauncherError::NotFound(format!("no Fabric loader {loader_version}")))
}
