// ─── Version Catalog ───
// Loader type -> available version ids, plus the loader-agnostic set of ids
// installed on disk. Both halves are replaced wholesale on refresh.

use std::collections::HashSet;
use std::path::Path;

use tracing::{info, warn};

use super::manifest::VersionSource;
use super::model::{LoaderType, VersionDescriptor};
use crate::core::meta::LoaderMetadata;

#[derive(Debug, Default, Clone)]
pub struct VersionCatalog {
    vanilla: Vec<String>,
    forge: Vec<String>,
    fabric: Vec<String>,
    installed: HashSet<String>,
}

impl VersionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rescan the install directory. No network.
    pub async fn refresh(&mut self, source: &dyn VersionSource, install_dir: &Path) {
        self.installed = match source.list_installed_versions(install_dir).await {
            Ok(records) => records.into_iter().map(|r| r.id).collect(),
            Err(err) => {
                warn!("Installed-version scan of {:?} failed: {}", install_dir, err);
                HashSet::new()
            }
        };
        info!("{} installed versions in {:?}", self.installed.len(), install_dir);
    }

    /// Refetch every remote listing. A failed listing is logged and left empty.
    pub async fn refresh_remote(&mut self, metadata: &dyn LoaderMetadata, source: &dyn VersionSource) {
        self.vanilla = match source.list_known_game_versions().await {
            Ok(records) => records.into_iter().map(|r| r.id).collect(),
            Err(err) => {
                warn!("Could not load the Minecraft version list: {}", err);
                Vec::new()
            }
        };

        self.forge = match metadata.list_forge_versions().await {
            Ok(promotions) => promotions.game_versions(),
            Err(err) => {
                warn!("Could not load Forge versions: {}", err);
                Vec::new()
            }
        };

        self.fabric = match metadata.list_fabric_versions().await {
            Ok(versions) => versions,
            Err(err) => {
                warn!("Could not load Fabric versions: {}", err);
                Vec::new()
            }
        };

        info!(
            "Catalog: {} vanilla, {} forge, {} fabric versions",
            self.vanilla.len(),
            self.forge.len(),
            self.fabric.len()
        );
    }

    pub fn list_for(&self, loader: LoaderType) -> Vec<VersionDescriptor> {
        let ids = match loader {
            LoaderType::Vanilla => &self.vanilla,
            LoaderType::Forge => &self.forge,
            LoaderType::Fabric => &self.fabric,
        };
        ids.iter()
            .map(|id| VersionDescriptor::new(loader, id.clone(), self.is_installed(id)))
            .collect()
    }

    pub fn is_installed(&self, version_id: &str) -> bool {
        self.installed.contains(version_id)
    }

    /// Installed ids, sorted.
    pub fn installed(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.installed.iter().cloned().collect();
        ids.sort();
        ids
    }
}
