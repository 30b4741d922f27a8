// ─── Remote Metadata Client ───
// Loader listings from Forge promotions and Fabric Meta. Stateless: every call
// is one blocking round-trip with no retry, so callers keep it off the
// interactive path.

pub mod fabric;
pub mod forge;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::core::error::LauncherResult;
use crate::core::http::get_json;
use crate::core::maven::{MavenArtifact, FABRIC_MAVEN, FORGE_MAVEN};

pub use fabric::FabricLoaderEntry;
pub use forge::{ForgePromotion, ForgePromotions};

pub const FORGE_PROMOTIONS_URL: &str =
    "https://files.minecraftforge.net/net/minecraftforge/forge/promotions_slim.json";
pub const FABRIC_LOADERS_URL: &str = "https://meta.fabricmc.net/v2/versions/loader";

/// Where loader metadata and artifacts live.
#[derive(Debug, Clone)]
pub struct MetadataEndpoints {
    pub forge_promotions: String,
    pub fabric_loaders: String,
    pub forge_maven: String,
    pub fabric_maven: String,
}

impl Default for MetadataEndpoints {
    fn default() -> Self {
        Self {
            forge_promotions: FORGE_PROMOTIONS_URL.into(),
            fabric_loaders: FABRIC_LOADERS_URL.into(),
            forge_maven: FORGE_MAVEN.into(),
            fabric_maven: FABRIC_MAVEN.into(),
        }
    }
}

/// Loader metadata as the catalog and the launch driver see it.
#[async_trait]
pub trait LoaderMetadata: Send + Sync {
    async fn list_forge_versions(&self) -> LauncherResult<ForgePromotions>;

    async fn list_fabric_versions(&self) -> LauncherResult<Vec<String>>;

    /// Installer URL of the first Forge build listed for `game_version`.
    async fn resolve_forge_download_url(&self, game_version: &str) -> LauncherResult<String>;

    /// Loader jar URL for an exact Fabric loader version.
    async fn resolve_fabric_download_url(&self, loader_version: &str) -> LauncherResult<String>;
}

pub struct MetadataClient {
    client: reqwest::Client,
    endpoints: MetadataEndpoints,
}

impl MetadataClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoints(client, MetadataEndpoints::default())
    }

    pub fn with_endpoints(client: reqwest::Client, endpoints: MetadataEndpoints) -> Self {
        Self { client, endpoints }
    }

    async fn fetch_fabric_loaders(&self) -> LauncherResult<Vec<FabricLoaderEntry>> {
        let entries: Vec<FabricLoaderEntry> =
            get_json(&self.client, &self.endpoints.fabric_loaders).await?;
        debug!("Fabric Meta listed {} loader builds", entries.len());
        Ok(entries)
    }

    /// Maven coordinate (build identifier) of an exact Fabric loader version.
    pub async fn resolve_fabric_build(&self, loader_version: &str) -> LauncherResult<String> {
        let entries = self.fetch_fabric_loaders().await?;
        fabric::resolve_build(&entries, loader_version)
    }
}

#[async_trait]
impl LoaderMetadata for MetadataClient {
    async fn list_forge_versions(&self) -> LauncherResult<ForgePromotions> {
        let url = &self.endpoints.forge_promotions;
        let payload: forge::PromotionsPayload = get_json(&self.client, url).await?;
        let promotions = ForgePromotions::from_payload(url, payload)?;
        info!("Loaded {} Forge promotions", promotions.entries().len());
        Ok(promotions)
    }

    async fn list_fabric_versions(&self) -> LauncherResult<Vec<String>> {
        let entries = self.fetch_fabric_loaders().await?;
        Ok(fabric::loader_versions(&entries))
    }

    async fn resolve_forge_download_url(&self, game_version: &str) -> LauncherResult<String> {
        let promotions = self.list_forge_versions().await?;
        promotions.installer_url(game_version, &self.endpoints.forge_maven)
    }

    async fn resolve_fabric_download_url(&self, loader_version: &str) -> LauncherResult<String> {
        let coordinate = self.resolve_fabric_build(loader_version).await?;
        let artifact = MavenArtifact::parse(&coordinate)?;
        Ok(artifact.url(&self.endpoints.fabric_maven))
    }
}
