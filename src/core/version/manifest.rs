// ─── Version Manifest ───
// Mojang master version list and the on-disk installed-version scan.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::model::VersionRecord;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::get_json;

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

/// Top-level Mojang version manifest.
#[derive(Debug, Deserialize)]
pub struct VersionManifest {
    pub versions: Vec<VersionEntry>,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

impl VersionManifest {
    pub async fn fetch(client: &reqwest::Client, url: &str) -> LauncherResult<Self> {
        info!("Fetching Minecraft version manifest...");
        let manifest: VersionManifest = get_json(client, url).await?;
        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }
}

/// Master version list plus installed-version scan.
#[async_trait]
pub trait VersionSource: Send + Sync {
    async fn list_known_game_versions(&self) -> LauncherResult<Vec<VersionRecord>>;

    async fn list_installed_versions(&self, install_dir: &Path)
        -> LauncherResult<Vec<VersionRecord>>;
}

pub struct MojangVersionSource {
    client: reqwest::Client,
    manifest_url: String,
}

impl MojangVersionSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            manifest_url: VERSION_MANIFEST_URL.into(),
        }
    }
}

#[async_trait]
impl VersionSource for MojangVersionSource {
    async fn list_known_game_versions(&self) -> LauncherResult<Vec<VersionRecord>> {
        let manifest = VersionManifest::fetch(&self.client, &self.manifest_url).await?;
        Ok(manifest
            .versions
            .into_iter()
            .map(|v| VersionRecord::new(v.id))
            .collect())
    }

    async fn list_installed_versions(
        &self,
        install_dir: &Path,
    ) -> LauncherResult<Vec<VersionRecord>> {
        scan_installed_versions(install_dir).await
    }
}

pub fn versions_dir(install_dir: &Path) -> PathBuf {
    install_dir.join("versions")
}

/// `<install>/versions/<id>/<id>.json` marks `<id>` as installed.
pub async fn scan_installed_versions(install_dir: &Path) -> LauncherResult<Vec<VersionRecord>> {
    let dir = versions_dir(install_dir);
    if !dir.is_dir() {
        debug!("No versions directory at {:?}", dir);
        return Ok(Vec::new());
    }

    let mut entries = tokio::fs::read_dir(&dir)
        .await
        .map_err(|e| LauncherError::io(&dir, e))?;

    let mut installed = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| LauncherError::io(&dir, e))?
    {
        let id = entry.file_name().to_string_lossy().to_string();
        if entry.path().join(format!("{id}.json")).is_file() {
            installed.push(VersionRecord::new(id));
        }
    }

    installed.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(installed)
}
