// ─── Install primitive ───
// Materialises a game version in the standard layout of an install directory:
//   versions/<id>/<id>.json, versions/<id>/<id>.jar
//   libraries/<maven path>
//   assets/indexes/<index>.json, assets/objects/<xx>/<hash>

mod assets;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::get_text;
use crate::core::maven::{MavenArtifact, MOJANG_LIBRARIES};
use crate::core::progress::InstallProgress;
use crate::core::version::manifest::VERSION_MANIFEST_URL;
use crate::core::version::version_file::{LibDownloadArtifact, LibraryEntry};
use crate::core::version::{VersionJson, VersionManifest};

/// Longest `inheritsFrom` chain accepted, counting parents only.
const MAX_INHERITANCE_DEPTH: usize = 8;

/// Opaque, possibly slow, network-and-disk installation of one game version.
#[async_trait]
pub trait GameInstaller: Send + Sync {
    async fn install_version(
        &self,
        version_id: &str,
        install_dir: &Path,
        progress: &dyn InstallProgress,
    ) -> LauncherResult<()>;
}

pub struct MojangInstaller {
    client: reqwest::Client,
    downloader: Arc<Downloader>,
    manifest_url: String,
}

impl MojangInstaller {
    pub fn new(client: reqwest::Client, downloader: Arc<Downloader>) -> Self {
        Self {
            client,
            downloader,
            manifest_url: VERSION_MANIFEST_URL.into(),
        }
    }

    /// Local version JSON if present, otherwise fetched through the manifest and saved.
    async fn ensure_version_json(&self, version_id: &str, install_dir: &Path) -> LauncherResult<String> {
        let path = VersionJson::json_path(install_dir, version_id);
        if path.is_file() {
            debug!("Using installed version JSON {:?}", path);
            return tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| LauncherError::io(&path, e));
        }

        let manifest = VersionManifest::fetch(&self.client, &self.manifest_url).await?;
        let entry = manifest.find_version(version_id).ok_or_else(|| {
            LauncherError::Install(format!("Minecraft version {version_id} not found in manifest"))
        })?;

        let raw = get_text(&self.client, &entry.url).await?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }
        tokio::fs::write(&path, &raw)
            .await
            .map_err(|e| LauncherError::io(&path, e))?;
        Ok(raw)
    }

    async fn install_libraries(
        &self,
        version: &VersionJson,
        install_dir: &Path,
        progress: &dyn InstallProgress,
    ) -> LauncherResult<()> {
        let libs_dir = install_dir.join("libraries");
        let libraries: Vec<&LibraryEntry> = version.allowed_libraries().collect();

        progress.set_status("Download Libraries");
        progress.set_max(libraries.len() as u64);

        for (i, lib) in libraries.iter().enumerate() {
            self.install_library(lib, &libs_dir).await?;
            progress.set_progress(i as u64 + 1);
        }

        info!("Processed {} libraries", libraries.len());
        Ok(())
    }

    async fn install_library(&self, lib: &LibraryEntry, libs_dir: &Path) -> LauncherResult<()> {
        if let Some(native) = lib.native_artifact() {
            self.install_listed(native, libs_dir).await?;
        }

        match lib.downloads.as_ref().and_then(|d| d.artifact.as_ref()) {
            Some(artifact) => self.install_listed(artifact, libs_dir).await,
            None if lib.is_natives_only() => Ok(()),
            None => {
                let dest = libs_dir.join(lib.relative_path()?);
                if self.is_current(&dest, None).await {
                    return Ok(());
                }
                let repo = lib.url.as_deref().unwrap_or(MOJANG_LIBRARIES);
                let url = MavenArtifact::parse(&lib.name)?.url(repo);
                self.downloader.download_file(&url, &dest).await?;
                Ok(())
            }
        }
    }

    /// A jar listed under `downloads`, checked against its SHA-1.
    async fn install_listed(&self, artifact: &LibDownloadArtifact, libs_dir: &Path) -> LauncherResult<()> {
        let dest = libs_dir.join(&artifact.path);
        if self.is_current(&dest, Some(&artifact.sha1)).await {
            return Ok(());
        }
        if artifact.url.is_empty() {
            // Produced locally by a loader installer; nothing to fetch.
            return Ok(());
        }
        self.downloader.download_file(&artifact.url, &dest).await?;
        Ok(())
    }

    /// Ids from `version_id` up to the root of its `inheritsFrom` chain,
    /// fetching any version JSON not yet on disk.
    async fn resolve_chain(&self, version_id: &str, install_dir: &Path) -> LauncherResult<Vec<String>> {
        let mut chain = vec![version_id.to_string()];
        loop {
            let current = chain[chain.len() - 1].clone();
            let raw = self.ensure_version_json(&current, install_dir).await?;
            let value: serde_json::Value = serde_json::from_str(&raw)?;

            let Some(parent) = value.get("inheritsFrom").and_then(|v| v.as_str()) else {
                return Ok(chain);
            };
            if chain.iter().any(|id| id == parent) {
                return Err(LauncherError::Install(format!(
                    "inheritsFrom chain of {version_id} loops back to {parent}"
                )));
            }
            if chain.len() > MAX_INHERITANCE_DEPTH {
                return Err(LauncherError::Install(format!(
                    "inheritsFrom chain of {version_id} is too deep"
                )));
            }
            chain.push(parent.to_string());
        }
    }

    async fn install_client(
        &self,
        version: &VersionJson,
        version_id: &str,
        install_dir: &Path,
        progress: &dyn InstallProgress,
    ) -> LauncherResult<()> {
        let Some(client) = version.downloads.as_ref().and_then(|d| d.client.as_ref()) else {
            return Ok(());
        };

        progress.set_status("Download Client");
        progress.set_max(1);

        let dest = VersionJson::client_jar_path(install_dir, version_id);
        if !self.is_current(&dest, Some(&client.sha1)).await {
            let written = self.downloader.download_file(&client.url, &dest).await?;
            if written != client.size {
                return Err(LauncherError::Install(format!(
                    "client jar for {version_id} is {written} bytes, expected {}",
                    client.size
                )));
            }
        }

        progress.set_progress(1);
        Ok(())
    }

    /// Present and, when a hash is known, matching it.
    async fn is_current(&self, path: &Path, sha1: Option<&str>) -> bool {
        if !path.is_file() {
            return false;
        }
        match sha1 {
            Some(expected) => Downloader::validate_sha1(path, expected)
                .await
                .unwrap_or(false),
            None => true,
        }
    }
}

#[async_trait]
impl GameInstaller for MojangInstaller {
    async fn install_version(
        &self,
        version_id: &str,
        install_dir: &Path,
        progress: &dyn InstallProgress,
    ) -> LauncherResult<()> {
        info!("Installing Minecraft {} into {:?}", version_id, install_dir);

        let chain = self.resolve_chain(version_id, install_dir).await?;

        // Root first. Client jar and assets belong to the root alone.
        for (depth, id) in chain.iter().enumerate().rev() {
            let version = VersionJson::load_installed(install_dir, id).await?;
            self.install_libraries(&version, install_dir, progress).await?;

            if depth == chain.len() - 1 {
                self.install_client(&version, id, install_dir, progress).await?;
                if let Some(index) = &version.asset_index {
                    assets::install_assets(&self.client, &self.downloader, index, install_dir, progress)
                        .await?;
                }
            }
        }

        progress.set_status("Installation complete");
        info!("Minecraft {} installed", version_id);
        Ok(())
    }
}
