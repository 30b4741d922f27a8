use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};

use crate::core::downloader::Downloader;
use crate::core::error::LauncherResult;
use crate::core::http::build_http_client;
use crate::core::install::MojangInstaller;
use crate::core::launch::{
    Collaborators, DetachedSpawner, JavaCommandBuilder, LaunchDriver, LaunchOutcome,
    LaunchRequest, WorkerSlot,
};
use crate::core::meta::{LoaderMetadata, MetadataClient};
use crate::core::mods::ModFolder;
use crate::core::progress::{LaunchEvent, ProgressReporter};
use crate::core::settings::{LauncherSettings, SettingChange, SettingsPort};
use crate::core::version::{
    LoaderType, MojangVersionSource, VersionCatalog, VersionDescriptor, VersionSource,
};

/// Everything the front end talks to. Settings are loaded once here and
/// handed out by value; the catalog is shared with the background worker.
pub struct AppState {
    settings: RwLock<LauncherSettings>,
    store: Arc<dyn SettingsPort>,
    catalog: Arc<RwLock<VersionCatalog>>,
    metadata: Arc<dyn LoaderMetadata>,
    versions: Arc<dyn VersionSource>,
    driver: Arc<LaunchDriver>,
    worker: WorkerSlot<LaunchOutcome>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SettingsPort>,
        parts: Collaborators,
        versions: Arc<dyn VersionSource>,
    ) -> Self {
        let settings = store.load();
        info!("Install directory: {:?}", settings.install_dir);

        let metadata = parts.metadata.clone();
        let driver = Arc::new(LaunchDriver::new(parts, Arc::new(ProgressReporter::new())));

        Self {
            settings: RwLock::new(settings),
            store,
            catalog: Arc::new(RwLock::new(VersionCatalog::new())),
            metadata,
            versions,
            driver,
            worker: WorkerSlot::new(),
        }
    }

    /// Wire up the HTTP-backed collaborators.
    pub fn with_default_collaborators(store: Arc<dyn SettingsPort>) -> LauncherResult<Self> {
        let http_client = build_http_client()?;
        let downloader = Arc::new(Downloader::new(http_client.clone()));

        let parts = Collaborators {
            metadata: Arc::new(MetadataClient::new(http_client.clone())),
            fetcher: downloader.clone(),
            installer: Arc::new(MojangInstaller::new(http_client.clone(), downloader)),
            commands: Arc::new(JavaCommandBuilder::default()),
            spawner: Arc::new(DetachedSpawner),
        };
        let versions = Arc::new(MojangVersionSource::new(http_client));

        Ok(Self::new(store, parts, versions))
    }

    pub async fn settings(&self) -> LauncherSettings {
        self.settings.read().await.clone()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<LaunchEvent> {
        self.driver.reporter().subscribe()
    }

    /// Persist one change and keep the in-memory copy in step.
    pub async fn update_setting(&self, change: SettingChange) -> LauncherResult<LauncherSettings> {
        let mut settings = self.settings.write().await;
        let stored = self.store.save(change)?;
        *settings = stored.clone();
        Ok(stored)
    }

    pub async fn set_install_dir(&self, dir: PathBuf) -> LauncherResult<()> {
        self.update_setting(SettingChange::InstallDir(dir)).await?;
        self.refresh_catalog().await;
        Ok(())
    }

    pub async fn set_loader(&self, loader: LoaderType) -> LauncherResult<()> {
        self.update_setting(SettingChange::Loader(loader)).await?;
        self.refresh_catalog().await;
        Ok(())
    }

    /// Wait for any background work, then rescan the install directory.
    pub async fn refresh_catalog(&self) {
        self.worker.wait_idle().await;
        let install_dir = self.settings.read().await.install_dir.clone();
        self.catalog
            .write()
            .await
            .refresh(self.versions.as_ref(), &install_dir)
            .await;
    }

    /// Refetch the Vanilla, Forge and Fabric listings.
    pub async fn refresh_remote(&self) {
        self.worker.wait_idle().await;
        self.catalog
            .write()
            .await
            .refresh_remote(self.metadata.as_ref(), self.versions.as_ref())
            .await;
    }

    pub async fn list_versions(&self, loader: LoaderType) -> Vec<VersionDescriptor> {
        self.catalog.read().await.list_for(loader)
    }

    pub async fn installed_versions(&self) -> Vec<String> {
        self.catalog.read().await.installed()
    }

    /// Remember the selection and start the attempt on the worker. A previous
    /// attempt still in flight is joined first.
    pub async fn launch(&self, request: LaunchRequest) {
        for change in [
            SettingChange::Loader(request.loader),
            SettingChange::Version(Some(request.version_id.clone())),
        ] {
            if let Err(err) = self.update_setting(change).await {
                warn!("Could not remember the selected version: {}", err);
            }
        }

        let driver = self.driver.clone();
        self.worker
            .start(async move { driver.run(request).await })
            .await;
    }

    /// Outcome of the attempt in flight, once it ends. `None` when idle.
    pub async fn wait_for_launch(&self) -> Option<LaunchOutcome> {
        self.worker.wait_idle().await
    }

    pub fn is_busy(&self) -> bool {
        self.worker.is_running()
    }

    pub async fn mods(&self) -> ModFolder {
        ModFolder::new(&self.settings.read().await.install_dir)
    }
}
