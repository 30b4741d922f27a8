// ─── Install/Launch Driver ───
// Idle -> Preparing -> Installing -> Launching -> Idle.
//
// Busy(true) goes out before any work; Busy(false) then State(Idle) go out
// exactly once per attempt, whichever way the attempt ends.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use futures_util::FutureExt;
use serde::Serialize;
use tracing::{error, info, warn};

use super::command::CommandBuilder;
use super::options::{GraphicsQuality, LaunchOptions, MemoryMb};
use super::process::ProcessSpawner;
use crate::core::downloader::ArtifactFetcher;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::install::GameInstaller;
use crate::core::meta::LoaderMetadata;
use crate::core::progress::{InstallProgress, ProgressReporter};
use crate::core::version::{LoaderType, VersionDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DriverState {
    Idle,
    Preparing,
    Installing,
    Launching,
}

/// One user-initiated launch.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub loader: LoaderType,
    /// Game version for Vanilla and Forge, loader version for Fabric.
    pub version_id: String,
    /// Game version installed and launched.
    pub base_version: String,
    pub install_dir: PathBuf,
    pub username: String,
    pub memory: MemoryMb,
    pub quality: GraphicsQuality,
    pub performance: bool,
}

impl LaunchRequest {
    pub fn new(
        descriptor: &VersionDescriptor,
        install_dir: PathBuf,
        username: impl Into<String>,
        memory: MemoryMb,
    ) -> Self {
        Self {
            loader: descriptor.loader,
            version_id: descriptor.version_id.clone(),
            base_version: descriptor.version_id.clone(),
            install_dir,
            username: username.into(),
            memory,
            quality: GraphicsQuality::default(),
            performance: false,
        }
    }

    pub fn with_graphics(mut self, quality: GraphicsQuality, performance: bool) -> Self {
        self.quality = quality;
        self.performance = performance;
        self
    }

    /// Fabric requests name the game version separately from the loader version.
    pub fn with_base_version(mut self, base_version: impl Into<String>) -> Self {
        self.base_version = base_version.into();
        self
    }

    /// File name the loader artifact is stored under in the install directory.
    pub fn loader_artifact_name(&self) -> Option<String> {
        match self.loader {
            LoaderType::Vanilla => None,
            LoaderType::Forge => Some(format!("forge-{}-installer.jar", self.version_id)),
            LoaderType::Fabric => Some(format!("fabric-loader-{}.jar", self.version_id)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    Spawned { pid: u32, command: Vec<String> },
    /// User-facing failure message.
    Failed(String),
}

/// The external pieces the driver orchestrates.
#[derive(Clone)]
pub struct Collaborators {
    pub metadata: Arc<dyn LoaderMetadata>,
    pub fetcher: Arc<dyn ArtifactFetcher>,
    pub installer: Arc<dyn GameInstaller>,
    pub commands: Arc<dyn CommandBuilder>,
    pub spawner: Arc<dyn ProcessSpawner>,
}

pub struct LaunchDriver {
    parts: Collaborators,
    reporter: Arc<ProgressReporter>,
}

impl LaunchDriver {
    pub fn new(parts: Collaborators, reporter: Arc<ProgressReporter>) -> Self {
        Self { parts, reporter }
    }

    pub fn reporter(&self) -> &Arc<ProgressReporter> {
        &self.reporter
    }

    /// Run one attempt to completion. Never returns an error: failures are
    /// published as an `Error` event and reflected in the outcome.
    pub async fn run(&self, request: LaunchRequest) -> LaunchOutcome {
        self.reporter.reset();
        self.reporter.busy(true);

        let attempt = AssertUnwindSafe(self.attempt(&request)).catch_unwind().await;
        let result = attempt.unwrap_or_else(|_| {
            Err(LauncherError::Other("launch task panicked".into()))
        });

        let outcome = match result {
            Ok((pid, command)) => LaunchOutcome::Spawned { pid, command },
            Err(err) => {
                error!("Launch of {} failed: {}", request.version_id, err);
                let message = format!("Failed to launch Minecraft: {err}");
                self.reporter.error(message.clone());
                LaunchOutcome::Failed(message)
            }
        };

        self.reporter.busy(false);
        self.reporter.state(DriverState::Idle);
        outcome
    }

    async fn attempt(&self, request: &LaunchRequest) -> LauncherResult<(u32, Vec<String>)> {
        self.reporter.state(DriverState::Preparing);
        info!(
            "Launching {} {} (game {}) from {:?}",
            request.loader, request.version_id, request.base_version, request.install_dir
        );

        self.reporter.state(DriverState::Installing);
        self.fetch_loader_artifact(request).await;

        self.parts
            .installer
            .install_version(&request.base_version, &request.install_dir, self.reporter.as_ref())
            .await
            .map_err(|err| match err {
                LauncherError::Install(_) => err,
                other => LauncherError::Install(other.to_string()),
            })?;

        self.reporter.state(DriverState::Launching);
        let options = LaunchOptions::new(
            &request.username,
            request.memory,
            request.quality,
            request.performance,
        );
        info!("Launching as {} ({})", options.username, options.uuid);

        let command = self
            .parts
            .commands
            .build_launch_command(&request.base_version, &request.install_dir, &options)
            .await
            .map_err(as_launch_error)?;

        let pid = self
            .parts
            .spawner
            .spawn(&command, &request.install_dir)
            .map_err(as_launch_error)?;
        Ok((pid, command))
    }

    /// Best effort: any failure is logged and the launch carries on without it.
    async fn fetch_loader_artifact(&self, request: &LaunchRequest) -> Option<PathBuf> {
        let file_name = request.loader_artifact_name()?;

        let url = match request.loader {
            LoaderType::Forge => {
                self.parts
                    .metadata
                    .resolve_forge_download_url(&request.version_id)
                    .await
            }
            LoaderType::Fabric => {
                self.parts
                    .metadata
                    .resolve_fabric_download_url(&request.version_id)
                    .await
            }
            LoaderType::Vanilla => return None,
        };

        let url = match url {
            Ok(url) => url,
            Err(err) => {
                warn!(
                    "Could not resolve {} {}: {}; continuing without it",
                    request.loader, request.version_id, err
                );
                return None;
            }
        };

        self.reporter.set_status(&format!("Download {file_name}"));
        let dest = request.install_dir.join(&file_name);
        match self.parts.fetcher.download(&url, &dest).await {
            Ok(bytes) => {
                info!("Saved {} ({} bytes)", dest.display(), bytes);
                Some(dest)
            }
            Err(err) => {
                warn!("Download of {} failed: {}; continuing without it", url, err);
                None
            }
        }
    }
}

fn as_launch_error(err: LauncherError) -> LauncherError {
    match err {
        LauncherError::Launch(_) => err,
        other => LauncherError::Launch(other.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use super::*;
    use crate::core::launch::WorkerSlot;
    use crate::core::meta::{ForgePromotion, ForgePromotions};
    use crate::core::progress::{LaunchEvent, ProgressState};
    use crate::core::version::catalog::tests::FakeMetadata;

    #[derive(Default)]
    pub struct FakeInstaller {
        pub fail: bool,
        pub delay: Option<Duration>,
        pub installed: Mutex<Vec<String>>,
        active: AtomicUsize,
        pub max_active: AtomicUsize,
    }

    #[async_trait]
    impl GameInstaller for FakeInstaller {
        async fn install_version(
            &self,
            version_id: &str,
            _install_dir: &Path,
            progress: &dyn InstallProgress,
        ) -> LauncherResult<()> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);

            progress.set_status("Download Libraries");
            progress.set_max(2);
            progress.set_progress(1);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            progress.set_progress(2);

            self.active.fetch_sub(1, Ordering::SeqCst);
            if self.fail {
                return Err(LauncherError::Install("corrupt archive".into()));
            }
            self.installed.lock().unwrap().push(version_id.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct FakeCommands {
        pub last_options: Mutex<Option<LaunchOptions>>,
    }

    #[async_trait]
    impl CommandBuilder for FakeCommands {
        async fn build_launch_command(
            &self,
            version_id: &str,
            _install_dir: &Path,
            options: &LaunchOptions,
        ) -> LauncherResult<Vec<String>> {
            *self.last_options.lock().unwrap() = Some(options.clone());
            let mut command = vec!["java".to_string()];
            command.extend(options.jvm_arguments.iter().cloned());
            command.push(version_id.to_string());
            command.extend(options.game_args.iter().cloned());
            Ok(command)
        }
    }

    #[derive(Default)]
    pub struct FakeSpawner {
        pub fail: bool,
        pub spawned: Mutex<Vec<Vec<String>>>,
    }

    impl ProcessSpawner for FakeSpawner {
        fn spawn(&self, command: &[String], _working_dir: &Path) -> LauncherResult<u32> {
            if self.fail {
                return Err(LauncherError::Launch("java not found".into()));
            }
            self.spawned.lock().unwrap().push(command.to_vec());
            Ok(4242)
        }
    }

    #[derive(Default)]
    pub struct FakeFetcher {
        pub fail: bool,
        pub downloads: Mutex<Vec<(String, PathBuf)>>,
    }

    #[async_trait]
    impl ArtifactFetcher for FakeFetcher {
        async fn download(&self, url: &str, dest: &Path) -> LauncherResult<u64> {
            if self.fail {
                return Err(LauncherError::Download {
                    url: url.to_string(),
                    reason: "connection reset".into(),
                });
            }
            self.downloads
                .lock()
                .unwrap()
                .push((url.to_string(), dest.to_path_buf()));
            Ok(1)
        }
    }

    pub struct Harness {
        pub installer: Arc<FakeInstaller>,
        pub commands: Arc<FakeCommands>,
        pub spawner: Arc<FakeSpawner>,
        pub fetcher: Arc<FakeFetcher>,
        pub driver: Arc<LaunchDriver>,
    }

    pub fn harness(installer: FakeInstaller, spawner: FakeSpawner, fetcher: FakeFetcher) -> Harness {
        let installer = Arc::new(installer);
        let commands = Arc::new(FakeCommands::default());
        let spawner = Arc::new(spawner);
        let fetcher = Arc::new(fetcher);
        let metadata = Arc::new(FakeMetadata {
            forge: Some(ForgePromotions::new(vec![ForgePromotion {
                key: "1.20.1-recommended".into(),
                build: "47.2.0".into(),
            }])),
            fabric: Some(vec!["0.16.10".into()]),
        });
        let parts = Collaborators {
            metadata,
            fetcher: fetcher.clone(),
            installer: installer.clone(),
            commands: commands.clone(),
            spawner: spawner.clone(),
        };
        let driver = Arc::new(LaunchDriver::new(parts, Arc::new(ProgressReporter::new())));
        Harness {
            installer,
            commands,
            spawner,
            fetcher,
            driver,
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<LaunchEvent>) -> Vec<LaunchEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn states(events: &[LaunchEvent]) -> Vec<DriverState> {
        events
            .iter()
            .filter_map(|e| match e {
                LaunchEvent::State(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    fn busy_signals(events: &[LaunchEvent]) -> Vec<bool> {
        events
            .iter()
            .filter_map(|e| match e {
                LaunchEvent::Busy(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    fn request(loader: LoaderType, version: &str, dir: &Path) -> LaunchRequest {
        let descriptor = VersionDescriptor::new(loader, version, false);
        LaunchRequest::new(
            &descriptor,
            dir.to_path_buf(),
            "Steve",
            MemoryMb::try_from(2048).unwrap(),
        )
    }

    #[tokio::test]
    async fn vanilla_ultra_performance_end_to_end() {
        let h = harness(FakeInstaller::default(), FakeSpawner::default(), FakeFetcher::default());
        let mut rx = h.driver.reporter().subscribe();
        let dir = tempfile::tempdir().unwrap();

        let descriptor = VersionDescriptor::new(LoaderType::Vanilla, "1.21", false);
        let request = LaunchRequest::new(
            &descriptor,
            dir.path().to_path_buf(),
            "",
            MemoryMb::try_from(4096).unwrap(),
        )
        .with_graphics(GraphicsQuality::Ultra, true);

        let outcome = h.driver.run(request).await;

        let LaunchOutcome::Spawned { pid, command } = outcome else {
            panic!("expected a spawned game, got {outcome:?}");
        };
        assert_eq!(pid, 4242);
        assert_eq!(command, vec!["java", "-Xmx4096M", "-Xms2048M", "1.21", "--ultra", "--performance"]);
        let options = h.commands.last_options.lock().unwrap().clone().unwrap();
        assert_eq!(options.jvm_arguments, vec!["-Xmx4096M", "-Xms2048M"]);
        assert_eq!(options.game_args, vec!["--ultra", "--performance"]);
        assert!(options.username.starts_with("Player"));
        assert_eq!(*h.installer.installed.lock().unwrap(), vec!["1.21".to_string()]);
        assert!(h.fetcher.downloads.lock().unwrap().is_empty());

        let events = drain(&mut rx);
        assert_eq!(events.first(), Some(&LaunchEvent::Busy(true)));
        assert_eq!(
            states(&events),
            vec![
                DriverState::Preparing,
                DriverState::Installing,
                DriverState::Launching,
                DriverState::Idle
            ]
        );
        assert_eq!(busy_signals(&events), vec![true, false]);
    }

    #[tokio::test]
    async fn install_failure_still_ends_not_busy_exactly_once() {
        let installer = FakeInstaller {
            fail: true,
            ..Default::default()
        };
        let h = harness(installer, FakeSpawner::default(), FakeFetcher::default());
        let mut rx = h.driver.reporter().subscribe();
        let dir = tempfile::tempdir().unwrap();

        let outcome = h.driver.run(request(LoaderType::Vanilla, "1.21", dir.path())).await;

        match outcome {
            LaunchOutcome::Failed(message) => {
                assert!(message.starts_with("Failed to launch Minecraft:"));
                assert!(message.contains("corrupt archive"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(h.spawner.spawned.lock().unwrap().is_empty());

        let events = drain(&mut rx);
        assert_eq!(busy_signals(&events), vec![true, false]);
        assert_eq!(events.iter().filter(|e| matches!(e, LaunchEvent::Error(_))).count(), 1);
        let error_at = events.iter().position(|e| matches!(e, LaunchEvent::Error(_))).unwrap();
        let not_busy_at = events.iter().position(|e| *e == LaunchEvent::Busy(false)).unwrap();
        assert!(error_at < not_busy_at);
        assert_eq!(events.last(), Some(&LaunchEvent::State(DriverState::Idle)));
        assert!(!states(&events).contains(&DriverState::Launching));
    }

    #[tokio::test]
    async fn spawn_failure_is_a_launch_error() {
        let spawner = FakeSpawner {
            fail: true,
            ..Default::default()
        };
        let h = harness(FakeInstaller::default(), spawner, FakeFetcher::default());
        let mut rx = h.driver.reporter().subscribe();
        let dir = tempfile::tempdir().unwrap();

        let outcome = h.driver.run(request(LoaderType::Vanilla, "1.21", dir.path())).await;

        assert!(matches!(outcome, LaunchOutcome::Failed(ref m) if m.contains("java not found")));
        assert_eq!(busy_signals(&drain(&mut rx)), vec![true, false]);
    }

    #[tokio::test]
    async fn forge_installer_lands_under_a_deterministic_name() {
        let h = harness(FakeInstaller::default(), FakeSpawner::default(), FakeFetcher::default());
        let dir = tempfile::tempdir().unwrap();

        let outcome = h.driver.run(request(LoaderType::Forge, "1.20.1", dir.path())).await;

        assert!(matches!(outcome, LaunchOutcome::Spawned { .. }));
        let downloads = h.fetcher.downloads.lock().unwrap();
        assert_eq!(downloads.len(), 1);
        assert_eq!(
            downloads[0].0,
            "https://maven.test/net/minecraftforge/forge/1.20.1-47.2.0/forge-1.20.1-47.2.0-installer.jar"
        );
        assert_eq!(downloads[0].1, dir.path().join("forge-1.20.1-installer.jar"));
    }

    #[tokio::test]
    async fn failed_loader_download_still_launches() {
        let fetcher = FakeFetcher {
            fail: true,
            ..Default::default()
        };
        let h = harness(FakeInstaller::default(), FakeSpawner::default(), fetcher);
        let dir = tempfile::tempdir().unwrap();

        let request = request(LoaderType::Fabric, "0.16.10", dir.path()).with_base_version("1.20.1");
        let outcome = h.driver.run(request).await;

        assert!(matches!(outcome, LaunchOutcome::Spawned { ref command, .. } if command.contains(&"1.20.1".to_string())));
        assert_eq!(*h.installer.installed.lock().unwrap(), vec!["1.20.1".to_string()]);
    }

    #[tokio::test]
    async fn unknown_loader_version_still_launches() {
        let h = harness(FakeInstaller::default(), FakeSpawner::default(), FakeFetcher::default());
        let dir = tempfile::tempdir().unwrap();

        let outcome = h.driver.run(request(LoaderType::Forge, "1.7.10", dir.path())).await;

        assert!(matches!(outcome, LaunchOutcome::Spawned { .. }));
        assert!(h.fetcher.downloads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn installer_progress_is_forwarded_in_order() {
        let h = harness(FakeInstaller::default(), FakeSpawner::default(), FakeFetcher::default());
        let mut rx = h.driver.reporter().subscribe();
        let dir = tempfile::tempdir().unwrap();

        h.driver.run(request(LoaderType::Vanilla, "1.21", dir.path())).await;

        let progress: Vec<ProgressState> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                LaunchEvent::Progress(p) => Some(p),
                _ => None,
            })
            .collect();
        let lines: Vec<String> = progress.iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "Download Libraries (0/0)",
                "Download Libraries (0/2)",
                "Download Libraries (1/2)",
                "Download Libraries (2/2)",
            ]
        );
        assert_eq!(h.driver.reporter().snapshot().current, 2);
    }

    #[tokio::test]
    async fn second_launch_waits_for_the_first() {
        let installer = FakeInstaller {
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        };
        let h = harness(installer, FakeSpawner::default(), FakeFetcher::default());
        let slot = WorkerSlot::new();
        let dir = tempfile::tempdir().unwrap();

        for version in ["1.21", "1.20.1"] {
            let driver = h.driver.clone();
            let request = request(LoaderType::Vanilla, version, dir.path());
            slot.start(async move { driver.run(request).await }).await;
        }
        let last = slot.wait_idle().await;

        assert!(matches!(last, Some(LaunchOutcome::Spawned { .. })));
        assert_eq!(h.installer.max_active.load(Ordering::SeqCst), 1);
        assert_eq!(
            *h.installer.installed.lock().unwrap(),
            vec!["1.21".to_string(), "1.20.1".to_string()]
        );
        assert_eq!(h.spawner.spawned.lock().unwrap().len(), 2);
    }
}
