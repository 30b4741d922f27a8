// ─── Command line front end ───
// Plays the interactive role: builds requests from settings plus flags, hands
// them to `AppState` and prints what the worker reports.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::launch::{DriverState, GraphicsQuality, LaunchOutcome, LaunchRequest, MemoryMb};
use crate::core::progress::LaunchEvent;
use crate::core::settings::{JsonSettingsStore, LauncherSettings, SettingChange};
use crate::core::state::AppState;
use crate::core::version::{LoaderType, VersionDescriptor};

#[derive(Debug, Parser)]
#[command(name = "bedrock", version, about = "Minecraft launcher with Vanilla, Forge and Fabric support")]
pub struct Args {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Install (if needed) and start the game
    Launch(LaunchArgs),
    /// List versions available for a loader
    Versions {
        #[arg(long)]
        loader: Option<LoaderType>,
        /// Only show versions present in the install directory
        #[arg(long)]
        installed: bool,
    },
    /// Show or change the saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage jars in the mods folder
    Mods {
        #[command(subcommand)]
        action: ModsAction,
    },
}

#[derive(Debug, clap::Args)]
pub struct LaunchArgs {
    #[arg(long)]
    pub loader: Option<LoaderType>,
    /// Game version (Vanilla, Forge) or loader version (Fabric)
    #[arg(long)]
    pub version: Option<String>,
    /// Game version to run a Fabric loader on
    #[arg(long)]
    pub game_version: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    /// Heap size in MB
    #[arg(long)]
    pub memory: Option<MemoryMb>,
    #[arg(long)]
    pub quality: Option<GraphicsQuality>,
    /// Turn performance mode on for this launch
    #[arg(long, overrides_with = "no_performance")]
    pub performance: bool,
    /// Turn performance mode off for this launch
    #[arg(long, overrides_with = "performance")]
    pub no_performance: bool,
}

impl LaunchArgs {
    /// `None` when neither switch was given; the last one given wins.
    fn performance_override(&self) -> Option<bool> {
        if self.performance {
            Some(true)
        } else if self.no_performance {
            Some(false)
        } else {
            None
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    Show,
    /// Keys: install_dir, username, memory, quality, performance, loader, version
    Set { key: String, value: String },
    /// Print where the settings file lives
    Dir,
}

#[derive(Debug, Subcommand)]
pub enum ModsAction {
    List,
    Add { path: PathBuf },
}

pub async fn execute(args: Args) -> LauncherResult<ExitCode> {
    let store = Arc::new(JsonSettingsStore::at_default_location()?);
    debug!("Settings file: {:?}", store.path());

    match args.command {
        Command::Config {
            action: ConfigAction::Dir,
        } => {
            println!("{}", store.path().display());
            Ok(ExitCode::SUCCESS)
        }
        command => {
            let state = AppState::with_default_collaborators(store)?;
            dispatch(&state, command).await
        }
    }
}

async fn dispatch(state: &AppState, command: Command) -> LauncherResult<ExitCode> {
    match command {
        Command::Launch(args) => launch(state, args).await,
        Command::Versions { loader, installed } => {
            let loader = match loader {
                Some(loader) => loader,
                None => state.settings().await.loader,
            };
            list_versions(state, loader, installed).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config { action } => {
            configure(state, action).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Mods { action } => {
            manage_mods(state, action).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn launch(state: &AppState, args: LaunchArgs) -> LauncherResult<ExitCode> {
    let settings = state.settings().await;
    state.refresh_catalog().await;

    let installed = state.installed_versions().await;
    let request = build_request(&settings, args, &installed)?;

    if request.base_version != request.version_id || request.loader != LoaderType::Vanilla {
        println!(
            "Launching {} {} (Minecraft {})",
            request.loader, request.version_id, request.base_version
        );
    } else {
        println!("Launching Minecraft {}", request.version_id);
    }

    let events = state.subscribe();
    let printer = tokio::spawn(print_progress(events));

    state.launch(request).await;
    let outcome = state.wait_for_launch().await;
    if let Err(err) = printer.await {
        warn!("Progress printer ended abnormally: {}", err);
    }

    match outcome {
        Some(LaunchOutcome::Spawned { pid, .. }) => {
            println!("Minecraft started (PID {pid})");
            Ok(ExitCode::SUCCESS)
        }
        Some(LaunchOutcome::Failed(message)) => {
            eprintln!("{message}");
            Ok(ExitCode::FAILURE)
        }
        None => Err(LauncherError::Other("launch task ended without an outcome".into())),
    }
}

/// Settings supply whatever the flags leave out.
fn build_request(
    settings: &LauncherSettings,
    args: LaunchArgs,
    installed: &[String],
) -> LauncherResult<LaunchRequest> {
    let loader = args.loader.unwrap_or(settings.loader);
    let performance = args.performance_override().unwrap_or(settings.performance);
    let version = args
        .version
        .or_else(|| settings.version.clone())
        .ok_or_else(|| LauncherError::Settings("no version selected, pass --version".into()))?;

    let base_version = match loader {
        LoaderType::Fabric => args.game_version.ok_or_else(|| {
            LauncherError::Settings("Fabric needs the game version, pass --game-version".into())
        })?,
        LoaderType::Vanilla | LoaderType::Forge => version.clone(),
    };

    let descriptor = VersionDescriptor::new(loader, version, installed.contains(&base_version));
    let username = args.username.unwrap_or_else(|| settings.username.clone());
    let memory = args.memory.unwrap_or_else(|| settings.memory());
    let quality = args.quality.unwrap_or(settings.quality);

    Ok(
        LaunchRequest::new(&descriptor, settings.install_dir.clone(), username, memory)
            .with_graphics(quality, performance)
            .with_base_version(base_version),
    )
}

/// Print each progress update as `status (current/max)` until the attempt ends.
async fn print_progress(mut events: mpsc::UnboundedReceiver<LaunchEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            LaunchEvent::Progress(progress) => println!("{progress}"),
            LaunchEvent::State(DriverState::Idle) => break,
            LaunchEvent::State(state) => debug!("Launch state: {:?}", state),
            LaunchEvent::Busy(_) | LaunchEvent::Error(_) => {}
        }
    }
}

async fn list_versions(state: &AppState, loader: LoaderType, installed_only: bool) -> LauncherResult<()> {
    state.refresh_catalog().await;

    if installed_only {
        for id in state.installed_versions().await {
            println!("{id}");
        }
        return Ok(());
    }

    state.refresh_remote().await;
    let versions = state.list_versions(loader).await;
    if versions.is_empty() {
        println!("No {loader} versions available");
    }
    for version in versions {
        let marker = if version.installed { " (installed)" } else { "" };
        println!("{}{}", version.version_id, marker);
    }
    Ok(())
}

async fn configure(state: &AppState, action: ConfigAction) -> LauncherResult<()> {
    match action {
        ConfigAction::Show => {
            let settings = state.settings().await;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigAction::Set { key, value } => {
            match SettingChange::parse(&key, &value)? {
                SettingChange::InstallDir(dir) => state.set_install_dir(dir).await?,
                SettingChange::Loader(loader) => state.set_loader(loader).await?,
                change => {
                    state.update_setting(change).await?;
                }
            }
            println!("{key} = {value}");
        }
        ConfigAction::Dir => {}
    }
    Ok(())
}

async fn manage_mods(state: &AppState, action: ModsAction) -> LauncherResult<()> {
    let mods = state.mods().await;
    match action {
        ModsAction::List => {
            let jars = mods.list().await?;
            if jars.is_empty() {
                println!("No mods in {}", mods.path().display());
            }
            for jar in jars {
                println!("{jar}");
            }
        }
        ModsAction::Add { path } => match mods.add(&path).await {
            Ok(name) => println!("Installed {name}"),
            Err(LauncherError::ModAlreadyInstalled(name)) => {
                println!("{name} is already installed");
            }
            Err(err) => return Err(err),
        },
    }
    Ok(())
}
