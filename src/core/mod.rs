// ─── Bedrock Launcher Core ───
//
// Architecture:
//   core/
//     error/       LauncherError + LauncherResult
//     http/        Shared reqwest client and the GET/JSON status contract
//     meta/        Forge promotions + Fabric loader listings
//     maven/       Maven coordinates -> repository URLs
//     downloader/  Streaming artifact downloads
//     version/     Manifest, version JSON, catalog of known/installed ids
//     install/     Base game install (libraries, client, assets)
//     launch/      Launch options, command builder, spawner, driver, worker slot
//     progress/    Progress state + per-subscriber launch event queues
//     settings/    Persisted launcher settings
//     mods/        The install directory's mods folder
//     state/       Application state tying the above together

pub mod downloader;
pub mod error;
pub mod http;
pub mod install;
pub mod launch;
pub mod maven;
pub mod meta;
pub mod mods;
pub mod progress;
pub mod settings;
pub mod state;
pub mod version;
