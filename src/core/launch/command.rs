// ─── Launch command ───
// Turns an installed version plus per-launch options into a java command line.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::natives::{extract_natives, natives_dir};
use super::options::LaunchOptions;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::VersionJson;

const LAUNCHER_NAME: &str = "BedrockLauncher";
const LAUNCHER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[async_trait]
pub trait CommandBuilder: Send + Sync {
    async fn build_launch_command(
        &self,
        version_id: &str,
        install_dir: &Path,
        options: &LaunchOptions,
    ) -> LauncherResult<Vec<String>>;
}

pub struct JavaCommandBuilder {
    java: PathBuf,
}

impl Default for JavaCommandBuilder {
    fn default() -> Self {
        Self::new(PathBuf::from("java"))
    }
}

impl JavaCommandBuilder {
    pub fn new(java: PathBuf) -> Self {
        Self { java }
    }
}

#[async_trait]
impl CommandBuilder for JavaCommandBuilder {
    async fn build_launch_command(
        &self,
        version_id: &str,
        install_dir: &Path,
        options: &LaunchOptions,
    ) -> LauncherResult<Vec<String>> {
        let version = VersionJson::load_installed(install_dir, version_id).await?;
        extract_natives(&version, install_dir, &natives_dir(install_dir, version_id)).await?;
        let command = assemble(&self.java, &version, version_id, install_dir, options)?;
        debug!("Command: {}", format_command_for_logs(&command));
        Ok(command)
    }
}

/// Values for the `${...}` placeholders of a version JSON.
struct Placeholders<'a> {
    version_id: &'a str,
    version: &'a VersionJson,
    options: &'a LaunchOptions,
    game_dir: String,
    assets_root: String,
    natives_dir: String,
    libraries_dir: String,
    classpath: String,
}

impl Placeholders<'_> {
    fn resolve(&self, arg: &str) -> String {
        arg.replace("${auth_player_name}", &self.options.username)
            .replace("${auth_uuid}", &self.options.uuid.simple().to_string())
            .replace("${auth_access_token}", &self.options.access_token)
            .replace("${auth_session}", &self.options.access_token)
            .replace("${auth_xuid}", "0")
            .replace("${clientid}", "0")
            .replace("${user_type}", "legacy")
            .replace("${user_properties}", "{}")
            .replace("${version_name}", self.version_id)
            .replace(
                "${version_type}",
                self.version.version_type.as_deref().unwrap_or("release"),
            )
            .replace("${game_directory}", &self.game_dir)
            .replace("${assets_root}", &self.assets_root)
            .replace("${game_assets}", &self.assets_root)
            .replace("${assets_index_name}", self.version.asset_index_name())
            .replace("${natives_directory}", &self.natives_dir)
            .replace("${library_directory}", &self.libraries_dir)
            .replace("${classpath_separator}", classpath_separator())
            .replace("${classpath}", &self.classpath)
            .replace("${launcher_name}", LAUNCHER_NAME)
            .replace("${launcher_version}", LAUNCHER_VERSION)
    }

    /// Substitute every argument; an argument left with an unknown placeholder
    /// is dropped together with the option that introduced it.
    fn resolve_all(&self, raw_args: &[String]) -> Vec<String> {
        let mut resolved = Vec::with_capacity(raw_args.len());
        for arg in raw_args {
            let value = self.resolve(arg);
            if value.contains("${") {
                drop_dangling_option(&mut resolved);
                continue;
            }
            resolved.push(value);
        }
        resolved
    }
}

fn assemble(
    java: &Path,
    version: &VersionJson,
    version_id: &str,
    install_dir: &Path,
    options: &LaunchOptions,
) -> LauncherResult<Vec<String>> {
    let jar_id = version.jar_id.as_deref().unwrap_or(version_id);
    let client_jar = VersionJson::client_jar_path(install_dir, jar_id);
    if !client_jar.is_file() {
        return Err(LauncherError::Launch(format!(
            "client jar missing: {}",
            client_jar.display()
        )));
    }

    let libraries_dir = install_dir.join("libraries");
    let classpath = build_classpath(version, &libraries_dir, &client_jar)?;

    let placeholders = Placeholders {
        version_id,
        version,
        options,
        game_dir: path_str(install_dir),
        assets_root: path_str(&install_dir.join("assets")),
        natives_dir: path_str(&natives_dir(install_dir, version_id)),
        libraries_dir: path_str(&libraries_dir),
        classpath: classpath.clone(),
    };

    let mut command = vec![path_str(java)];
    command.extend(options.jvm_arguments.iter().cloned());

    let jvm_args = strip_classpath_args(placeholders.resolve_all(&version.simple_jvm_args()));
    if !jvm_args.iter().any(|a| a.starts_with("-Djava.library.path=")) {
        command.push(format!("-Djava.library.path={}", placeholders.natives_dir));
    }
    command.extend(jvm_args);
    command.push("-cp".into());
    command.push(classpath);

    command.push(version.main_class.clone());
    command.extend(placeholders.resolve_all(&version.simple_game_args()));
    command.extend(options.game_args.iter().cloned());

    Ok(command)
}

fn build_classpath(version: &VersionJson, libraries_dir: &Path, client_jar: &Path) -> LauncherResult<String> {
    let mut entries: Vec<String> = Vec::new();
    for lib in version.allowed_libraries() {
        let Some(relative) = lib.classpath_path()? else {
            continue;
        };
        let entry = path_str(&libraries_dir.join(relative));
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }
    entries.push(path_str(client_jar));
    Ok(entries.join(classpath_separator()))
}

/// We always pass our own classpath, so loader-provided switches go with their value.
fn strip_classpath_args(args: Vec<String>) -> Vec<String> {
    let mut stripped = Vec::with_capacity(args.len());
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "-cp" || arg == "-classpath" || arg == "--class-path" {
            iter.next();
            continue;
        }
        stripped.push(arg);
    }
    stripped
}

fn drop_dangling_option(args: &mut Vec<String>) {
    if args.last().is_some_and(|last| last.starts_with('-')) {
        let _ = args.pop();
    }
}

pub fn classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

pub fn format_command_for_logs(command: &[String]) -> String {
    command
        .iter()
        .map(|arg| shell_escape(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }
    if raw
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || "-_./:=${}@+,".contains(ch))
    {
        return raw.to_string();
    }
    format!("\"{}\"", raw.replace('"', "\\\""))
}
