// ─── Launcher Settings ───
// Loaded once at startup and passed explicitly to whoever needs it. Every
// change goes through `SettingsPort::save`.

mod store;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::launch::{GraphicsQuality, MemoryMb};
use crate::core::version::LoaderType;

pub use store::{default_install_dir, JsonSettingsStore, SettingsPort};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherSettings {
    pub install_dir: PathBuf,
    pub username: String,
    /// Raw MB as stored; read it through [`LauncherSettings::memory`].
    pub memory: u32,
    pub quality: GraphicsQuality,
    pub performance: bool,
    /// Last selected loader and version.
    pub loader: LoaderType,
    pub version: Option<String>,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            install_dir: default_install_dir(),
            username: String::new(),
            memory: MemoryMb::default().get(),
            quality: GraphicsQuality::default(),
            performance: false,
            loader: LoaderType::default(),
            version: None,
        }
    }
}

impl LauncherSettings {
    pub fn memory(&self) -> MemoryMb {
        MemoryMb::clamped(self.memory)
    }

    /// Pull persisted values back into their allowed ranges.
    pub fn normalized(mut self) -> Self {
        self.memory = self.memory().get();
        self
    }

    pub fn apply(&mut self, change: SettingChange) {
        match change {
            SettingChange::InstallDir(dir) => self.install_dir = dir,
            SettingChange::Username(name) => self.username = name,
            SettingChange::Memory(memory) => self.memory = memory.get(),
            SettingChange::Quality(quality) => self.quality = quality,
            SettingChange::Performance(on) => self.performance = on,
            SettingChange::Loader(loader) => self.loader = loader,
            SettingChange::Version(version) => self.version = version,
        }
    }
}

/// One persisted key and its new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingChange {
    InstallDir(PathBuf),
    Username(String),
    Memory(MemoryMb),
    Quality(GraphicsQuality),
    Performance(bool),
    Loader(LoaderType),
    Version(Option<String>),
}

impl SettingChange {
    pub const KEYS: [&'static str; 7] = [
        "install_dir",
        "username",
        "memory",
        "quality",
        "performance",
        "loader",
        "version",
    ];

    /// Parse a `key value` pair as typed on the command line.
    pub fn parse(key: &str, value: &str) -> LauncherResult<Self> {
        let change = match key {
            "install_dir" => SettingChange::InstallDir(PathBuf::from(value)),
            "username" => SettingChange::Username(value.trim().to_string()),
            "memory" => SettingChange::Memory(value.parse()?),
            "quality" => SettingChange::Quality(value.parse()?),
            "performance" => SettingChange::Performance(parse_bool(value)?),
            "loader" => SettingChange::Loader(value.parse()?),
            "version" => SettingChange::Version(match value.trim() {
                "" => None,
                v => Some(v.to_string()),
            }),
            other => {
                return Err(LauncherError::Settings(format!(
                    "unknown key '{other}', expected one of: {}",
                    Self::KEYS.join(", ")
                )))
            }
        };
        Ok(change)
    }
}

fn parse_bool(value: &str) -> LauncherResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => Err(LauncherError::Settings(format!(
            "expected true or false, got '{other}'"
        ))),
    }
}
