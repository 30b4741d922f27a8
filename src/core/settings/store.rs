use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{LauncherSettings, SettingChange};
use crate::core::error::{LauncherError, LauncherResult};

const APP_DIR_NAME: &str = "BedrockLauncher";
const SETTINGS_FILE: &str = "launcher_settings.json";

pub trait SettingsPort: Send + Sync {
    /// Current settings; defaults when nothing usable is stored.
    fn load(&self) -> LauncherSettings;

    /// Persist one change and return the settings as now stored.
    fn save(&self, change: SettingChange) -> LauncherResult<LauncherSettings>;
}

/// Settings kept as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/BedrockLauncher/launcher_settings.json`.
    pub fn at_default_location() -> LauncherResult<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| LauncherError::Settings("no config directory on this platform".into()))?;
        Ok(Self::new(base.join(APP_DIR_NAME).join(SETTINGS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, settings: &LauncherSettings) -> LauncherResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, json).map_err(|e| LauncherError::io(&self.path, e))
    }
}

impl SettingsPort for JsonSettingsStore {
    fn load(&self) -> LauncherSettings {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                debug!("No settings at {:?} ({}), using defaults", self.path, err);
                return LauncherSettings::default();
            }
        };

        match serde_json::from_str::<LauncherSettings>(&raw) {
            Ok(settings) => settings.normalized(),
            Err(err) => {
                warn!("Ignoring unreadable settings file {:?}: {}", self.path, err);
                LauncherSettings::default()
            }
        }
    }

    fn save(&self, change: SettingChange) -> LauncherResult<LauncherSettings> {
        let mut settings = self.load();
        settings.apply(change);
        self.write(&settings)?;
        info!("Settings saved to {:?}", self.path);
        Ok(settings)
    }
}

/// The game's usual data directory for this platform.
pub fn default_install_dir() -> PathBuf {
    if cfg!(target_os = "windows") {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".minecraft")
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("minecraft")
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".minecraft")
    }
}
