// ─── Version File ───
// Parses a Mojang-format version JSON and evaluates OS rules for libraries
// and arguments.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::manifest::versions_dir;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::maven::MavenArtifact;

/// A parsed version JSON (vanilla, or a loader profile merged onto its parent).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionJson {
    pub id: Option<String>,
    pub main_class: String,
    #[serde(default)]
    pub inherits_from: Option<String>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    pub downloads: Option<VersionDownloads>,
    #[serde(default)]
    pub asset_index: Option<AssetIndexInfo>,
    /// Legacy asset index name (pre-1.7 profiles).
    #[serde(default)]
    pub assets: Option<String>,
    #[serde(default)]
    pub arguments: Option<Arguments>,
    /// Legacy `minecraftArguments` field (pre-1.13).
    #[serde(default)]
    pub minecraft_arguments: Option<String>,
    #[serde(default, rename = "type")]
    pub version_type: Option<String>,
    /// Root of the `inheritsFrom` chain; owns the client jar.
    #[serde(skip)]
    pub jar_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VersionDownloads {
    pub client: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadArtifact {
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetIndexInfo {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<serde_json::Value>,
    #[serde(default)]
    pub jvm: Vec<serde_json::Value>,
}

// ─── Library Entry with Rules ───

#[derive(Debug, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    /// Maven repository base for libraries without `downloads` (loader profiles).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub rules: Option<Vec<LibraryRule>>,
    /// OS name -> classifier, e.g. `"linux": "natives-linux"` (pre-1.19 LWJGL).
    #[serde(default)]
    pub natives: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
pub struct LibraryDownloads {
    pub artifact: Option<LibDownloadArtifact>,
    #[serde(default)]
    pub classifiers: Option<BTreeMap<String, LibDownloadArtifact>>,
}

#[derive(Debug, Deserialize)]
pub struct LibDownloadArtifact {
    pub path: String,
    pub sha1: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct LibraryRule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Deserialize)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
}

impl LibraryEntry {
    /// Mojang rules: no rules means allowed; otherwise start disallowed and let
    /// the last matching rule decide.
    pub fn is_allowed_for_current_os(&self) -> bool {
        let Some(rules) = &self.rules else {
            return true;
        };

        let current_os = current_os_name();
        let mut allowed = false;
        for rule in rules {
            let os_matches = match rule.os.as_ref().and_then(|os| os.name.as_deref()) {
                None => true,
                Some(name) => name == current_os,
            };
            if os_matches {
                allowed = rule.action == RuleAction::Allow;
            }
        }
        allowed
    }

    /// Path of the jar relative to the libraries directory.
    pub fn relative_path(&self) -> LauncherResult<PathBuf> {
        if let Some(artifact) = self.downloads.as_ref().and_then(|d| d.artifact.as_ref()) {
            return Ok(PathBuf::from(&artifact.path));
        }
        Ok(MavenArtifact::parse(&self.name)?.local_path())
    }

    /// Entries that only ship per-OS classifier jars (1.12.2 `lwjgl-platform`)
    /// have no jar of their own.
    pub fn is_natives_only(&self) -> bool {
        match &self.downloads {
            Some(downloads) => downloads.artifact.is_none() && downloads.classifiers.is_some(),
            None => false,
        }
    }

    /// Classpath entry relative to the libraries directory, if the library has one.
    pub fn classpath_path(&self) -> LauncherResult<Option<PathBuf>> {
        if self.is_natives_only() {
            return Ok(None);
        }
        self.relative_path().map(Some)
    }

    /// Classifier holding this OS's natives, with `${arch}` filled in.
    pub fn native_classifier_for_current_os(&self) -> Option<String> {
        let classifier = self.natives.as_ref()?.get(current_os_name())?;
        let arch = if cfg!(target_pointer_width = "64") { "64" } else { "32" };
        Some(classifier.replace("${arch}", arch))
    }

    /// Download entry of this OS's natives jar.
    pub fn native_artifact(&self) -> Option<&LibDownloadArtifact> {
        let classifier = self.native_classifier_for_current_os()?;
        self.downloads
            .as_ref()?
            .classifiers
            .as_ref()?
            .get(&classifier)
    }
}

/// Mojang OS name for the current platform.
pub fn current_os_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "osx"
    } else {
        "linux"
    }
}

impl VersionJson {
    pub fn json_path(install_dir: &Path, version_id: &str) -> PathBuf {
        versions_dir(install_dir)
            .join(version_id)
            .join(format!("{version_id}.json"))
    }

    pub fn client_jar_path(install_dir: &Path, version_id: &str) -> PathBuf {
        versions_dir(install_dir)
            .join(version_id)
            .join(format!("{version_id}.jar"))
    }

    /// Load an installed version, folding in its `inheritsFrom` chain.
    pub async fn load_installed(install_dir: &Path, version_id: &str) -> LauncherResult<Self> {
        let mut merged = read_json_value(install_dir, version_id).await?;
        let mut jar_id = version_id.to_string();
        let mut depth = 0;

        while let Some(parent_id) = merged
            .get("inheritsFrom")
            .and_then(|v| v.as_str())
            .map(str::to_string)
        {
            depth += 1;
            if depth > 8 {
                return Err(LauncherError::Launch(format!(
                    "inheritsFrom chain of {version_id} is too deep"
                )));
            }
            let parent = read_json_value(install_dir, &parent_id).await?;
            merged = Self::merge_with_parent_json(&merged, &parent);
            jar_id = parent_id;
        }

        let mut version: VersionJson = serde_json::from_value(merged)?;
        version.jar_id = Some(jar_id);
        Ok(version)
    }

    /// Child keys override the parent's, except `libraries` (child first, then
    /// parent) and `arguments` (parent first, then child) which are concatenated.
    pub fn merge_with_parent_json(
        current_json: &serde_json::Value,
        parent_json: &serde_json::Value,
    ) -> serde_json::Value {
        let mut merged = parent_json.clone();
        let Some(obj) = current_json.as_object() else {
            return merged;
        };

        for (k, v) in obj {
            match k.as_str() {
                "inheritsFrom" => {
                    merged[k] = parent_json
                        .get("inheritsFrom")
                        .cloned()
                        .unwrap_or(serde_json::Value::Null);
                }
                "libraries" => {
                    let mut libs = v.as_array().cloned().unwrap_or_default();
                    if let Some(parent_libs) = parent_json.get("libraries").and_then(|l| l.as_array())
                    {
                        libs.extend(parent_libs.iter().cloned());
                    }
                    merged[k] = serde_json::Value::Array(libs);
                }
                "arguments" => {
                    for side in ["game", "jvm"] {
                        let mut args = parent_json
                            .get("arguments")
                            .and_then(|a| a.get(side))
                            .and_then(|a| a.as_array())
                            .cloned()
                            .unwrap_or_default();
                        if let Some(child) = v.get(side).and_then(|a| a.as_array()) {
                            args.extend(child.iter().cloned());
                        }
                        merged["arguments"][side] = serde_json::Value::Array(args);
                    }
                }
                _ => merged[k] = v.clone(),
            }
        }

        merged
    }

    /// Libraries allowed on this OS.
    pub fn allowed_libraries(&self) -> impl Iterator<Item = &LibraryEntry> {
        self.libraries.iter().filter(|l| l.is_allowed_for_current_os())
    }

    /// Natives jars (relative to the libraries directory) to unpack before launch.
    pub fn native_jars(&self) -> Vec<PathBuf> {
        self.allowed_libraries()
            .filter_map(|lib| lib.native_artifact())
            .map(|artifact| PathBuf::from(&artifact.path))
            .collect()
    }

    /// Asset index name (`assetIndex.id`, legacy `assets`, else `legacy`).
    pub fn asset_index_name(&self) -> &str {
        self.asset_index
            .as_ref()
            .map(|a| a.id.as_str())
            .or(self.assets.as_deref())
            .unwrap_or("legacy")
    }

    /// Game arguments that apply without optional features.
    pub fn simple_game_args(&self) -> Vec<String> {
        match &self.arguments {
            Some(args) if !args.game.is_empty() => {
                args.game.iter().flat_map(extract_argument_values).collect()
            }
            _ => match &self.minecraft_arguments {
                Some(s) => s.split_whitespace().map(|s| s.to_string()).collect(),
                None => vec![],
            },
        }
    }

    /// JVM arguments that apply on this OS.
    pub fn simple_jvm_args(&self) -> Vec<String> {
        match &self.arguments {
            Some(args) => args.jvm.iter().flat_map(extract_argument_values).collect(),
            None => vec![],
        }
    }
}

async fn read_json_value(install_dir: &Path, version_id: &str) -> LauncherResult<serde_json::Value> {
    let path = VersionJson::json_path(install_dir, version_id);
    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| LauncherError::io(&path, e))?;
    Ok(serde_json::from_str(&raw)?)
}

fn extract_argument_values(value: &serde_json::Value) -> Vec<String> {
    if let Some(arg) = value.as_str() {
        return vec![arg.to_string()];
    }

    let Some(obj) = value.as_object() else {
        return vec![];
    };

    if let Some(rules) = obj.get("rules").and_then(|r| r.as_array()) {
        if !rules_allow_current_os(rules) {
            return vec![];
        }
    }

    match obj.get("value") {
        Some(serde_json::Value::String(s)) => vec![s.clone()],
        Some(serde_json::Value::Array(arr)) => arr
            .iter()
            .filter_map(|v| v.as_str().map(ToString::to_string))
            .collect(),
        _ => vec![],
    }
}

/// Feature-gated rules (demo user, custom resolution, quick play) never match:
/// none of those features is enabled for a launch.
fn rules_allow_current_os(rules: &[serde_json::Value]) -> bool {
    let mut allowed = false;
    let current_os = current_os_name();

    for rule in rules {
        if rule.get("features").is_some() {
            continue;
        }

        let action = rule
            .get("action")
            .and_then(|v| v.as_str())
            .unwrap_or("disallow");

        let os_matches = match rule
            .get("os")
            .and_then(|os| os.get("name"))
            .and_then(|name| name.as_str())
        {
            None => true,
            Some(name) => name == current_os,
        };

        if os_matches {
            allowed = action == "allow";
        }
    }

    allowed
}
