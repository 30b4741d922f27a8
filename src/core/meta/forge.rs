// ─── Forge promotions ───
// `promotions_slim.json` maps "<game version>-<channel>" keys to Forge builds.

use serde::Deserialize;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::maven::MavenArtifact;

#[derive(Debug, Deserialize)]
pub(super) struct PromotionsPayload {
    pub promos: serde_json::Map<String, serde_json::Value>,
}

/// One promotion entry, e.g. `("1.20.1-recommended", "47.2.0")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgePromotion {
    pub key: String,
    pub build: String,
}

impl ForgePromotion {
    /// The game version this promotion belongs to (text before the first `-`).
    pub fn game_version(&self) -> &str {
        self.key.split_once('-').map_or(&self.key, |(game, _)| game)
    }

    /// Maven coordinate of the installer jar for this build.
    pub fn installer_coordinate(&self) -> String {
        format!(
            "net.minecraftforge:forge:{}-{}:installer",
            self.game_version(),
            self.build
        )
    }
}

/// Promotions in the order the remote payload lists them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForgePromotions {
    entries: Vec<ForgePromotion>,
}

impl ForgePromotions {
    pub fn new(entries: Vec<ForgePromotion>) -> Self {
        Self { entries }
    }

    pub(super) fn from_payload(url: &str, payload: PromotionsPayload) -> LauncherResult<Self> {
        let mut entries = Vec::with_capacity(payload.promos.len());
        for (key, value) in payload.promos {
            let build = value.as_str().ok_or_else(|| LauncherError::BadResponse {
                url: url.to_string(),
                reason: format!("promotion {key} is not a string"),
            })?;
            entries.push(ForgePromotion {
                key,
                build: build.to_string(),
            });
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ForgePromotion] {
        &self.entries
    }

    /// First entry whose key starts with `<game_version>-`.
    ///
    /// There is no latest/recommended preference: payload order decides.
    pub fn resolve(&self, game_version: &str) -> Option<&ForgePromotion> {
        let prefix = format!("{}-", game_version);
        self.entries.iter().find(|e| e.key.starts_with(&prefix))
    }

    /// Distinct game versions, first occurrence order.
    pub fn game_versions(&self) -> Vec<String> {
        let mut versions: Vec<String> = Vec::new();
        for entry in &self.entries {
            let game = entry.game_version();
            if !versions.iter().any(|v| v == game) {
                versions.push(game.to_string());
            }
        }
        versions
    }

    pub fn installer_url(&self, game_version: &str, repo_base: &str) -> LauncherResult<String> {
        let promotion = self.resolve(game_version).ok_or_else(|| {
            LauncherError::NotFound(format!("no Forge build for Minecraft {game_version}"))
        })?;
        let artifact = MavenArtifact::parse(&promotion.installer_coordinate())?;
        Ok(artifact.url(repo_base))
    }
}
