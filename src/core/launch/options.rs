use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::LauncherError;

pub const MIN_MEMORY_MB: u32 = 128;
pub const MAX_MEMORY_MB: u32 = 8192;
pub const DEFAULT_MEMORY_MB: u32 = 2048;

/// Placeholder token for offline launches; no authentication is performed.
pub const OFFLINE_ACCESS_TOKEN: &str = "offline_access_token";

/// Heap size in MB, always within `[MIN_MEMORY_MB, MAX_MEMORY_MB]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MemoryMb(u32);

impl MemoryMb {
    /// Clamp an arbitrary value into range (used for persisted values).
    pub fn clamped(value: u32) -> Self {
        Self(value.clamp(MIN_MEMORY_MB, MAX_MEMORY_MB))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn max_heap_flag(self) -> String {
        format!("-Xmx{}M", self.0)
    }

    /// Half the maximum, integer division.
    pub fn min_heap_flag(self) -> String {
        format!("-Xms{}M", self.0 / 2)
    }

    pub fn jvm_arguments(self) -> Vec<String> {
        vec![self.max_heap_flag(), self.min_heap_flag()]
    }
}

impl Default for MemoryMb {
    fn default() -> Self {
        Self(DEFAULT_MEMORY_MB)
    }
}

impl TryFrom<u32> for MemoryMb {
    type Error = LauncherError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if (MIN_MEMORY_MB..=MAX_MEMORY_MB).contains(&value) {
            Ok(Self(value))
        } else {
            Err(LauncherError::InvalidMemory {
                value,
                min: MIN_MEMORY_MB,
                max: MAX_MEMORY_MB,
            })
        }
    }
}

impl FromStr for MemoryMb {
    type Err = LauncherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<u32>()
            .map_err(|_| LauncherError::Other(format!("Not a memory size: {s}")))?;
        Self::try_from(value)
    }
}

impl fmt::Display for MemoryMb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphicsQuality {
    Fastest,
    Fast,
    #[default]
    Balanced,
    Fancy,
    Ultra,
}

impl GraphicsQuality {
    pub const ALL: [GraphicsQuality; 5] = [
        GraphicsQuality::Fastest,
        GraphicsQuality::Fast,
        GraphicsQuality::Balanced,
        GraphicsQuality::Fancy,
        GraphicsQuality::Ultra,
    ];

    /// Game flag for this quality. `Balanced` is the game's own default.
    pub fn game_flag(self) -> Option<&'static str> {
        match self {
            GraphicsQuality::Fastest | GraphicsQuality::Fast => Some("--fast"),
            GraphicsQuality::Balanced => None,
            GraphicsQuality::Fancy => Some("--fancy"),
            GraphicsQuality::Ultra => Some("--ultra"),
        }
    }
}

impl fmt::Display for GraphicsQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GraphicsQuality::Fastest => "Fastest",
            GraphicsQuality::Fast => "Fast",
            GraphicsQuality::Balanced => "Balanced",
            GraphicsQuality::Fancy => "Fancy",
            GraphicsQuality::Ultra => "Ultra",
        };
        f.write_str(name)
    }
}

impl FromStr for GraphicsQuality {
    type Err = LauncherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GraphicsQuality::ALL
            .into_iter()
            .find(|q| q.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LauncherError::Other(format!("Unknown graphics quality: {s}")))
    }
}

/// Quality flag (if any) followed by `--performance` when the toggle is on.
pub fn graphics_game_args(quality: GraphicsQuality, performance: bool) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(flag) = quality.game_flag() {
        args.push(flag.to_string());
    }
    if performance {
        args.push("--performance".to_string());
    }
    args
}

/// `Player` followed by six random hex digits.
pub fn generate_username() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("Player{}", &random[..6])
}

/// Everything the command builder needs for one launch. Built fresh per
/// attempt and dropped once the process is spawned.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub username: String,
    pub uuid: Uuid,
    pub access_token: String,
    pub jvm_arguments: Vec<String>,
    pub game_args: Vec<String>,
}

impl LaunchOptions {
    pub fn new(
        username: &str,
        memory: MemoryMb,
        quality: GraphicsQuality,
        performance: bool,
    ) -> Self {
        let username = match username.trim() {
            "" => generate_username(),
            name => name.to_string(),
        };

        Self {
            username,
            uuid: Uuid::new_v4(),
            access_token: OFFLINE_ACCESS_TOKEN.into(),
            jvm_arguments: memory.jvm_arguments(),
            game_args: graphics_game_args(quality, performance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_heap_is_half_of_max_for_every_allowed_size() {
        for mb in MIN_MEMORY_MB..=MAX_MEMORY_MB {
            let memory = MemoryMb::try_from(mb).unwrap();
            assert_eq!(memory.max_heap_flag(), format!("-Xmx{mb}M"));
            assert_eq!(memory.min_heap_flag(), format!("-Xms{}M", mb / 2));
            assert!(mb / 2 <= mb);
        }
    }

    #[test]
    fn odd_sizes_round_down() {
        let memory = MemoryMb::try_from(1025).unwrap();
        assert_eq!(memory.jvm_arguments(), vec!["-Xmx1025M", "-Xms512M"]);
    }

    #[test]
    fn out_of_range_memory_is_rejected_or_clamped() {
        assert!(MemoryMb::try_from(127).is_err());
        assert!(MemoryMb::try_from(8193).is_err());
        assert!("abc".parse::<MemoryMb>().is_err());
        assert_eq!(MemoryMb::clamped(16).get(), MIN_MEMORY_MB);
        assert_eq!(MemoryMb::clamped(65536).get(), MAX_MEMORY_MB);
    }

    #[test]
    fn quality_maps_to_at_most_one_flag() {
        let expected = [
            (GraphicsQuality::Fastest, Some("--fast")),
            (GraphicsQuality::Fast, Some("--fast")),
            (GraphicsQuality::Balanced, None),
            (GraphicsQuality::Fancy, Some("--fancy")),
            (GraphicsQuality::Ultra, Some("--ultra")),
        ];
        for (quality, flag) in expected {
            let args = graphics_game_args(quality, false);
            assert_eq!(args, flag.into_iter().map(String::from).collect::<Vec<_>>());
        }
    }

    #[test]
    fn performance_flag_is_independent_of_quality() {
        for quality in GraphicsQuality::ALL {
            let on = graphics_game_args(quality, true);
            let off = graphics_game_args(quality, false);
            assert_eq!(on.last().map(String::as_str), Some("--performance"));
            assert!(!off.iter().any(|a| a == "--performance"));
            assert_eq!(on.len(), off.len() + 1);
        }
    }

    #[test]
    fn quality_parses_its_display_name() {
        for quality in GraphicsQuality::ALL {
            assert_eq!(quality.to_string().parse::<GraphicsQuality>().unwrap(), quality);
        }
        assert_eq!("ultra".parse::<GraphicsQuality>().unwrap(), GraphicsQuality::Ultra);
    }

    #[test]
    fn empty_username_is_generated() {
        let options = LaunchOptions::new("  ", MemoryMb::default(), GraphicsQuality::Balanced, false);
        assert!(options.username.starts_with("Player"));
        assert_eq!(options.username.len(), "Player".len() + 6);
        assert!(options.username.chars().all(|c| c.is_ascii_graphic()));
    }

    #[test]
    fn every_launch_gets_a_fresh_identity() {
        let a = LaunchOptions::new("Steve", MemoryMb::default(), GraphicsQuality::Fancy, false);
        let b = LaunchOptions::new("Steve", MemoryMb::default(), GraphicsQuality::Fancy, false);
        assert_eq!(a.username, "Steve");
        assert_ne!(a.uuid, b.uuid);
        assert_eq!(a.access_token, OFFLINE_ACCESS_TOKEN);
    }
}
