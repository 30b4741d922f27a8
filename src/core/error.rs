use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the launcher core.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} failed: HTTP {status}")]
    Network { url: String, status: u16 },

    #[error("Bad response from {url}: {reason}")]
    BadResponse { url: String, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    // ── Artifacts ───────────────────────────────────────
    #[error("Download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── Install / launch ────────────────────────────────
    #[error("Install failed: {0}")]
    Install(String),

    #[error("Launch failed: {0}")]
    Launch(String),

    #[error("Memory must be between {min} and {max} MB, got {value}")]
    InvalidMemory { value: u32, min: u32, max: u32 },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Settings / mods ─────────────────────────────────
    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Mod already installed: {0}")]
    ModAlreadyInstalled(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl LauncherError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_error_names_url_and_status() {
        let err = LauncherError::Network {
            url: "https://example.com/x.json".into(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "Request to https://example.com/x.json failed: HTTP 503"
        );
    }

    #[test]
    fn io_helper_keeps_the_path() {
        let err = LauncherError::io(
            "/tmp/x.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("/tmp/x.json"));
    }
}
