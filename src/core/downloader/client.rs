use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

/// Places a remote artifact on disk.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Returns the number of bytes written to `dest`.
    async fn download(&self, url: &str, dest: &Path) -> LauncherResult<u64>;
}

/// Streaming downloader. No resumption and no checksum: `dest` is truncated
/// and rewritten chunk by chunk.
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Stream `url` into `dest`, creating parent directories as needed.
    pub async fn download_file(&self, url: &str, dest: &Path) -> LauncherResult<u64> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(LauncherError::Network {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let download_err = |reason: String| LauncherError::Download {
            url: url.to_string(),
            reason,
        };

        // Scoped so the handle is closed before callers touch the file.
        let written = {
            let mut file = tokio::fs::File::create(dest)
                .await
                .map_err(|e| download_err(format!("{}: {}", dest.display(), e)))?;

            let mut written: u64 = 0;
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| download_err(e.to_string()))?;
                file.write_all(&chunk)
                    .await
                    .map_err(|e| download_err(e.to_string()))?;
                written += chunk.len() as u64;
            }
            file.flush().await.map_err(|e| download_err(e.to_string()))?;
            written
        };

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, written);
        Ok(written)
    }

    /// Whether an existing file matches the expected SHA-1.
    pub async fn validate_sha1(path: &Path, expected: &str) -> LauncherResult<bool> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| LauncherError::io(path, e))?;
        Ok(sha1_hex(&bytes).eq_ignore_ascii_case(expected))
    }
}

#[async_trait]
impl ArtifactFetcher for Downloader {
    async fn download(&self, url: &str, dest: &Path) -> LauncherResult<u64> {
        self.download_file(url, dest).await
    }
}

pub fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::core::http::build_http_client;

    async fn serve(route: &str, response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    }

    fn downloader() -> Downloader {
        Downloader::new(build_http_client().unwrap())
    }

    #[tokio::test]
    async fn download_streams_body_into_new_directories() {
        let body: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let server = serve(
            "/client.jar",
            ResponseTemplate::new(200).set_body_bytes(body.clone()),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("versions/1.21/1.21.jar");

        let written = downloader()
            .download_file(&format!("{}/client.jar", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(written, body.len() as u64);
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), body);
    }

    #[tokio::test]
    async fn download_truncates_an_existing_file() {
        let server = serve("/a.jar", ResponseTemplate::new(200).set_body_bytes(b"new".to_vec())).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a.jar");
        tokio::fs::write(&dest, b"much longer stale contents").await.unwrap();

        let fetcher: &dyn ArtifactFetcher = &downloader();
        let written = fetcher
            .download(&format!("{}/a.jar", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(written, 3);
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn non_ok_status_leaves_no_file() {
        for status in [204, 404] {
            let server = serve("/missing.jar", ResponseTemplate::new(status)).await;
            let dir = tempfile::tempdir().unwrap();
            let dest = dir.path().join("missing.jar");

            let result = downloader()
                .download_file(&format!("{}/missing.jar", server.uri()), &dest)
                .await;

            assert!(
                matches!(&result, Err(LauncherError::Network { status: s, .. }) if *s == status),
                "unexpected result for {status}: {result:?}"
            );
            assert!(!dest.exists());
        }
    }

    #[test]
    fn sha1_of_known_input() {
        assert_eq!(sha1_hex(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[tokio::test]
    async fn validate_sha1_compares_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.bin");
        tokio::fs::write(&path, b"abc").await.unwrap();

        assert!(
            Downloader::validate_sha1(&path, "A9993E364706816ABA3E25717850C26C9CD0D89D")
                .await
                .unwrap()
        );
        assert!(!Downloader::validate_sha1(&path, "00").await.unwrap());
    }

    #[tokio::test]
    async fn validate_sha1_reports_missing_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.bin");
        match Downloader::validate_sha1(&path, "00").await {
            Err(LauncherError::Io { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
