use std::collections::HashMap;
use std::path::Path;

use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::{info, warn};

use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::get_text;
use crate::core::progress::InstallProgress;
use crate::core::version::version_file::AssetIndexInfo;

const RESOURCES_URL: &str = "https://resources.download.minecraft.net";
const PARALLEL_DOWNLOADS: usize = 8;

#[derive(Debug, Deserialize)]
struct AssetIndex {
    objects: HashMap<String, AssetObject>,
}

#[derive(Debug, Deserialize)]
struct AssetObject {
    hash: String,
}

/// Save the asset index and fetch every object not already on disk.
pub(super) async fn install_assets(
    client: &reqwest::Client,
    downloader: &Downloader,
    index_info: &AssetIndexInfo,
    install_dir: &Path,
    progress: &dyn InstallProgress,
) -> LauncherResult<()> {
    let assets_dir = install_dir.join("assets");
    let index_text = get_text(client, &index_info.url).await?;
    let index: AssetIndex = serde_json::from_str(&index_text)?;

    let indexes_dir = assets_dir.join("indexes");
    tokio::fs::create_dir_all(&indexes_dir)
        .await
        .map_err(|e| LauncherError::io(&indexes_dir, e))?;
    let index_path = indexes_dir.join(format!("{}.json", index_info.id));
    tokio::fs::write(&index_path, &index_text)
        .await
        .map_err(|e| LauncherError::io(&index_path, e))?;

    let objects_dir = assets_dir.join("objects");
    let missing: Vec<(String, std::path::PathBuf)> = index
        .objects
        .values()
        .filter(|obj| obj.hash.len() > 2)
        .filter_map(|obj| {
            let prefix = &obj.hash[..2];
            let dest = objects_dir.join(prefix).join(&obj.hash);
            if dest.exists() {
                return None;
            }
            Some((format!("{}/{}/{}", RESOURCES_URL, prefix, obj.hash), dest))
        })
        .collect();

    info!(
        "Downloading {} asset objects ({} already cached)",
        missing.len(),
        index.objects.len() - missing.len()
    );

    progress.set_status("Download Assets");
    progress.set_max(missing.len() as u64);

    let mut results = stream::iter(missing)
        .map(|(url, dest)| async move { downloader.download_file(&url, &dest).await })
        .buffer_unordered(PARALLEL_DOWNLOADS);

    let mut done: u64 = 0;
    let mut failures = 0usize;
    while let Some(result) = results.next().await {
        if let Err(err) = result {
            warn!("Asset download failed: {}", err);
            failures += 1;
        }
        done += 1;
        progress.set_progress(done);
    }

    if failures > 0 {
        return Err(LauncherError::Install(format!(
            "{failures} asset downloads failed"
        )));
    }
    Ok(())
}
