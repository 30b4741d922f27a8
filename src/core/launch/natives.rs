// ─── Natives ───
// LWJGL 2 ships its shared libraries inside per-OS classifier jars. They are
// unpacked into versions/<id>/natives before every launch.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::VersionJson;

const NATIVE_EXTENSIONS: [&str; 4] = [".dll", ".so", ".dylib", ".jnilib"];

pub fn natives_dir(install_dir: &Path, version_id: &str) -> PathBuf {
    install_dir.join("versions").join(version_id).join("natives")
}

/// Unpack every natives jar the version lists for this OS into `natives_dir`,
/// replacing whatever a previous launch left there. Returns the number of
/// files written.
pub async fn extract_natives(
    version: &VersionJson,
    install_dir: &Path,
    natives_dir: &Path,
) -> LauncherResult<usize> {
    let jars = version.native_jars();
    if jars.is_empty() {
        return Ok(0);
    }

    if natives_dir.exists() {
        let _ = tokio::fs::remove_dir_all(natives_dir).await;
    }
    tokio::fs::create_dir_all(natives_dir)
        .await
        .map_err(|e| LauncherError::io(natives_dir, e))?;

    let libraries_dir = install_dir.join("libraries");
    let mut extracted = 0;
    for jar in jars {
        let jar_path = libraries_dir.join(jar);
        let bytes = tokio::fs::read(&jar_path).await.map_err(|e| {
            LauncherError::Launch(format!("natives jar {} unreadable: {e}", jar_path.display()))
        })?;

        let dest_dir = natives_dir.to_path_buf();
        extracted += tokio::task::spawn_blocking(move || unpack(&jar_path, bytes, &dest_dir))
            .await
            .map_err(|e| LauncherError::Other(format!("Task join error: {}", e)))??;
    }

    debug!("Extracted {} native libraries into {:?}", extracted, natives_dir);
    Ok(extracted)
}

/// Top-level shared libraries only; `META-INF` and nested entries stay in the jar.
fn unpack(jar_path: &Path, bytes: Vec<u8>, dest_dir: &Path) -> LauncherResult<usize> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| {
        LauncherError::Launch(format!("cannot open natives jar {}: {e}", jar_path.display()))
    })?;

    let mut written = 0;
    for i in 0..archive.len() {
        let Ok(mut file) = archive.by_index(i) else {
            continue;
        };
        let name = file.name().to_string();
        if name.contains("META-INF") || name.contains('/') || name.contains('\\') {
            continue;
        }
        if !NATIVE_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            continue;
        }

        let dest = dest_dir.join(&name);
        let mut out = std::fs::File::create(&dest).map_err(|e| LauncherError::io(&dest, e))?;
        std::io::copy(&mut file, &mut out).map_err(|e| LauncherError::io(&dest, e))?;
        written += 1;
    }
    Ok(written)
}
