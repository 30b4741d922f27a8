// ─── Mod Folder ───
// `<install>/mods`: the jars a loader picks up at startup.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone)]
pub struct ModFolder {
    dir: PathBuf,
}

impl ModFolder {
    pub fn new(install_dir: &Path) -> Self {
        Self {
            dir: install_dir.join("mods"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Jar file names, sorted. Creates the folder when it is missing.
    pub async fn list(&self) -> LauncherResult<Vec<String>> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| LauncherError::io(&self.dir, e))?;

        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| LauncherError::io(&self.dir, e))?;

        let mut jars = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LauncherError::io(&self.dir, e))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_jar(&name) && entry.path().is_file() {
                jars.push(name);
            }
        }
        jars.sort();
        Ok(jars)
    }

    /// Copy `source` into the folder and return the stored file name.
    pub async fn add(&self, source: &Path) -> LauncherResult<String> {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| is_jar(n))
            .ok_or_else(|| LauncherError::Other(format!("Not a mod jar: {}", source.display())))?;

        if !source.is_file() {
            return Err(LauncherError::NotFound(source.display().to_string()));
        }

        let dest = self.dir.join(&name);
        if dest.exists() {
            return Err(LauncherError::ModAlreadyInstalled(name));
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| LauncherError::io(&self.dir, e))?;
        tokio::fs::copy(source, &dest)
            .await
            .map_err(|e| LauncherError::io(&dest, e))?;

        info!("Installed mod {} into {:?}", name, self.dir);
        Ok(name)
    }
}

fn is_jar(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".jar")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_creates_the_folder_and_keeps_only_jars() {
        let dir = tempfile::tempdir().unwrap();
        let mods = ModFolder::new(dir.path());

        assert!(mods.list().await.unwrap().is_empty());
        assert!(mods.path().is_dir());

        std::fs::write(mods.path().join("sodium.jar"), b"x").unwrap();
        std::fs::write(mods.path().join("README.txt"), b"x").unwrap();
        std::fs::write(mods.path().join("iris.jar"), b"x").unwrap();

        assert_eq!(mods.list().await.unwrap(), vec!["iris.jar", "sodium.jar"]);
    }

    #[tokio::test]
    async fn add_copies_once_then_refuses_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("lithium.jar");
        std::fs::write(&source, b"jar bytes").unwrap();
        let mods = ModFolder::new(&dir.path().join("game"));

        assert_eq!(mods.add(&source).await.unwrap(), "lithium.jar");
        assert_eq!(
            std::fs::read(mods.path().join("lithium.jar")).unwrap(),
            b"jar bytes"
        );

        let err = mods.add(&source).await.unwrap_err();
        assert!(matches!(err, LauncherError::ModAlreadyInstalled(ref n) if n == "lithium.jar"));
    }

    #[tokio::test]
    async fn non_jar_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, b"x").unwrap();

        let err = ModFolder::new(dir.path()).add(&source).await.unwrap_err();
        assert!(matches!(err, LauncherError::Other(_)));
    }
}
