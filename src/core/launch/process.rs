use std::path::Path;
use std::process::{Command, Stdio};

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

use tracing::info;

use crate::core::error::{LauncherError, LauncherResult};

pub trait ProcessSpawner: Send + Sync {
    /// Start `command` and return its pid without waiting for it.
    fn spawn(&self, command: &[String], working_dir: &Path) -> LauncherResult<u32>;
}

/// Spawns the game detached from the launcher: stdio is discarded and the
/// child is never waited on.
#[derive(Debug, Default)]
pub struct DetachedSpawner;

impl ProcessSpawner for DetachedSpawner {
    fn spawn(&self, command: &[String], working_dir: &Path) -> LauncherResult<u32> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| LauncherError::Launch("empty launch command".into()))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        configure_platform_spawn(&mut cmd);

        let child = cmd
            .spawn()
            .map_err(|e| LauncherError::Launch(format!("could not start {program}: {e}")))?;

        let pid = child.id();
        info!("Spawned game process (PID {})", pid);
        Ok(pid)
    }
}

fn configure_platform_spawn(cmd: &mut Command) {
    #[cfg(target_os = "windows")]
    {
        const DETACHED_PROCESS: u32 = 0x00000008;
        cmd.creation_flags(DETACHED_PROCESS);
    }
    #[cfg(not(target_os = "windows"))]
    let _ = cmd;
}
