//! Child processes of the bootstrap
//!
//! The server and the model run command are spawned with their output
//! discarded. Unlike a fire-and-forget spawn, each child stays owned by a
//! [`ServerProcess`] until it is stopped or deliberately released.

use crate::config::SpawnStrategy;
use crate::error::{BootstrapError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Owned handle to a background child process
#[derive(Debug)]
pub struct ServerProcess {
    label: String,
    child: Option<Child>,
}

impl ServerProcess {
    /// Wrap a spawned child
    pub fn new(label: impl Into<String>, child: Child) -> Self {
        Self {
            label: label.into(),
            child: Some(child),
        }
    }

    /// Handle that owns no process, for launchers that attach to something
    /// already running
    pub fn unmanaged(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            child: None,
        }
    }

    /// OS process id while the child is owned and has not been reaped
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Whether a child is owned and still running
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Kill the child and wait for it to exit
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            debug!("Stopping {} (pid {:?})", self.label, child.id());
            match child.try_wait()? {
                Some(status) => debug!("{} already exited with {}", self.label, status),
                None => {
                    child.kill().await?;
                    info!("Stopped {}", self.label);
                }
            }
        }
        Ok(())
    }

    /// Give up ownership and leave the child running
    pub fn release(&mut self) -> Option<u32> {
        let pid = self.id();
        if let Some(child) = self.child.take() {
            debug!("Releasing {} (pid {:?})", self.label, pid);
            drop(child);
        }
        pid
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        // Best effort cleanup - kill child process
        if let Some(child) = self.child.as_mut() {
            if let Err(e) = child.start_kill() {
                debug!("Failed to kill {} on drop: {}", self.label, e);
            }
        }
    }
}

/// Process operations the bootstrap depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Whether `binary` resolves on the execution path
    fn is_installed(&self, binary: &str) -> bool;

    /// Pipe the install script at `script_url` into `shell`
    async fn run_install_script(&self, shell: &str, script_url: &str) -> Result<()>;

    /// Spawn `<binary> serve` in the background
    fn spawn_server(&self, binary: &str) -> Result<ServerProcess>;

    /// Run `<binary> run <model>`; `Detached` returns the background handle
    async fn start_model(
        &self,
        binary: &str,
        model: &str,
        strategy: SpawnStrategy,
    ) -> Result<Option<ServerProcess>>;
}

/// [`ProcessLauncher`] backed by real OS processes
#[derive(Debug, Clone, Default)]
pub struct SystemLauncher;

/// Locate an executable on `PATH`
pub fn find_executable(binary: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    find_in_paths(binary, std::env::split_paths(&path))
}

fn find_in_paths(binary: &str, dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    let candidate = Path::new(binary);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    dirs.into_iter()
        .map(|dir| dir.join(binary))
        .find(|path| is_executable(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}

fn quiet_command(program: &str) -> Command {
    let mut command = Command::new(program);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    command
}

#[async_trait]
impl ProcessLauncher for SystemLauncher {
    fn is_installed(&self, binary: &str) -> bool {
        let found = find_executable(binary);
        debug!("Resolved {} to {:?}", binary, found);
        found.is_some()
    }

    async fn run_install_script(&self, shell: &str, script_url: &str) -> Result<()> {
        let script = format!("curl -fsSL {script_url} | {shell}");
        info!("Running install script: {}", script);

        let output = Command::new(shell)
            .arg("-c")
            .arg(&script)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| BootstrapError::Spawn {
                command: format!("{shell} -c '{script}'"),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("Install script stderr: {}", stderr.trim());
            Err(BootstrapError::CommandFailed {
                command: script,
                status: output.status.to_string(),
            })
        }
    }

    fn spawn_server(&self, binary: &str) -> Result<ServerProcess> {
        let child = quiet_command(binary)
            .arg("serve")
            .kill_on_drop(false)
            .spawn()
            .map_err(|source| BootstrapError::Spawn {
                command: format!("{binary} serve"),
                source,
            })?;

        debug!("Spawned {} serve (pid {:?})", binary, child.id());
        Ok(ServerProcess::new(format!("{binary} serve"), child))
    }

    async fn start_model(
        &self,
        binary: &str,
        model: &str,
        strategy: SpawnStrategy,
    ) -> Result<Option<ServerProcess>> {
        let label = format!("{binary} run {model}");
        let mut command = quiet_command(binary);
        command.arg("run").arg(model);

        match strategy {
            SpawnStrategy::Detached => {
                let child = command.spawn().map_err(|source| BootstrapError::Spawn {
                    command: label.clone(),
                    source,
                })?;
                debug!("Spawned {} (pid {:?})", label, child.id());
                Ok(Some(ServerProcess::new(label, child)))
            }
            SpawnStrategy::Blocking => {
                let status = command.status().await.map_err(|source| BootstrapError::Spawn {
                    command: label.clone(),
                    source,
                })?;
                if status.success() {
                    Ok(None)
                } else {
                    Err(BootstrapError::CommandFailed {
                        command: label,
                        status: status.to_string(),
                    })
                }
            }
        }
    }
}
