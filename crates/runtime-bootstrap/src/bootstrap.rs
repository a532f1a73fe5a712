//! Bootstrap orchestration
//!
//! [`Bootstrapper::run`] walks a linear, single-shot sequence:
//!
//! ```text
//! NotStarted -> ServerStarting -> ServerUp -> ModelQueryPending -> ModelStarting -> ModelWarm
//! ```
//!
//! Any step may end in `Failed`. Earlier steps are never retried once a later
//! one fails. Step errors are logged and reduced to a [`BootstrapFailure`];
//! [`Bootstrapper::bootstrap`] reduces that further to a boolean.

use crate::api::{GenerateRequest, HttpRuntimeApi, RuntimeApi};
use crate::config::{PollPolicy, RuntimeConfig};
use crate::error::{BootstrapFailure, Result};
use crate::process::{ProcessLauncher, ServerProcess, SystemLauncher};
use crate::retry::{Sleeper, TokioSleeper, poll_until_ready};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Stage reached by a bootstrap run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStage {
    NotStarted,
    ServerStarting,
    ServerUp,
    ModelQueryPending,
    ModelStarting,
    ModelWarm,
    Failed(BootstrapFailure),
}

/// Whether the configured model is downloaded, and how long to wait for it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelAvailability {
    pub present: bool,
    /// Warm-up attempts to allow
    pub wait_budget: u32,
}

/// Outcome of [`Bootstrapper::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub stage: BootstrapStage,
    pub model: String,
    pub availability: Option<ModelAvailability>,
    pub elapsed: Duration,
}

impl BootstrapReport {
    pub fn is_ready(&self) -> bool {
        self.stage == BootstrapStage::ModelWarm
    }

    pub fn failure(&self) -> Option<BootstrapFailure> {
        match self.stage {
            BootstrapStage::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Brings a local model server and one model to a warm, serving state
///
/// The bootstrapper owns the child processes it spawns. Call
/// [`shutdown`](Self::shutdown) on the caller's exit path, or
/// [`release`](Self::release) to leave the runtime running on purpose.
/// Dropping it kills owned children on a best-effort basis.
pub struct Bootstrapper<A = HttpRuntimeApi, L = SystemLauncher, S = TokioSleeper> {
    config: RuntimeConfig,
    api: A,
    launcher: L,
    sleeper: S,
    stage: BootstrapStage,
    server: Option<ServerProcess>,
    model_process: Option<ServerProcess>,
}

impl Bootstrapper {
    /// Create a bootstrapper that talks HTTP and spawns real processes
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        config.validate()?;
        let api = HttpRuntimeApi::new(&config)?;
        Ok(Self::with_parts(config, api, SystemLauncher, TokioSleeper))
    }
}

impl<A, L, S> Bootstrapper<A, L, S>
where
    A: RuntimeApi,
    L: ProcessLauncher,
    S: Sleeper,
{
    /// Create a bootstrapper from explicit collaborators
    pub fn with_parts(config: RuntimeConfig, api: A, launcher: L, sleeper: S) -> Self {
        Self {
            config,
            api,
            launcher,
            sleeper,
            stage: BootstrapStage::NotStarted,
            server: None,
            model_process: None,
        }
    }

    /// Stage reached by the most recent run
    pub fn stage(&self) -> BootstrapStage {
        self.stage
    }

    /// Handle of the server process, if this bootstrapper spawned one
    pub fn server_process(&self) -> Option<&ServerProcess> {
        self.server.as_ref()
    }

    /// Handle of the detached model run command, if any
    pub fn model_process(&self) -> Option<&ServerProcess> {
        self.model_process.as_ref()
    }

    /// Make sure the server binary is on `PATH`, installing it if needed
    pub async fn ensure_installed(&self) -> bool {
        let binary = &self.config.binary_name;
        if self.launcher.is_installed(binary) {
            debug!("{} is already installed", binary);
            return true;
        }

        info!(
            "{} not found, running install script from {}",
            binary, self.config.install.script_url
        );

        if let Err(e) = self
            .launcher
            .run_install_script(&self.config.install.shell, &self.config.install.script_url)
            .await
        {
            warn!("Failed to install {}: {}", binary, e);
            return false;
        }

        let installed = self.launcher.is_installed(binary);
        if installed {
            info!("{} installed", binary);
        } else {
            warn!("{} still not found after running the install script", binary);
        }
        installed
    }

    /// Spawn the server in the background
    ///
    /// Success is not confirmed here; a spawn error is only logged because a
    /// server may already be listening. [`wait_for_server_ready`](Self::wait_for_server_ready)
    /// decides.
    pub fn start_server(&mut self) {
        if let Some(server) = self.server.as_mut() {
            if server.is_running() {
                debug!("Server already running (pid {:?})", server.id());
                return;
            }
        }

        info!("Starting {} server", self.config.binary_name);
        match self.launcher.spawn_server(&self.config.binary_name) {
            Ok(process) => self.server = Some(process),
            Err(e) => warn!("Could not spawn server: {}", e),
        }
    }

    /// Poll the health endpoint using the configured server policy
    pub async fn wait_for_server_ready(&self) -> bool {
        self.wait_for_server_ready_with(&self.config.server_ready_policy)
            .await
    }

    /// Poll the health endpoint with an explicit policy
    pub async fn wait_for_server_ready_with(&self, policy: &PollPolicy) -> bool {
        info!("Checking if the server is running");
        let outcome = poll_until_ready(policy, &self.sleeper, "server health", || {
            self.api.health()
        })
        .await;

        if outcome.is_ready() {
            info!("Server is running");
            true
        } else {
            warn!(
                "Server did not answer after {} attempt(s)",
                outcome.attempts()
            );
            false
        }
    }

    /// Look the configured model up in the server's model list
    pub async fn check_model_downloaded(&self) -> Result<ModelAvailability> {
        info!("Checking if {} is downloaded", self.config.model_identifier);
        let models = self.api.list_models().await?;

        let present = models
            .iter()
            .any(|model| model.name == self.config.model_identifier);
        let wait_budget = self.config.wait_budget(present);

        if present {
            info!("Model is already downloaded");
        } else {
            info!(
                "Model is not downloaded yet, allowing {} warm-up attempts",
                wait_budget
            );
        }

        Ok(ModelAvailability {
            present,
            wait_budget,
        })
    }

    /// Ask the server to load the configured model
    pub async fn start_model(&mut self) -> Result<()> {
        info!(
            "Starting model {} ({:?})",
            self.config.model_identifier, self.config.model_spawn
        );
        let process = self
            .launcher
            .start_model(
                &self.config.binary_name,
                &self.config.model_identifier,
                self.config.model_spawn,
            )
            .await?;

        if let Some(process) = process {
            self.model_process = Some(process);
        }
        Ok(())
    }

    /// Send warm-up requests until one answers 200 or `max_attempts` are used
    pub async fn wait_for_model_ready(&self, max_attempts: u32) -> bool {
        info!("Checking if the model is serving");
        let policy = PollPolicy::new(max_attempts, self.config.model_poll_interval);
        let request = GenerateRequest::warmup(&self.config);

        let outcome = poll_until_ready(&policy, &self.sleeper, "model warm-up", || {
            self.api.generate(&request)
        })
        .await;

        if outcome.is_ready() {
            info!("Model is serving after {} attempt(s)", outcome.attempts());
            true
        } else {
            warn!(
                "Model did not answer after {} attempt(s)",
                outcome.attempts()
            );
            false
        }
    }

    fn fail(&mut self, reason: BootstrapFailure) -> BootstrapStage {
        error!("Bootstrap failed: {}", reason);
        self.stage = BootstrapStage::Failed(reason);
        self.stage
    }

    fn advance(&mut self, stage: BootstrapStage) {
        debug!("Bootstrap stage {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
    }

    async fn run_stages(&mut self) -> (BootstrapStage, Option<ModelAvailability>) {
        if self.config.install.enabled && !self.ensure_installed().await {
            return (self.fail(BootstrapFailure::Install), None);
        }

        self.advance(BootstrapStage::ServerStarting);
        self.start_server();
        if !self.wait_for_server_ready().await {
            return (self.fail(BootstrapFailure::ServerUnreachable), None);
        }
        self.advance(BootstrapStage::ServerUp);

        self.advance(BootstrapStage::ModelQueryPending);
        let availability = match self.check_model_downloaded().await {
            Ok(availability) => availability,
            Err(e) => {
                warn!("Failed to check if the model is downloaded: {}", e);
                return (self.fail(BootstrapFailure::ModelQuery), None);
            }
        };

        self.advance(BootstrapStage::ModelStarting);
        if let Err(e) = self.start_model().await {
            warn!("Failed to start the model: {}", e);
            return (self.fail(BootstrapFailure::ModelStart), Some(availability));
        }

        if !self.wait_for_model_ready(availability.wait_budget).await {
            return (
                self.fail(BootstrapFailure::ModelWarmupTimeout),
                Some(availability),
            );
        }

        self.advance(BootstrapStage::ModelWarm);
        (self.stage, Some(availability))
    }

    /// Run every step in order and report where it ended
    pub async fn run(&mut self) -> BootstrapReport {
        let started = Instant::now();
        self.stage = BootstrapStage::NotStarted;

        let (stage, availability) = self.run_stages().await;
        let report = BootstrapReport {
            stage,
            model: self.config.model_identifier.clone(),
            availability,
            elapsed: started.elapsed(),
        };

        if report.is_ready() {
            info!(
                "Runtime ready with {} in {:?}",
                report.model, report.elapsed
            );
        }
        report
    }

    /// Run every step in order; true iff the model is warm
    pub async fn bootstrap(&mut self) -> bool {
        self.run().await.is_ready()
    }

    /// Stop the model run command and the server this bootstrapper spawned
    ///
    /// Both are stopped even if the first fails; the first error is returned.
    pub async fn shutdown(&mut self) -> Result<()> {
        let mut first_error = None;

        for mut process in [self.model_process.take(), self.server.take()]
            .into_iter()
            .flatten()
        {
            if let Err(e) = process.stop().await {
                warn!("Failed to stop a runtime process: {}", e);
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Leave the spawned processes running and return their pids
    pub fn release(&mut self) -> Vec<u32> {
        [self.model_process.take(), self.server.take()]
            .into_iter()
            .flatten()
            .filter_map(|mut process| process.release())
            .collect()
    }
}
