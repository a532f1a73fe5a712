//! Local LLM runtime bootstrap
//!
//! Before the research pipeline can talk to a local model it needs an
//! Ollama-style server running with the model loaded. This crate:
//!
//! - Checks the server binary is on `PATH` and runs the vendor install script if not
//! - Spawns the server and polls its health endpoint
//! - Looks the model up in the server's model list to size the wait budget
//! - Starts the model and polls a one-token warm-up request until it answers
//!
//! Every step failure is logged and collapsed into a [`BootstrapFailure`];
//! [`Bootstrapper::bootstrap`] returns a plain boolean for callers that only
//! need a go/no-go signal.
//!
//! # Example
//!
//! ```no_run
//! use runtime_bootstrap::{Bootstrapper, RuntimeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RuntimeConfig::default().with_env()?;
//!     let mut bootstrapper = Bootstrapper::new(config)?;
//!
//!     if bootstrapper.bootstrap().await {
//!         // build and run the research pipeline
//!     }
//!
//!     bootstrapper.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod process;
pub mod retry;

pub use api::{GenerateRequest, HttpRuntimeApi, ModelEntry, RuntimeApi};
pub use bootstrap::{BootstrapReport, BootstrapStage, Bootstrapper, ModelAvailability};
pub use config::{PollPolicy, RuntimeConfig, SpawnStrategy};
pub use error::{BootstrapError, BootstrapFailure, Result};
pub use process::{ProcessLauncher, ServerProcess, SystemLauncher};
pub use retry::{PollOutcome, ProbeOutcome, Sleeper, TokioSleeper, poll_until_ready};
