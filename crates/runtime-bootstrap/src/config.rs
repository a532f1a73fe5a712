//! Configuration for the runtime bootstrap
//!
//! One [`RuntimeConfig`] describes the server binary, its endpoints, the
//! model to warm, and the polling budgets. Model variants (for example
//! different quantizations) are just different `model_identifier` values.
//!
//! # Example
//!
//! ```json
//! {
//!   "binary_name": "ollama",
//!   "health_url": "http://localhost:11434/",
//!   "list_url": "http://localhost:11434/api/tags",
//!   "generate_url": "http://localhost:11434/api/generate",
//!   "model_identifier": "hf.co/bartowski/Meta-Llama-3.1-70B-Instruct-GGUF:Q4_K_M",
//!   "server_ready_policy": { "max_attempts": 10, "interval_secs": 1.0 },
//!   "model_spawn": "blocking"
//! }
//! ```

use crate::error::{BootstrapError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default server binary
pub const DEFAULT_BINARY: &str = "ollama";

/// Default base URL of the local server
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Port assumed when a bare host is given
pub const DEFAULT_PORT: u16 = 11434;

/// Default model to warm
pub const DEFAULT_MODEL: &str = "hf.co/bartowski/Meta-Llama-3.1-70B-Instruct-GGUF:Q4_K_L";

/// Default vendor install script
pub const DEFAULT_INSTALL_SCRIPT: &str = "https://ollama.com/install.sh";

/// Default warm-up prompt
pub const DEFAULT_WARMUP_PROMPT: &str = "What is the importance of AI?";

const ENV_HOST: &str = "OLLAMA_HOST";
const ENV_MODEL: &str = "BOOTSTRAP_MODEL";
const ENV_BINARY: &str = "BOOTSTRAP_BINARY";
const ENV_SKIP_INSTALL: &str = "BOOTSTRAP_SKIP_INSTALL";
const ENV_SERVER_ATTEMPTS: &str = "BOOTSTRAP_SERVER_ATTEMPTS";

/// Serde helper storing a [`Duration`] as fractional seconds
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}

/// Bounded polling policy: `max_attempts` probes spaced `interval` apart
///
/// The wall-clock budget is roughly `max_attempts * interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    /// Maximum number of probes
    pub max_attempts: u32,

    /// Sleep between consecutive probes
    #[serde(rename = "interval_secs", with = "duration_secs")]
    pub interval: Duration,
}

impl PollPolicy {
    /// Create a new policy
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Server health polling: 10 attempts, 1 second apart
    pub fn server_default() -> Self {
        Self::new(10, Duration::from_secs(1))
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::server_default()
    }
}

/// How the model run command is launched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnStrategy {
    /// Background child with output discarded; the handle is kept for teardown
    #[default]
    Detached,
    /// Run to completion and fail on a non-zero exit
    Blocking,
}

impl std::str::FromStr for SpawnStrategy {
    type Err = BootstrapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detached" => Ok(Self::Detached),
            "blocking" => Ok(Self::Blocking),
            other => Err(BootstrapError::Config(format!(
                "unknown spawn strategy: {other}"
            ))),
        }
    }
}

/// Install step configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Whether a missing binary triggers the install script
    pub enabled: bool,

    /// URL of the vendor install script
    pub script_url: String,

    /// Shell used to pipe the script
    pub shell: String,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            script_url: DEFAULT_INSTALL_SCRIPT.to_string(),
            shell: "sh".to_string(),
        }
    }
}

/// Runtime bootstrap configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Server binary name, resolved on `PATH`
    pub binary_name: String,

    /// Health check URL (GET, 200 means up)
    pub health_url: String,

    /// Model list URL (GET, `{"models": [{"name": ...}]}`)
    pub list_url: String,

    /// Generation URL used for the warm-up request
    pub generate_url: String,

    /// Model to load and warm
    pub model_identifier: String,

    /// Server health polling policy
    pub server_ready_policy: PollPolicy,

    /// Sleep between warm-up attempts
    #[serde(rename = "model_poll_interval_secs", with = "duration_secs")]
    pub model_poll_interval: Duration,

    /// Warm-up attempts when the model is already downloaded
    pub present_wait_budget: u32,

    /// Warm-up attempts when the model must be pulled first
    pub missing_wait_budget: u32,

    /// Prompt sent by the warm-up request
    pub warmup_prompt: String,

    /// Tokens requested by the warm-up request
    pub warmup_num_predict: u32,

    /// Timeout for health and list requests
    #[serde(rename = "probe_timeout_secs", with = "duration_secs")]
    pub probe_timeout: Duration,

    /// Timeout for a single warm-up request
    #[serde(rename = "generate_timeout_secs", with = "duration_secs")]
    pub generate_timeout: Duration,

    /// Install step
    pub install: InstallConfig,

    /// Model run launch strategy
    pub model_spawn: SpawnStrategy,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let (health_url, list_url, generate_url) = endpoints(DEFAULT_BASE_URL);
        Self {
            binary_name: DEFAULT_BINARY.to_string(),
            health_url,
            list_url,
            generate_url,
            model_identifier: DEFAULT_MODEL.to_string(),
            server_ready_policy: PollPolicy::server_default(),
            model_poll_interval: Duration::from_secs(3),
            present_wait_budget: 200,
            missing_wait_budget: 600,
            warmup_prompt: DEFAULT_WARMUP_PROMPT.to_string(),
            warmup_num_predict: 1,
            probe_timeout: Duration::from_secs(5),
            generate_timeout: Duration::from_secs(120),
            install: InstallConfig::default(),
            model_spawn: SpawnStrategy::Detached,
        }
    }
}

/// Derive the health, list and generate URLs from a base URL
fn endpoints(base_url: &str) -> (String, String, String) {
    let base = normalize_base_url(base_url);
    (
        format!("{base}/"),
        format!("{base}/api/tags"),
        format!("{base}/api/generate"),
    )
}

/// Accept `host[:port]` as well as full URLs, as `OLLAMA_HOST` does
///
/// A bare host without a port gets the runtime's default port. A URL with an
/// explicit scheme keeps that scheme's default port.
fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        return trimmed.to_string();
    }

    let with_scheme = format!("http://{trimmed}");
    let Ok(mut url) = Url::parse(&with_scheme) else {
        return with_scheme;
    };

    // `http` hides an explicit :80, so read the port through a scheme without a default
    let explicit_port = Url::parse(&format!("tcp://{trimmed}"))
        .ok()
        .and_then(|parsed| parsed.port())
        .is_some();
    if !explicit_port && url.set_port(Some(DEFAULT_PORT)).is_err() {
        return with_scheme;
    }

    url.as_str().trim_end_matches('/').to_string()
}

fn check_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| BootstrapError::Config(format!("{field} is not a valid URL ({value}): {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(BootstrapError::Config(format!(
            "{field} must use http or https, got {scheme}"
        ))),
    }
}

impl RuntimeConfig {
    /// Create a new configuration builder
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }

    /// Load configuration from a JSON file
    ///
    /// Missing fields take their default values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BootstrapError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;

        let config: RuntimeConfig = serde_json::from_str(&content).map_err(|e| {
            BootstrapError::Config(format!("Failed to parse {}: {e}", path.display()))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn with_env(self) -> Result<Self> {
        self.with_env_from(research_utils::process_env)
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = research_utils::string_from(&lookup, ENV_HOST) {
            self.set_base_url(&host);
        }
        if let Some(model) = research_utils::string_from(&lookup, ENV_MODEL) {
            self.model_identifier = model;
        }
        if let Some(binary) = research_utils::string_from(&lookup, ENV_BINARY) {
            self.binary_name = binary;
        }
        if research_utils::flag_from(&lookup, ENV_SKIP_INSTALL) {
            self.install.enabled = false;
        }
        if let Some(attempts) = research_utils::parse_from::<_, u32>(&lookup, ENV_SERVER_ATTEMPTS)? {
            self.server_ready_policy.max_attempts = attempts;
        }
        Ok(self)
    }

    /// Point all three endpoints at a new base URL
    pub fn set_base_url(&mut self, base_url: &str) {
        let (health_url, list_url, generate_url) = endpoints(base_url);
        self.health_url = health_url;
        self.list_url = list_url;
        self.generate_url = generate_url;
    }

    /// Warm-up attempt budget for a model that is or is not yet downloaded
    pub fn wait_budget(&self, present: bool) -> u32 {
        if present {
            self.present_wait_budget
        } else {
            self.missing_wait_budget
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.binary_name.trim().is_empty() {
            return Err(BootstrapError::Config(
                "binary_name must not be empty".to_string(),
            ));
        }

        if self.model_identifier.trim().is_empty() {
            return Err(BootstrapError::Config(
                "model_identifier must not be empty".to_string(),
            ));
        }

        check_url("health_url", &self.health_url)?;
        check_url("list_url", &self.list_url)?;
        check_url("generate_url", &self.generate_url)?;

        if self.install.enabled {
            check_url("install.script_url", &self.install.script_url)?;
        }

        if self.probe_timeout.is_zero() || self.generate_timeout.is_zero() {
            return Err(BootstrapError::Config(
                "request timeouts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for RuntimeConfig
#[derive(Debug, Default)]
pub struct RuntimeConfigBuilder {
    config: RuntimeConfig,
}

impl RuntimeConfigBuilder {
    /// Point all endpoints at a base URL such as `http://127.0.0.1:11434`
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.config.set_base_url(base_url);
        self
    }

    /// Set the server binary name
    pub fn binary_name(mut self, binary: impl Into<String>) -> Self {
        self.config.binary_name = binary.into();
        self
    }

    /// Set the model to warm
    pub fn model_identifier(mut self, model: impl Into<String>) -> Self {
        self.config.model_identifier = model.into();
        self
    }

    /// Set the server health polling policy
    pub fn server_ready_policy(mut self, policy: PollPolicy) -> Self {
        self.config.server_ready_policy = policy;
        self
    }

    /// Set the sleep between warm-up attempts
    pub fn model_poll_interval(mut self, interval: Duration) -> Self {
        self.config.model_poll_interval = interval;
        self
    }

    /// Set the warm-up budgets for present and missing models
    pub fn wait_budgets(mut self, present: u32, missing: u32) -> Self {
        self.config.present_wait_budget = present;
        self.config.missing_wait_budget = missing;
        self
    }

    /// Enable or disable the install step
    pub fn install_enabled(mut self, enabled: bool) -> Self {
        self.config.install.enabled = enabled;
        self
    }

    /// Set the install script URL
    pub fn install_script_url(mut self, url: impl Into<String>) -> Self {
        self.config.install.script_url = url.into();
        self
    }

    /// Set the model run launch strategy
    pub fn model_spawn(mut self, strategy: SpawnStrategy) -> Self {
        self.config.model_spawn = strategy;
        self
    }

    /// Set the health/list request timeout
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    /// Set the warm-up request timeout
    pub fn generate_timeout(mut self, timeout: Duration) -> Self {
        self.config.generate_timeout = timeout;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<RuntimeConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
