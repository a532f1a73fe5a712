//! HTTP surface of the local model server
//!
//! Three endpoints matter to the bootstrap: a health check, the model list,
//! and the generation endpoint used for the warm-up request. Readiness
//! probes map every answer to a [`ProbeOutcome`] instead of an error.

use crate::config::RuntimeConfig;
use crate::error::{BootstrapError, Result};
use crate::retry::ProbeOutcome;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// One entry of the model list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl ModelEntry {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
            digest: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelList {
    models: Vec<ModelEntry>,
}

/// Generation options sent with the warm-up request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateOptions {
    pub num_predict: u32,
}

/// Body of a generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub options: GenerateOptions,
    pub stream: bool,
}

impl GenerateRequest {
    /// Minimal non-streaming request used to check that a model serves traffic
    pub fn warmup(config: &RuntimeConfig) -> Self {
        Self {
            model: config.model_identifier.clone(),
            prompt: config.warmup_prompt.clone(),
            options: GenerateOptions {
                num_predict: config.warmup_num_predict,
            },
            stream: false,
        }
    }
}

/// Calls against the local model server
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuntimeApi: Send + Sync {
    /// Probe the health endpoint
    async fn health(&self) -> ProbeOutcome;

    /// List the models the server has downloaded
    async fn list_models(&self) -> Result<Vec<ModelEntry>>;

    /// Send a generation request; only the status code is inspected
    async fn generate(&self, request: &GenerateRequest) -> ProbeOutcome;
}

/// [`RuntimeApi`] over reqwest
#[derive(Debug, Clone)]
pub struct HttpRuntimeApi {
    client: Client,
    health_url: String,
    list_url: String,
    generate_url: String,
    probe_timeout: Duration,
    generate_timeout: Duration,
}

impl HttpRuntimeApi {
    /// Create a client for the endpoints in `config`
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let client = Client::builder()
            .no_proxy()
            .build()
            .map_err(BootstrapError::Http)?;

        Ok(Self {
            client,
            health_url: config.health_url.clone(),
            list_url: config.list_url.clone(),
            generate_url: config.generate_url.clone(),
            probe_timeout: config.probe_timeout,
            generate_timeout: config.generate_timeout,
        })
    }
}

fn status_outcome(status: StatusCode) -> ProbeOutcome {
    if status == StatusCode::OK {
        ProbeOutcome::Ready
    } else {
        ProbeOutcome::NotReadyYet(format!("status {}", status.as_u16()))
    }
}

#[async_trait]
impl RuntimeApi for HttpRuntimeApi {
    #[instrument(skip(self), fields(url = %self.health_url))]
    async fn health(&self) -> ProbeOutcome {
        match self
            .client
            .get(&self.health_url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => status_outcome(response.status()),
            Err(e) => ProbeOutcome::TransportError(e.to_string()),
        }
    }

    #[instrument(skip(self), fields(url = %self.list_url))]
    async fn list_models(&self) -> Result<Vec<ModelEntry>> {
        let response = self
            .client
            .get(&self.list_url)
            .timeout(self.probe_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BootstrapError::UnexpectedStatus {
                url: self.list_url.clone(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        let list: ModelList = serde_json::from_str(&body)?;
        debug!("Server lists {} model(s)", list.models.len());
        Ok(list.models)
    }

    #[instrument(skip(self, request), fields(url = %self.generate_url, model = %request.model))]
    async fn generate(&self, request: &GenerateRequest) -> ProbeOutcome {
        match self
            .client
            .post(&self.generate_url)
            .timeout(self.generate_timeout)
            .json(request)
            .send()
            .await
        {
            Ok(response) => status_outcome(response.status()),
            Err(e) => ProbeOutcome::TransportError(e.to_string()),
        }
    }
}
