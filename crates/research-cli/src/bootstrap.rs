//! `bootstrap` subcommand

use anyhow::Context;
use clap::{Args, ValueEnum};
use comfy_table::{Table, presets::UTF8_FULL};
use runtime_bootstrap::{BootstrapReport, Bootstrapper, RuntimeConfig, SpawnStrategy};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Args, Debug)]
pub struct BootstrapArgs {
    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Model identifier to warm
    #[arg(short, long)]
    pub model: Option<String>,

    /// Runtime base URL (e.g. http://localhost:11434)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Never run the install script
    #[arg(long)]
    pub skip_install: bool,

    /// How to launch the model run command
    #[arg(long, value_enum)]
    pub spawn: Option<SpawnArg>,

    /// Leave the runtime running and exit once the model is warm
    #[arg(long)]
    pub detach: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnArg {
    Detached,
    Blocking,
}

impl From<SpawnArg> for SpawnStrategy {
    fn from(arg: SpawnArg) -> Self {
        match arg {
            SpawnArg::Detached => SpawnStrategy::Detached,
            SpawnArg::Blocking => SpawnStrategy::Blocking,
        }
    }
}

/// File (or defaults), then environment, then flags
fn resolve_config(args: &BootstrapArgs) -> anyhow::Result<RuntimeConfig> {
    let config = match &args.config {
        Some(path) => RuntimeConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RuntimeConfig::default(),
    };

    let mut config = config
        .with_env()
        .context("Invalid environment override")?;

    if let Some(base_url) = &args.base_url {
        config.set_base_url(base_url);
    }
    if let Some(model) = &args.model {
        config.model_identifier.clone_from(model);
    }
    if args.skip_install {
        config.install.enabled = false;
    }
    if let Some(spawn) = args.spawn {
        config.model_spawn = spawn.into();
    }

    config.validate().context("Invalid runtime configuration")?;
    Ok(config)
}

fn report_table(report: &BootstrapReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Field", "Value"]);

    let status = match report.failure() {
        Some(reason) => format!("failed: {reason}"),
        None if report.is_ready() => "ready".to_string(),
        None => format!("{:?}", report.stage),
    };

    table.add_row(vec!["Model".to_string(), report.model.clone()]);
    table.add_row(vec!["Status".to_string(), status]);
    if let Some(availability) = report.availability {
        table.add_row(vec![
            "Downloaded".to_string(),
            availability.present.to_string(),
        ]);
        table.add_row(vec![
            "Warm-up budget".to_string(),
            format!("{} attempts", availability.wait_budget),
        ]);
    }
    table.add_row(vec![
        "Elapsed".to_string(),
        format!("{:.1}s", report.elapsed.as_secs_f64()),
    ]);
    table
}

pub async fn run(args: BootstrapArgs) -> anyhow::Result<ExitCode> {
    let config = resolve_config(&args)?;
    let mut bootstrapper = Bootstrapper::new(config).context("Failed to create bootstrapper")?;

    let report = bootstrapper.run().await;
    println!("{}", report_table(&report));

    if !report.is_ready() {
        error!("Bootstrap did not complete");
        bootstrapper
            .shutdown()
            .await
            .context("Failed to stop runtime processes")?;
        return Ok(ExitCode::FAILURE);
    }

    if args.detach {
        let pids = bootstrapper.release();
        info!("Detached from runtime processes {:?}", pids);
        return Ok(ExitCode::SUCCESS);
    }

    info!("Runtime serving; press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    info!("Stopping runtime");
    bootstrapper
        .shutdown()
        .await
        .context("Failed to stop runtime processes")?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use runtime_bootstrap::{BootstrapFailure, BootstrapStage, ModelAvailability};
    use std::io::Write;
    use std::time::Duration;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: BootstrapArgs,
    }

    fn parse(argv: &[&str]) -> BootstrapArgs {
        let mut full = vec!["bootstrap"];
        full.extend_from_slice(argv);
        Wrapper::try_parse_from(full).unwrap().args
    }

    #[test]
    fn test_parse_defaults() {
        let args = parse(&[]);
        assert!(args.config.is_none());
        assert!(args.model.is_none());
        assert!(!args.skip_install);
        assert!(!args.detach);
        assert_eq!(args.spawn, None);
    }

    #[test]
    fn test_parse_spawn_strategy() {
        let args = parse(&["--spawn", "blocking", "--detach"]);
        assert_eq!(args.spawn, Some(SpawnArg::Blocking));
        assert!(args.detach);

        let wrapped = Wrapper::try_parse_from(["bootstrap", "--spawn", "forked"]);
        assert!(wrapped.is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"model_identifier": "from-file:latest", "model_spawn": "blocking"}}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = parse(&[
            "--config",
            &path,
            "--model",
            "llama3.1:8b",
            "--base-url",
            "http://10.0.0.5:11434",
            "--skip-install",
            "--spawn",
            "detached",
        ]);
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.model_identifier, "llama3.1:8b");
        assert_eq!(config.health_url, "http://10.0.0.5:11434/");
        assert_eq!(config.list_url, "http://10.0.0.5:11434/api/tags");
        assert!(!config.install.enabled);
        assert_eq!(config.model_spawn, SpawnStrategy::Detached);
    }

    #[test]
    fn test_missing_config_file() {
        let args = parse(&["--config", "/nonexistent/runtime.json"]);
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn test_report_table_shows_failure() {
        let report = BootstrapReport {
            stage: BootstrapStage::Failed(BootstrapFailure::ServerUnreachable),
            model: "llama3.1:8b".to_string(),
            availability: None,
            elapsed: Duration::from_millis(1500),
        };
        let rendered = report_table(&report).to_string();

        assert!(rendered.contains("llama3.1:8b"));
        assert!(rendered.contains("failed: runtime server did not become reachable"));
        assert!(rendered.contains("1.5s"));
    }

    #[test]
    fn test_report_table_shows_budget() {
        let report = BootstrapReport {
            stage: BootstrapStage::ModelWarm,
            model: "llama3.1:8b".to_string(),
            availability: Some(ModelAvailability {
                present: true,
                wait_budget: 200,
            }),
            elapsed: Duration::from_secs(12),
        };
        let rendered = report_table(&report).to_string();

        assert!(rendered.contains("ready"));
        assert!(rendered.contains("200 attempts"));
    }
}
