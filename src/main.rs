use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use dkron_config::{LogConfig, OutputFormat, ProviderConfig};
use dkron_domain::{job_schema, AttributeMap, AttributeValue, JOB_RESOURCE_TYPE};
use dkron_errors::ProviderError;
use dkron_provider_core::{DkronProvider, Resource, ResourceData};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod state;

use cli::{Cli, Commands, JobActions};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_config())?;

    match &cli.command {
        Commands::Schema => {
            let schema = serde_json::to_string_pretty(job_schema())
                .context("Failed to encode resource schema")?;
            println!("{schema}");
        }
        Commands::Job(job) => {
            let provider = DkronProvider::new();
            let config = resolve_config(&provider, &cli)?;
            info!("Using Dkron API at {}", config.host());

            let resource = provider
                .resource(JOB_RESOURCE_TYPE, &config)
                .context("dkron_job resource is not registered")?;
            run_job_action(resource.as_ref(), &job.action).await?;
        }
    }

    Ok(())
}

/// Host precedence: `--host`, then `--config`, then `DKRON_HOST`.
fn resolve_config(provider: &DkronProvider, cli: &Cli) -> Result<ProviderConfig> {
    if let Some(path) = &cli.config {
        if cli.host.is_none() {
            debug!("Loading provider configuration from {}", path.display());
            return ProviderConfig::load(path).map_err(report);
        }
    }

    let mut settings = AttributeMap::new();
    if let Some(host) = &cli.host {
        settings.insert("host".to_string(), AttributeValue::from(host.as_str()));
    }
    provider.configure(&settings).map_err(report)
}

async fn run_job_action(resource: &dyn Resource, action: &JobActions) -> Result<()> {
    match action {
        JobActions::Create { file, state } => {
            let mut data = state::load_state(state)?;
            if let Some(id) = data.id() {
                anyhow::bail!(
                    "State file {} already tracks job '{id}', use update instead",
                    state.display()
                );
            }
            data.set_attributes(state::load_attributes(file)?);
            resource.create(&mut data).await.map_err(report)?;
            state::save_state(state, &data)?;
            print_resource(&data)?;
        }
        JobActions::Read { state } => {
            let mut data = tracked_state(state)?;
            resource.read(&mut data).await.map_err(report)?;
            state::save_state(state, &data)?;
            print_resource(&data)?;
        }
        JobActions::Update { file, state } => {
            let mut data = tracked_state(state)?;
            let planned = state::load_attributes(file)?;
            let outcome = resource.update(&mut data, planned).await;
            // A failed rename may already have deleted the old job.
            state::save_state(state, &data)?;
            outcome.map_err(report)?;
            print_resource(&data)?;
        }
        JobActions::Delete { state } => {
            let mut data = tracked_state(state)?;
            let id = data.id().unwrap_or_default().to_string();
            resource.delete(&mut data).await.map_err(report)?;
            state::remove_state(state)?;
            info!("Deleted job '{id}'");
        }
    }

    Ok(())
}

fn tracked_state(path: &Path) -> Result<ResourceData> {
    let data = state::load_state(path)?;
    if !data.is_tracked() {
        anyhow::bail!("State file {} does not track any job", path.display());
    }
    Ok(data)
}

fn print_resource(data: &ResourceData) -> Result<()> {
    let output = serde_json::to_string_pretty(data).context("Failed to encode resource")?;
    println!("{output}");
    Ok(())
}

fn report(err: ProviderError) -> anyhow::Error {
    anyhow::anyhow!("{}: {err}", err.user_message())
}

fn init_logging(config: &LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format {
        OutputFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to initialize JSON logging")?,
        OutputFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to initialize pretty logging")?,
        OutputFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to initialize text logging")?,
    }

    Ok(())
}
