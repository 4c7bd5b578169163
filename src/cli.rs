use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dkron_config::{LogConfig, LogLevel, OutputFormat};

/// Command line host for the Dkron job provider
#[derive(Parser, Debug)]
#[command(name = "dkron-provider")]
#[command(version)]
#[command(about = "Manage Dkron job definitions from declarative attribute files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Dkron API base URL (falls back to the config file, then DKRON_HOST)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// TOML config file with a [provider] table
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (defaults to LOG_LEVEL or info)
    #[arg(short = 'l', long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Log format: json, pretty or text (defaults to LOG_FORMAT or pretty)
    #[arg(long, global = true)]
    pub log_format: Option<OutputFormat>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage a dkron_job resource
    Job(JobCommands),
    /// Print the dkron_job attribute schema as JSON
    Schema,
}

#[derive(Args, Debug)]
pub struct JobCommands {
    #[command(subcommand)]
    pub action: JobActions,
}

#[derive(Subcommand, Debug)]
pub enum JobActions {
    /// Create the job described by an attribute file
    Create {
        /// Attribute file (.toml, otherwise JSON)
        #[arg(short, long)]
        file: PathBuf,
        /// State file holding the job identifier
        #[arg(short, long, default_value = "dkron-state.json")]
        state: PathBuf,
    },
    /// Refresh the tracked job from the API
    Read {
        #[arg(short, long, default_value = "dkron-state.json")]
        state: PathBuf,
    },
    /// Apply a new attribute file to the tracked job
    Update {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(short, long, default_value = "dkron-state.json")]
        state: PathBuf,
    },
    /// Delete the tracked job
    Delete {
        #[arg(short, long, default_value = "dkron-state.json")]
        state: PathBuf,
    },
}

impl Cli {
    pub fn log_config(&self) -> LogConfig {
        let mut config = LogConfig::from_env();
        if let Some(level) = self.log_level {
            config = config.with_level(level);
        }
        if let Some(format) = self.log_format {
            config = config.with_format(format);
        }
        config
    }
}
