//! escar sidecar binary

use clap::{Parser, Subcommand};
use escar::common::Config;
use escar::coordinator::codec::instances_to_json;
use escar::coordinator::manager::list_instances;
use escar::coordinator::server::{open_directory, Sidecar};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "escar")]
#[command(about = "Identity and membership sidecar for clustered data stores")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register this node and serve identity queries
    Serve {
        /// Config file (TOML); ESCAR_* environment variables override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bind address for HTTP
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Print the instances document for the configured scope
    Instances {
        /// Config file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, bind } => {
            let mut config = Config::load(config.as_deref())?;
            init_tracing(&config.log_level);
            // CLI has priority over file and environment
            if let Some(bind) = bind {
                config.http.bind_addr = bind;
            }
            Sidecar::new(config).serve().await?;
        }
        Commands::Instances { config } => {
            let config = Config::load(config.as_deref())?;
            init_tracing(&config.log_level);
            let directory = open_directory(&config)?;
            let instances = list_instances(directory.as_ref(), &config)?;
            println!("{}", serde_json::to_string_pretty(&instances_to_json(&instances)?)?);
        }
    }

    Ok(())
}
