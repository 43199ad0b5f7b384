//! Testgen HTTP server - form shell over the generation flows.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use testgen::domain::ConfigDomain;
use testgen::server::{run_server, ServerState};

#[derive(Parser)]
#[command(name = "testgen-server")]
#[command(about = "HTTP form shell for BRD and test case generation", long_about = None)]
#[command(version)]
struct Args {
    /// Project root directory (holds .testgen/config.json)
    #[arg(long, env = "TESTGEN_PROJECT")]
    project: Option<PathBuf>,

    /// Bind address (overrides the configuration)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let project = args
        .project
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let config = ConfigDomain::new(&project).load().await?;
    let addr = args
        .bind
        .unwrap_or_else(|| config.server.bind_address.clone());

    info!(
        model = %config.model.model_id,
        provider = %config.model.provider,
        "Starting testgen server"
    );

    let state = Arc::new(ServerState::new(config)?);
    run_server(state, &addr).await
}
