mod app;
mod cli;
mod config;
mod devops;
mod error;
mod model;
mod report;
mod util;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use devops::http::HttpTransport;
use devops::DevOpsClient;
use report::ReportGenerator;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .without_time()
        .init();

    let args = cli::Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: cli::Args) -> Result<()> {
    // Configuration is fully validated before any request goes out
    let file_config = config::load_file_config(args.config.as_deref())?;
    let config = args.resolve(file_config)?;

    let transport = HttpTransport::new(&config.pat, config.timeout)?;
    let client = DevOpsClient::new(&config, transport);
    let generator = ReportGenerator::new(&config.organization_url, &config.project, args.sort_by);

    app::run(&client, &generator, &args.release, &args.output_path()).await?;
    Ok(())
}
