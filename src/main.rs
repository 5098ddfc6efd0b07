use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};
use anyhow::Result;

use smartsched::presentation::cli::{Cli, Commands};
use smartsched::presentation::cli::commands::{DemoCommand, RecommendCommand};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("smartsched=debug,info")
    } else {
        EnvFilter::new("smartsched=info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Demo { json } => DemoCommand::execute(json).await?,
        Commands::Recommend { input, max_results } => {
            RecommendCommand::execute(&input, max_results).await?
        }
    }

    Ok(())
}
