// Huber - command line client for Huber recirculating baths
use anyhow::Context;
use clap::Parser;
use huber::cli::{execute_command, load_config, Args};
use huber::infrastructure::logging::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args).context("Failed to load configuration")?;

    if !args.quiet {
        let level = args.log_level().unwrap_or(config.logging.level.as_str());
        init_logging(level)
            .map_err(anyhow::Error::msg)
            .context("Failed to initialize logging")?;
    }

    if let Err(e) = execute_command(args, config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
