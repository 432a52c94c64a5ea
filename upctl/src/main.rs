use std::process::ExitCode;

use clap::Parser;
use upctl::{Application, Config, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Parse CLI args
    let args = upctl::config::Args::parse();

    // Load configuration
    let config = Config::load(&args)?;

    // If --validate flag is set, exit successfully after config validation
    if args.validate {
        println!("Configuration is valid.");
        return Ok(ExitCode::SUCCESS);
    }

    telemetry::init_telemetry()?;

    tracing::debug!("{:?}", args);

    let Some(command) = args.command else {
        anyhow::bail!("No command given. Run with --help to see the available commands.");
    };

    let app = Application::new(config)?;
    match app.run(command).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        // Already reported to the user by the presenter
        Err(_) => Ok(ExitCode::FAILURE),
    }
}
