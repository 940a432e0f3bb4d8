//! AgroSense CLI entry point.

use clap::Parser;

use agrosense::cli::commands;
use agrosense::cli::{Cli, Commands};
use agrosense::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // `watch` configures logging from the loaded configuration itself.
    let _logger = if matches!(cli.command, Commands::Watch(_)) {
        None
    } else {
        match LoggerImpl::init(&cli.log_config()) {
            Ok(logger) => Some(logger),
            Err(err) => {
                eprintln!("warning: logging disabled: {err:#}");
                None
            }
        }
    };

    let json = cli.json;
    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, json).await,
        Commands::Validate(args) => commands::validate::execute(args, json).await,
        Commands::Show(args) => commands::show::execute(args, json).await,
        Commands::Soil(args) => commands::soil::execute(args, json).await,
        Commands::Watch(args) => commands::watch::execute(args, json).await,
    };

    if let Err(err) = result {
        agrosense::cli::handle_error(err, json);
    }
}
