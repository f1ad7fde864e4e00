use anyhow::Result;
use clap::Parser;
use log::info;
use withdrawal_console::cli::{Cli, CliHandler};
use withdrawal_console::ConsoleConfig;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = ConsoleConfig::from_args(cli.config)?;
    info!("=== Withdrawal console starting ===");

    let mut handler = CliHandler::from_config(&config)?;
    handler.handle_command(cli.command).await
}
