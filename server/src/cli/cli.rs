// server/src/cli/cli.rs

// Entry point for `pronto-server`: parses arguments and dispatches.
use anyhow::Result;
use clap::Parser;

use super::commands::{CliArgs, ProntoCommands, ServeArgs};
use super::handlers::{handle_create_user, handle_serve};

pub async fn start_cli() -> Result<()> {
    let args = CliArgs::parse();
    match args.command.unwrap_or(ProntoCommands::Serve(ServeArgs::default())) {
        ProntoCommands::Serve(serve) => handle_serve(serve).await,
        ProntoCommands::CreateUser(user) => handle_create_user(user).await,
    }
}
