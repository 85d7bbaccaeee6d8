// server/src/cli/mod.rs

pub mod cli;
pub mod commands;
pub mod handlers;

pub use cli::start_cli;
pub use commands::{CliArgs, CreateUserArgs, ProntoCommands, ServeArgs};
pub use handlers::{handle_create_user, handle_serve, shutdown_signal};
