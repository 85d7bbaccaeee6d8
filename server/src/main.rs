// server/src/main.rs

use anyhow::Result;
use pronto_server::cli::start_cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // RUST_LOG wins; `log` records from the library crates are bridged in.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    start_cli().await
}
