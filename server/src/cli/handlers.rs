// server/src/cli/handlers.rs

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use lib::services::users;
use lib::{AppConfig, TriageStore};
use models::medical::NewUser;
use rest_api::AppState;

use super::commands::{CreateUserArgs, ServeArgs};

/// Applies `serve` flags on top of the loaded configuration.
pub fn apply_serve_args(config: &mut AppConfig, args: &ServeArgs) {
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(dir) = &args.data_dir {
        config.storage.data_directory = dir.clone();
    }
}

fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    AppConfig::load(explicit).context("Failed to load configuration")
}

pub async fn handle_serve(args: ServeArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    apply_serve_args(&mut config, &args);

    let store = TriageStore::open(&config.storage)
        .with_context(|| format!("Failed to open database at {:?}", config.storage.data_directory))?;
    let state = AppState::new(store, config).context("Failed to build application state")?;
    if state.config.triage.endpoint.is_none() {
        info!("No triage advisor configured, using the vital-signs heuristic");
    }
    rest_api::start_server(state, shutdown_signal()).await
}

pub async fn handle_create_user(args: CreateUserArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(dir) = &args.data_dir {
        config.storage.data_directory = dir.clone();
    }
    let store = TriageStore::open(&config.storage)
        .with_context(|| format!("Failed to open database at {:?}", config.storage.data_directory))?;
    let worker = store.clone();
    tokio::task::spawn_blocking(move || create_user(&worker, args))
        .await
        .context("create-user task failed")??;
    store.flush().await.context("Failed to flush the database")?;
    Ok(())
}

fn create_user(store: &TriageStore, args: CreateUserArgs) -> Result<models::User> {
    let new_user = NewUser {
        name: Some(args.name),
        surname: Some(args.surname),
        identity_code: Some(args.identity_code),
        email: Some(args.email),
        password: Some(args.password),
        permission: Some(args.permission),
        department_id: args.department_id,
    };
    let user = users::create_user(store, new_user).context("Could not create user")?;
    println!("Created {} user {} <{}> with id {}", user.permission, user.full_name(), user.email, user.id);
    Ok(user)
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
