// rest_api/src/state.rs

use std::sync::Arc;

use lib::triage_suggest::{self, TriageSuggester};
use lib::{AppConfig, TriageStore};
use security::RolesConfig;

/// Shared by every handler. Cloning is cheap: the store wraps a sled handle
/// and the rest sits behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub store: TriageStore,
    pub config: Arc<AppConfig>,
    pub roles: Arc<RolesConfig>,
    pub suggester: Arc<dyn TriageSuggester>,
}

impl AppState {
    pub fn new(store: TriageStore, config: AppConfig) -> lib::Result<Self> {
        let suggester = triage_suggest::from_config(&config.triage)?;
        Ok(Self::with_suggester(store, config, suggester))
    }

    pub fn with_suggester(store: TriageStore, config: AppConfig, suggester: Arc<dyn TriageSuggester>) -> Self {
        AppState {
            store,
            config: Arc::new(config),
            roles: Arc::new(RolesConfig::default()),
            suggester,
        }
    }

    pub fn session_secret(&self) -> &str {
        &self.config.security.session_secret
    }
}
