// lib/src/lib.rs
// Storage, configuration and workflow services for the triage service. The
// record types themselves live in the `models` crate.

pub mod config;
pub mod dashboard;
pub mod errors;
pub mod services;
pub mod storage_engine;
pub mod triage_suggest;

pub use models::medical::{Login, User};

pub use crate::config::AppConfig;
pub use crate::errors::*;
pub use crate::services::Actor;
pub use crate::storage_engine::{Record, TriageStore};
pub use crate::triage_suggest::{TriageRequest, TriageSuggester, TriageSuggestion};
