//! Application state management

use std::sync::Arc;

use mt_core::{AppConfig, TransactionRepository, UserRepository};

use crate::auth::{CredentialStore, JwtConfig};

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Token signing settings derived from `config.auth`
    pub jwt: JwtConfig,
    pub credentials: CredentialStore,
}

impl AppState {
    pub fn new(config: AppConfig, credentials: CredentialStore) -> Self {
        Self {
            jwt: JwtConfig::from(&config.auth),
            config,
            credentials,
        }
    }

    /// State over a single backend holding both users and transactions
    pub fn with_store<S>(config: AppConfig, store: Arc<S>) -> Self
    where
        S: UserRepository + TransactionRepository + 'static,
    {
        let credentials = CredentialStore::from_store(store, config.auth.password);
        Self::new(config, credentials)
    }
}
