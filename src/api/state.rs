//! Application state for shared services

use std::sync::Arc;

use crate::domain::CredentialStore;
use crate::infrastructure::credential::CredentialService;
use crate::infrastructure::quota::QuotaAuthorizer;

/// Application state shared by all handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub credentials: Arc<CredentialService>,
    pub authorizer: Arc<QuotaAuthorizer>,
}

impl AppState {
    /// Build the services over one shared store
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            credentials: Arc::new(CredentialService::new(Arc::clone(&store))),
            authorizer: Arc::new(QuotaAuthorizer::new(store)),
        }
    }
}
