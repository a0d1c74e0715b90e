use std::sync::Arc;

use crate::backend::{AuthProvider, Backend, RecordStore};
use crate::config::Config;
use crate::provisioning::ProvisioningService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthProvider>,
    pub store: Arc<dyn RecordStore>,
    /// Signup, login and profile completion on top of `auth` + `store`.
    pub provisioning: Arc<ProvisioningService>,
}

impl AppState {
    pub fn new(config: &Config, backend: Backend) -> Self {
        let provisioning = Arc::new(ProvisioningService::new(
            backend.auth.clone(),
            backend.store.clone(),
            config.institution_email_domain.clone(),
            config.signup_redirect_url.clone(),
        ));
        Self {
            auth: backend.auth,
            store: backend.store,
            provisioning,
        }
    }
}
