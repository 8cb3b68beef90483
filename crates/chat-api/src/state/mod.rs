//! Handler state

use std::sync::Arc;

use chat_service::ServiceContext;

/// Cheap to clone; every request shares one service context
#[derive(Clone)]
pub struct AppState {
    services: Arc<ServiceContext>,
}

impl AppState {
    pub fn new(services: ServiceContext) -> Self {
        Self {
            services: Arc::new(services),
        }
    }

    pub fn service_context(&self) -> &ServiceContext {
        &self.services
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
