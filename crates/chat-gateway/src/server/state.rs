//! Gateway state
//!
//! Shared dependencies for every socket on this instance.

use crate::broadcast::RoomRelay;
use crate::connection::ConnectionManager;
use chat_common::RealtimeConfig;
use chat_service::ServiceContext;
use std::sync::Arc;

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    service_context: Arc<ServiceContext>,
    connection_manager: Arc<ConnectionManager>,
    /// Cross-instance relay; absent when running without Redis
    relay: Option<Arc<RoomRelay>>,
    realtime: Arc<RealtimeConfig>,
    instance_id: Arc<str>,
}

impl GatewayState {
    pub fn new(
        service_context: ServiceContext,
        connection_manager: Arc<ConnectionManager>,
        realtime: RealtimeConfig,
        instance_id: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            service_context: Arc::new(service_context),
            connection_manager,
            relay: None,
            realtime: Arc::new(realtime),
            instance_id: instance_id.into(),
        }
    }

    #[must_use]
    pub fn with_relay(mut self, relay: Arc<RoomRelay>) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    pub fn connection_manager(&self) -> &Arc<ConnectionManager> {
        &self.connection_manager
    }

    pub fn relay(&self) -> Option<&RoomRelay> {
        self.relay.as_deref()
    }

    pub fn realtime(&self) -> &RealtimeConfig {
        &self.realtime
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("instance_id", &self.instance_id)
            .field("connection_manager", &self.connection_manager)
            .field("relay", &self.relay.is_some())
            .finish()
    }
}
