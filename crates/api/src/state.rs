use std::sync::Arc;

use crate::auth::backend::IdentityBackend;
use crate::auth::session::SessionResolver;
use crate::config::ServerConfig;
use crate::middleware::gate::GatePolicy;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (cookie attributes, backend location).
    pub config: Arc<ServerConfig>,
    /// Resolves callers against the backend identity service.
    pub resolver: SessionResolver,
    /// Which paths the route gate protects.
    pub gate: Arc<GatePolicy>,
}

impl AppState {
    /// State with the default gate policy.
    pub fn new(config: ServerConfig, backend: Arc<dyn IdentityBackend>) -> Self {
        Self {
            config: Arc::new(config),
            resolver: SessionResolver::new(backend),
            gate: Arc::new(GatePolicy::default()),
        }
    }

    pub fn backend(&self) -> &Arc<dyn IdentityBackend> {
        self.resolver.backend()
    }
}
