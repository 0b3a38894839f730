use std::sync::Arc;

use chatbridge_core::api::{
    AppConfig, BackendError, BackendFactory, BackendFlavor, ChatBackend, GatewayConfig,
    PairingRenderer,
};

use crate::backend::GatewayBackend;
use crate::pairing::QrRenderer;

/// Builds one gateway-hosted session per call.
pub struct GatewayBackendFactory {
    gateway: GatewayConfig,
    flavor: BackendFlavor,
}

impl GatewayBackendFactory {
    pub fn new(gateway: GatewayConfig, flavor: BackendFlavor) -> Self {
        Self { gateway, flavor }
    }
}

impl BackendFactory for GatewayBackendFactory {
    fn create(&self) -> Result<Arc<dyn ChatBackend>, BackendError> {
        Ok(Arc::new(GatewayBackend::new(&self.gateway, self.flavor)?))
    }
}

pub fn build_backend_factory(cfg: &AppConfig) -> Arc<dyn BackendFactory> {
    Arc::new(GatewayBackendFactory::new(
        cfg.backend.gateway.clone(),
        cfg.backend.flavor,
    ))
}

pub fn build_renderer(cfg: &AppConfig) -> Arc<dyn PairingRenderer> {
    Arc::new(QrRenderer::from_config(&cfg.pairing))
}
