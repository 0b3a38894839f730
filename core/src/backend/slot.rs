use std::sync::Arc;

use tokio::sync::RwLock;

use super::traits::ChatBackend;

/// The backend instance currently serving sends and lookups.
///
/// Written only by the session supervisor; read by request handlers.
#[derive(Clone, Default)]
pub struct BackendSlot {
    inner: Arc<RwLock<Option<Arc<dyn ChatBackend>>>>,
}

impl BackendSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<Arc<dyn ChatBackend>> {
        self.inner.read().await.clone()
    }

    /// Installs `backend` and returns the instance it replaced.
    pub async fn replace(&self, backend: Arc<dyn ChatBackend>) -> Option<Arc<dyn ChatBackend>> {
        self.inner.write().await.replace(backend)
    }

    pub async fn take(&self) -> Option<Arc<dyn ChatBackend>> {
        self.inner.write().await.take()
    }
}
