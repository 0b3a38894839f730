//! HTTP服务器状态管理

use chatbridge_core::api::{AppConfig, DispatchGate, HealthReporter};
use std::sync::Arc;
use tokio::sync::broadcast;

/// 应用状态（在所有handlers间共享）
#[derive(Clone)]
pub struct AppState {
    pub reporter: HealthReporter,
    pub gate: DispatchGate,
    pub config: Arc<AppConfig>,
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(
        reporter: HealthReporter,
        gate: DispatchGate,
        config: AppConfig,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        Self {
            reporter,
            gate,
            config: Arc::new(config),
            shutdown_tx,
        }
    }
}
