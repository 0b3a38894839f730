//! 应用装配层：构建状态机、发送闸门与 supervisor，并启动 HTTP 服务。

use std::sync::Arc;
use std::time::Duration;

use chatbridge_core::api::{
    AppConfig, BackendSlot, CliError, DispatchGate, HealthReporter, ProcessedMessages,
    SessionStateMachine, SessionSupervisor,
};
use chatbridge_plugins::factory;
use tokio::sync::broadcast;

use crate::http::{start_server_with_config, AppState, ServerConfig};

#[tracing::instrument(name = "cli.run_app", skip(cfg))]
pub async fn run_app_with_config(cfg: AppConfig) -> Result<(), CliError> {
    let policy = cfg.reconnect_policy();
    tracing::info!(
        flavor = cfg.backend.flavor.as_str(),
        reconnect = ?policy,
        gateway = %cfg.backend.gateway.base_url,
        "starting chat bridge"
    );

    let machine = SessionStateMachine::new(policy, factory::build_renderer(&cfg));
    let slot = BackendSlot::new();
    let gate = DispatchGate::new(
        machine.clone(),
        slot.clone(),
        Arc::new(ProcessedMessages::new(cfg.dispatch.dedup_capacity)),
    );

    let mut changes = machine.subscribe();
    tokio::spawn(async move {
        while let Ok(change) = changes.recv().await {
            tracing::debug!(
                target: "chatbridge.session",
                from = %change.from,
                to = %change.to,
                at = %change.at.to_rfc3339(),
                "status feed"
            );
        }
    });

    let (shutdown_tx, _) = broadcast::channel(1);
    let supervisor = SessionSupervisor::new(
        machine.clone(),
        slot,
        factory::build_backend_factory(&cfg),
        Duration::from_millis(cfg.session.startup_delay_ms),
    )
    .with_reconnect_delay(Duration::from_millis(cfg.session.reconnect_delay_ms));
    let supervisor_task = tokio::spawn(supervisor.run(shutdown_tx.subscribe()));

    let server_config = ServerConfig {
        host: cfg.http_server.host.clone(),
        port: cfg.http_server.port,
    };
    let state = AppState::new(
        HealthReporter::new(machine),
        gate,
        cfg,
        shutdown_tx.clone(),
    );

    let result = start_server_with_config(server_config, state).await;

    let _ = shutdown_tx.send(());
    if let Err(e) = supervisor_task.await {
        tracing::warn!(error = %e, "session supervisor did not stop cleanly");
    }
    result
}
