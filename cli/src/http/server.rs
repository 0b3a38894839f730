//! HTTP服务器生命周期管理

use super::{
    middleware::{create_trace_layer, request_logger},
    routes::create_router,
    AppState,
};
use axum::middleware;
use chatbridge_core::api::CliError;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

/// HTTP服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3001,
        }
    }
}

/// 使用自定义配置启动HTTP服务器
pub async fn start_server_with_config(
    config: ServerConfig,
    state: AppState,
) -> Result<(), CliError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| CliError::Config(format!("invalid listen address: {e}")))?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| CliError::Server(format!("bind {addr} failed: {e}")))?;

    info!(target: "chatbridge.http", "WhatsApp bridge listening on http://{}", addr);

    serve(listener, state).await
}

/// Serves on an already bound listener until Ctrl+C, SIGTERM or the shutdown channel fires.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), CliError> {
    let app = create_router(state.clone())
        .layer(middleware::from_fn(request_logger))
        .layer(create_trace_layer());

    let mut shutdown_rx = state.shutdown_tx.subscribe();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!(target: "chatbridge.http", "Received Ctrl+C signal");
                }
                _ = shutdown_rx.recv() => {
                    info!(target: "chatbridge.http", "Received shutdown signal");
                }
                _ = wait_for_sigterm() => {
                    info!(target: "chatbridge.http", "Received SIGTERM signal");
                }
            }

            info!(target: "chatbridge.http", "Starting graceful shutdown...");
        })
        .await?;

    info!(target: "chatbridge.http", "Server shutdown complete");
    Ok(())
}

/// 等待 SIGTERM 信号（Unix系统）
#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!(target: "chatbridge.http", error = %e, "SIGTERM handler unavailable");
            std::future::pending::<()>().await
        }
    }
}

/// Windows 系统不支持 SIGTERM
#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbridge_core::api::{
        AppConfig, BackendSlot, DispatchGate, HealthReporter, ProcessedMessages,
        ReconnectPolicy, SessionStateMachine,
    };
    use chatbridge_plugins::pairing::QrRenderer;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::broadcast;

    #[tokio::test]
    async fn test_shutdown_channel_stops_server() {
        let machine =
            SessionStateMachine::new(ReconnectPolicy::Manual, Arc::new(QrRenderer::default()));
        let gate = DispatchGate::new(
            machine.clone(),
            BackendSlot::new(),
            Arc::new(ProcessedMessages::default()),
        );
        let (shutdown_tx, _) = broadcast::channel(1);
        let state = AppState::new(
            HealthReporter::new(machine),
            gate,
            AppConfig::default(),
            shutdown_tx.clone(),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let task = tokio::spawn(serve(listener, state));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(()).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_host_is_config_error() {
        let (shutdown_tx, _) = broadcast::channel(1);
        let machine =
            SessionStateMachine::new(ReconnectPolicy::Manual, Arc::new(QrRenderer::default()));
        let state = AppState::new(
            HealthReporter::new(machine.clone()),
            DispatchGate::new(
                machine,
                BackendSlot::new(),
                Arc::new(ProcessedMessages::default()),
            ),
            AppConfig::default(),
            shutdown_tx,
        );
        let err = start_server_with_config(
            ServerConfig {
                host: "not a host".into(),
                port: 1,
            },
            state,
        )
        .await
        .unwrap_err();
        assert_eq!(err.exit_code(), 11);
    }
}
