//! 后端实例的生命周期：构建、连接、事件泵与重连

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};

use crate::backend::{BackendFactory, BackendSlot};
use crate::state::{BackendEvent, Directive, SessionStateMachine};

enum Pump {
    Reconnect,
    /// No further events will arrive from this instance.
    Settled,
    Shutdown,
}

/// Owns the running backend and is the only writer of session state.
pub struct SessionSupervisor {
    machine: SessionStateMachine,
    slot: BackendSlot,
    factory: Arc<dyn BackendFactory>,
    startup_delay: Duration,
    reconnect_delay: Duration,
}

impl SessionSupervisor {
    pub fn new(
        machine: SessionStateMachine,
        slot: BackendSlot,
        factory: Arc<dyn BackendFactory>,
        startup_delay: Duration,
    ) -> Self {
        Self {
            machine,
            slot,
            factory,
            startup_delay,
            reconnect_delay: Duration::ZERO,
        }
    }

    /// Pause between dropping an instance and building its replacement.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Runs until `shutdown` fires. Returns early only when initialization fails.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tokio::select! {
            _ = tokio::time::sleep(self.startup_delay) => {}
            _ = shutdown.recv() => return,
        }

        let mut generation: u64 = 0;
        loop {
            generation += 1;
            let backend = match self.factory.create() {
                Ok(b) => b,
                Err(e) => {
                    self.machine.fail_initialization(&e).await;
                    return;
                }
            };
            tracing::info!(
                target: "chatbridge.session",
                backend = backend.name(),
                generation,
                "starting backend"
            );

            if let Some(previous) = self.slot.replace(backend.clone()).await {
                previous.shutdown().await;
            }

            // Each instance gets its own channel; dropping the receiver mutes it.
            let (tx, mut rx) = mpsc::unbounded_channel();
            if let Err(e) = backend.connect(tx).await {
                self.machine.fail_initialization(&e).await;
                return;
            }

            match self.pump(&mut rx, &mut shutdown).await {
                Pump::Reconnect => {
                    drop(rx);
                    tracing::info!(
                        target: "chatbridge.session",
                        generation,
                        delay_ms = self.reconnect_delay.as_millis() as u64,
                        "reconnecting"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(self.reconnect_delay) => continue,
                        _ = shutdown.recv() => break,
                    }
                }
                Pump::Settled => {
                    drop(rx);
                    let _ = shutdown.recv().await;
                    break;
                }
                Pump::Shutdown => break,
            }
        }

        if let Some(backend) = self.slot.take().await {
            backend.shutdown().await;
        }
        tracing::info!(target: "chatbridge.session", "supervisor stopped");
    }

    async fn pump(
        &self,
        rx: &mut mpsc::UnboundedReceiver<BackendEvent>,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Pump {
        loop {
            let event = tokio::select! {
                event = rx.recv() => event,
                _ = shutdown.recv() => return Pump::Shutdown,
            };

            let event = match event {
                Some(event) => event,
                None => {
                    tracing::warn!(target: "chatbridge.session", "backend event stream closed");
                    BackendEvent::Disconnected { reason: None }
                }
            };
            let closed = matches!(event, BackendEvent::Disconnected { .. });

            match self.machine.apply(event).await {
                Directive::Reconnect => return Pump::Reconnect,
                Directive::Continue if closed || self.machine.status().await.is_terminal() => {
                    return Pump::Settled;
                }
                Directive::Continue => {}
            }
        }
    }
}
