use clap::Parser;
use std::path::PathBuf;

use chatbridge_core::api::{AppConfig, ReconnectPolicy};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectMode {
    Automatic,
    Manual,
}

impl From<ReconnectMode> for ReconnectPolicy {
    fn from(mode: ReconnectMode) -> Self {
        match mode {
            ReconnectMode::Automatic => ReconnectPolicy::Automatic,
            ReconnectMode::Manual => ReconnectPolicy::Manual,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "chatbridge", version, about = "WhatsApp HTTP bridge")]
pub struct Args {
    /// Config file. Defaults to ~/.chatbridge/config.toml, then ./config.toml.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    /// Override the backend's reconnect policy.
    #[arg(long, value_enum)]
    pub reconnect: Option<ReconnectMode>,

    /// Delay before the chat session is started, in milliseconds.
    #[arg(long)]
    pub startup_delay_ms: Option<u64>,
}

impl Args {
    /// Command-line values win over config file and environment.
    pub fn apply_overrides(&self, cfg: &mut AppConfig) {
        if let Some(host) = &self.host {
            cfg.http_server.host = host.clone();
        }
        if let Some(port) = self.port {
            cfg.http_server.port = port;
        }
        if let Some(mode) = self.reconnect {
            cfg.backend.reconnect = Some(mode.into());
        }
        if let Some(delay) = self.startup_delay_ms {
            cfg.session.startup_delay_ms = delay;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_leave_config_untouched() {
        let args = Args::try_parse_from(["chatbridge"]).unwrap();
        let mut cfg = AppConfig::default();
        args.apply_overrides(&mut cfg);
        assert_eq!(cfg.http_server.port, 3001);
        assert_eq!(cfg.http_server.host, "0.0.0.0");
        assert_eq!(cfg.backend.reconnect, None);
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "chatbridge",
            "--port",
            "8088",
            "--host",
            "127.0.0.1",
            "--reconnect",
            "manual",
            "--startup-delay-ms",
            "0",
        ])
        .unwrap();
        let mut cfg = AppConfig::default();
        args.apply_overrides(&mut cfg);
        assert_eq!(cfg.http_server.port, 8088);
        assert_eq!(cfg.http_server.host, "127.0.0.1");
        assert_eq!(cfg.reconnect_policy(), ReconnectPolicy::Manual);
        assert_eq!(cfg.session.startup_delay_ms, 0);
    }

    #[test]
    fn test_rejects_unknown_reconnect_mode() {
        assert!(Args::try_parse_from(["chatbridge", "--reconnect", "sometimes"]).is_err());
    }
}
