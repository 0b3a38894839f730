use serde::{Deserialize, Serialize};

use crate::backend::ReconnectPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub http_server: HttpServerConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub pairing: PairingConfig,

    #[serde(default)]
    pub backend: BackendConfig,
}

impl AppConfig {
    /// Reconnect strategy in effect: an explicit setting wins over the flavor default.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        self.backend
            .reconnect
            .unwrap_or_else(|| self.backend.flavor.default_reconnect())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "chatbridge_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_host")]
    pub host: String,

    #[serde(default = "default_http_port")]
    pub port: u16,

    /// Maximum accepted JSON body size.
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    3001
}

fn default_body_limit_bytes() -> usize {
    50 * 1024 * 1024
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Delay before the first backend is constructed.
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,

    /// Pause before a replacement backend is built after a disconnect.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

fn default_startup_delay_ms() -> u64 {
    2000
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            startup_delay_ms: default_startup_delay_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Cap on remembered message ids. `None` keeps every id for the process lifetime.
    #[serde(default)]
    pub dedup_capacity: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingConfig {
    /// Pixels per QR module.
    #[serde(default = "default_pairing_scale")]
    pub scale: u32,

    /// Quiet zone, in modules.
    #[serde(default = "default_pairing_margin")]
    pub margin: u32,

    /// "L" | "M" | "Q" | "H"
    #[serde(default = "default_error_correction")]
    pub error_correction: String,
}

fn default_pairing_scale() -> u32 {
    10
}

fn default_pairing_margin() -> u32 {
    1
}

fn default_error_correction() -> String {
    "M".to_string()
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            scale: default_pairing_scale(),
            margin: default_pairing_margin(),
            error_correction: default_error_correction(),
        }
    }
}

/// Which kind of chat client sits behind the gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendFlavor {
    /// Protocol-level socket client.
    #[default]
    Socket,
    /// Browser-automation client.
    Browser,
}

impl BackendFlavor {
    pub fn default_reconnect(self) -> ReconnectPolicy {
        match self {
            Self::Socket => ReconnectPolicy::Automatic,
            Self::Browser => ReconnectPolicy::Manual,
        }
    }

    /// Chat address for a bare phone number.
    pub fn chat_address(self, number: &str) -> String {
        match self {
            Self::Socket => format!("{number}@s.whatsapp.net"),
            Self::Browser if number.contains("@c.us") => number.to_string(),
            Self::Browser => format!("{number}@c.us"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Socket => "socket",
            Self::Browser => "browser",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub flavor: BackendFlavor,

    /// Overrides the flavor's reconnect default when set.
    #[serde(default)]
    pub reconnect: Option<ReconnectPolicy>,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_gateway_instance")]
    pub instance: String,

    #[serde(default = "default_gateway_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_gateway_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:8085".to_string()
}

fn default_gateway_instance() -> String {
    "chatbridge".to_string()
}

fn default_gateway_timeout_ms() -> u64 {
    60_000
}

fn default_gateway_poll_interval_ms() -> u64 {
    3_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_gateway_url(),
            api_key: String::new(),
            instance: default_gateway_instance(),
            timeout_ms: default_gateway_timeout_ms(),
            poll_interval_ms: default_gateway_poll_interval_ms(),
        }
    }
}
