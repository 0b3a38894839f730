use std::path::{Path, PathBuf};

use anyhow::Context;

use super::types::AppConfig;
use crate::backend::ReconnectPolicy;

/// Get the default chatbridge data directory: ~/.chatbridge
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".chatbridge"))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str::<AppConfig>(&s)
        .with_context(|| format!("failed to parse config {}", path.display()))
}

/// Loads config with precedence: explicit path, ~/.chatbridge/config.toml,
/// ./config.toml, defaults. Environment variables are applied last.
pub fn load_default(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    let local_config = Path::new("config.toml");

    let mut cfg = if let Some(path) = explicit {
        load_from_path(path)?
    } else {
        let user_config = get_data_dir().ok().map(|d| d.join("config.toml"));
        match user_config {
            Some(p) if p.exists() => load_from_path(&p)?,
            _ if local_config.exists() => load_from_path(local_config)?,
            _ => AppConfig::default(),
        }
    };

    // Log files default to ~/.chatbridge/logs
    let directory_unset = cfg
        .logging
        .directory
        .as_deref()
        .map(|s| s.trim().is_empty())
        .unwrap_or(true);
    if cfg.logging.file && directory_unset {
        if let Ok(dir) = get_data_dir() {
            cfg.logging.directory = Some(dir.join("logs").to_string_lossy().to_string());
        }
    }

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;

    Ok(cfg)
}

/// Environment variable overrides (highest priority). Blank values are ignored.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, get: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("CHATBRIDGE_HOST") {
        cfg.http_server.host = v;
    }
    if let Some(v) = get("CHATBRIDGE_PORT") {
        cfg.http_server.port = v
            .trim()
            .parse()
            .with_context(|| format!("CHATBRIDGE_PORT is not a port number: {v}"))?;
    }
    if let Some(v) = get("CHATBRIDGE_GATEWAY_URL") {
        cfg.backend.gateway.base_url = v;
    }
    if let Some(v) = get("CHATBRIDGE_GATEWAY_API_KEY") {
        cfg.backend.gateway.api_key = v;
    }
    if let Some(v) = get("CHATBRIDGE_INSTANCE") {
        cfg.backend.gateway.instance = v;
    }
    if let Some(v) = get("CHATBRIDGE_RECONNECT") {
        cfg.backend.reconnect = Some(match v.trim().to_ascii_lowercase().as_str() {
            "automatic" | "auto" => ReconnectPolicy::Automatic,
            "manual" | "off" => ReconnectPolicy::Manual,
            other => anyhow::bail!("CHATBRIDGE_RECONNECT must be automatic|manual, got {other}"),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn explicit_path_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[http_server]\nport = 4010\n\n[dispatch]\ndedup_capacity = 128\n"
        )
        .unwrap();

        let cfg = load_from_path(file.path()).unwrap();
        assert_eq!(cfg.http_server.port, 4010);
        assert_eq!(cfg.dispatch.dedup_capacity, Some(128));
    }

    #[test]
    fn malformed_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http_server\nport = ").unwrap();

        let err = load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CHATBRIDGE_PORT", "3100"),
            ("CHATBRIDGE_GATEWAY_URL", "http://gw:9000"),
            ("CHATBRIDGE_RECONNECT", "manual"),
            ("CHATBRIDGE_INSTANCE", "  "),
        ]);
        let mut cfg = AppConfig::default();
        apply_env_overrides(&mut cfg, |k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(cfg.http_server.port, 3100);
        assert_eq!(cfg.backend.gateway.base_url, "http://gw:9000");
        assert_eq!(cfg.backend.reconnect, Some(ReconnectPolicy::Manual));
        assert_eq!(cfg.backend.gateway.instance, "chatbridge");
    }

    #[test]
    fn bad_port_is_rejected() {
        let mut cfg = AppConfig::default();
        let result = apply_env_overrides(&mut cfg, |k| {
            (k == "CHATBRIDGE_PORT").then(|| "not-a-port".to_string())
        });
        assert!(result.is_err());
    }
}
