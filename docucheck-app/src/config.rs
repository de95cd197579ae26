//! Service configuration loader.

use crate::error::AppError;
use docucheck_audit::CoordinatorConfig;
use docucheck_protocol::ToolLimits;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "DOCUCHECK_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "docucheck.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    pub documents_dir: PathBuf,
    pub policies_dir: PathBuf,
    /// Limits advertised for the `document_audit` tool.
    #[serde(default)]
    pub limits: ToolLimits,
    #[serde(flatten)]
    pub coordinator: CoordinatorConfig,
}

impl AppConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        self.server
            .bind
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid server.bind {:?}: {e}", self.server.bind)))
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.bind_addr()?;
        if self.server.max_body_bytes == 0 {
            return Err(AppError::Config(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(AppError::Config("logging.level must not be empty".to_string()));
        }

        let limits = &self.audit.limits;
        if limits.timeout_seconds == 0 {
            return Err(AppError::Config(
                "audit.limits.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if limits.max_payload_kb == 0 {
            return Err(AppError::Config(
                "audit.limits.max_payload_kb must be greater than zero".to_string(),
            ));
        }

        let ratio = self.audit.coordinator.auditor_budget_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(AppError::Config(format!(
                "audit.auditor_budget_ratio must be in (0, 1], got {ratio}"
            )));
        }

        for (field, dir) in [
            ("audit.documents_dir", &self.audit.documents_dir),
            ("audit.policies_dir", &self.audit.policies_dir),
        ] {
            if !dir.is_dir() {
                return Err(AppError::Config(format!(
                    "{field} is not a directory: {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

/// Picks the config path: first CLI argument, then `DOCUCHECK_CONFIG`, then
/// `docucheck.yaml` in the working directory.
pub fn config_path(cli_arg: Option<String>, env_value: Option<String>) -> PathBuf {
    cli_arg
        .or(env_value)
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Loads and validates the YAML configuration at `config_path`.
///
/// Relative `documents_dir` and `policies_dir` are resolved against the
/// directory containing the config file.
pub fn load_config(config_path: &Path) -> Result<AppConfig, AppError> {
    if !config_path.exists() {
        return Err(AppError::Config(format!(
            "Config file not found: {}",
            config_path.display()
        )));
    }

    let content = std::fs::read_to_string(config_path)?;
    if content.trim().is_empty() {
        return Err(AppError::Config("Config file is empty".to_string()));
    }

    let mut config: AppConfig = serde_yaml::from_str(&content)
        .map_err(|e| AppError::Config(format!("Invalid YAML: {e}")))?;

    let base = config_path.parent().unwrap_or_else(|| Path::new("."));
    config.audit.documents_dir = resolve(base, &config.audit.documents_dir);
    config.audit.policies_dir = resolve(base, &config.audit.policies_dir);

    config.validate()?;
    Ok(config)
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
