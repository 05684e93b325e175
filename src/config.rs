//! Environment-driven configuration for the server binary.

use crate::models::ArlRiskClass;
use std::env;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_TEMPLATE_DIR: &str = "templates";
pub const DEFAULT_LOG_FILTER: &str = "obra_engine=info";

/// Server settings read from `OBRA_*` variables.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// `OBRA_BIND_ADDR`: socket address the server listens on.
    pub bind_addr: String,
    /// `OBRA_TEMPLATE_DIR`: directory of template JSON files.
    pub template_dir: PathBuf,
    /// `OBRA_LOG`: `EnvFilter` directives.
    pub log_filter: Option<String>,
    /// `OBRA_LOG_JSON`: emit JSON log lines.
    pub log_json: bool,
    /// ARL class used when a request does not name one.
    pub default_arl_class: ArlRiskClass,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            template_dir: PathBuf::from(DEFAULT_TEMPLATE_DIR),
            log_filter: None,
            log_json: false,
            default_arl_class: ArlRiskClass::default(),
        }
    }
}

impl EngineConfig {
    /// Read `OBRA_*` variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        // Unparseable values are logged and replaced by the default.
        let default_arl_class = match lookup("OBRA_ARL_CLASS") {
            Some(raw) => raw.parse::<ArlRiskClass>().unwrap_or_else(|err| {
                warn!(value = %raw, error = %err, "ignoring OBRA_ARL_CLASS");
                defaults.default_arl_class
            }),
            None => defaults.default_arl_class,
        };
        Self {
            bind_addr: lookup("OBRA_BIND_ADDR").unwrap_or(defaults.bind_addr),
            template_dir: lookup("OBRA_TEMPLATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.template_dir),
            log_filter: lookup("OBRA_LOG").filter(|v| !v.trim().is_empty()),
            log_json: lookup("OBRA_LOG_JSON")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.log_json),
            default_arl_class,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
