//! Engine config loader (strict parsing).

pub mod schema;

use std::fs;

use tenantrls_core::error::{Result, TenantRlsError};

pub use schema::{
    AuditSection, ClockSource, EngineConfig, EvaluatorSection, GatewaySection, RegistrySection,
    TableConfig,
};

/// Config path used when neither the CLI nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "tenantrls.yaml";

pub fn load_from_file(path: &str) -> Result<EngineConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| TenantRlsError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<EngineConfig> {
    let cfg: EngineConfig = serde_yaml::from_str(s)
        .map_err(|e| TenantRlsError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
