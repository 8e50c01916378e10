use std::collections::HashSet;

use chrono::{Local, NaiveDateTime, Utc};
use serde::Deserialize;
use tenantrls_core::error::{Result, TenantRlsError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub registry: RegistrySection,

    #[serde(default)]
    pub audit: AuditSection,

    #[serde(default)]
    pub evaluator: EvaluatorSection,

    /// Seed the demo policies and rule for tenant `default` at start-up.
    #[serde(default = "default_true")]
    pub seed_defaults: bool,

    /// Tables guarded by the tenant middleware. Read by [`crate::router::guard_table`]
    /// when a host application mounts its data routes.
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            registry: RegistrySection::default(),
            audit: AuditSection::default(),
            evaluator: EvaluatorSection::default(),
            seed_defaults: true,
            tables: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(TenantRlsError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.registry.validate()?;
        self.audit.validate()?;

        let mut seen = HashSet::new();
        for t in &self.tables {
            if t.name.trim().is_empty() {
                return Err(TenantRlsError::BadRequest("tables[].name must not be empty".into()));
            }
            if !seen.insert(t.name.as_str()) {
                return Err(TenantRlsError::BadRequest(format!(
                    "tables[].name must be unique: {}",
                    t.name
                )));
            }
        }

        Ok(())
    }

    pub fn table(&self, name: &str) -> Option<&TableConfig> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Prefix for the policy API routes.
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            base_path: default_base_path(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if !self.base_path.starts_with('/') || self.base_path.ends_with('/') {
            return Err(TenantRlsError::BadRequest(
                "gateway.base_path must start with '/' and must not end with '/'".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_base_path() -> String {
    "/v1/rls-tenant-policies".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrySection {
    #[serde(default = "default_max_contexts")]
    pub max_contexts: usize,

    #[serde(default = "default_context_ttl_secs")]
    pub context_ttl_secs: u64,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            max_contexts: default_max_contexts(),
            context_ttl_secs: default_context_ttl_secs(),
        }
    }
}

impl RegistrySection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=1_000_000).contains(&self.max_contexts) {
            return Err(TenantRlsError::BadRequest(
                "registry.max_contexts must be between 1 and 1000000".into(),
            ));
        }
        if !(1..=86_400).contains(&self.context_ttl_secs) {
            return Err(TenantRlsError::BadRequest(
                "registry.context_ttl_secs must be between 1 and 86400".into(),
            ));
        }
        Ok(())
    }
}

fn default_max_contexts() -> usize {
    10_000
}
fn default_context_ttl_secs() -> u64 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditSection {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

impl AuditSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=10_000_000).contains(&self.max_entries) {
            return Err(TenantRlsError::BadRequest(
                "audit.max_entries must be between 1 and 10000000".into(),
            ));
        }
        Ok(())
    }
}

fn default_max_entries() -> usize {
    100_000
}

/// Wall clock used for policy time restrictions.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClockSource {
    #[default]
    Local,
    Utc,
}

impl ClockSource {
    pub fn now(self) -> NaiveDateTime {
        match self {
            ClockSource::Local => Local::now().naive_local(),
            ClockSource::Utc => Utc::now().naive_utc(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct EvaluatorSection {
    #[serde(default)]
    pub clock: ClockSource,
}

/// Per-table switches for payload sanitization and response filtering.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    pub name: String,

    /// Stamp `tenantId`/`organizationId` onto inbound bodies.
    #[serde(default = "default_true")]
    pub stamp_tenant: bool,

    /// Stamp `createdBy` onto inbound bodies of inserts.
    #[serde(default = "default_true")]
    pub stamp_created_by: bool,

    /// Strip or block outbound records of another tenant.
    #[serde(default = "default_true")]
    pub filter_responses: bool,
}

impl TableConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stamp_tenant: true,
            stamp_created_by: true,
            filter_responses: true,
        }
    }
}

fn default_true() -> bool {
    true
}
