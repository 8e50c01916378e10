//! Data-access operations submitted for evaluation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TenantRlsError;

/// Concrete statement kind of an access attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationType {
    Select,
    Insert,
    Update,
    Delete,
}

impl OperationType {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationType::Select => "SELECT",
            OperationType::Insert => "INSERT",
            OperationType::Update => "UPDATE",
            OperationType::Delete => "DELETE",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = TenantRlsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SELECT" => Ok(OperationType::Select),
            "INSERT" => Ok(OperationType::Insert),
            "UPDATE" => Ok(OperationType::Update),
            "DELETE" => Ok(OperationType::Delete),
            other => Err(TenantRlsError::BadRequest(format!("unknown operation type: {other}"))),
        }
    }
}

/// Operation scope of a tenant policy (`ALL` covers every statement kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyOperation {
    Select,
    Insert,
    Update,
    Delete,
    #[default]
    All,
}

impl PolicyOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyOperation::Select => "SELECT",
            PolicyOperation::Insert => "INSERT",
            PolicyOperation::Update => "UPDATE",
            PolicyOperation::Delete => "DELETE",
            PolicyOperation::All => "ALL",
        }
    }

    /// True when a policy scoped to `self` applies to `op`.
    pub fn covers(self, op: OperationType) -> bool {
        self == PolicyOperation::All || self == PolicyOperation::from(op)
    }
}

impl From<OperationType> for PolicyOperation {
    fn from(op: OperationType) -> Self {
        match op {
            OperationType::Select => PolicyOperation::Select,
            OperationType::Insert => PolicyOperation::Insert,
            OperationType::Update => PolicyOperation::Update,
            OperationType::Delete => PolicyOperation::Delete,
        }
    }
}

impl FromStr for PolicyOperation {
    type Err = TenantRlsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "ALL" {
            return Ok(PolicyOperation::All);
        }
        OperationType::from_str(s).map(PolicyOperation::from)
    }
}

/// One access attempt against a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(rename = "type")]
    pub op_type: OperationType,
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
}

impl Operation {
    pub fn new(op_type: OperationType, table_name: impl Into<String>) -> Self {
        Self {
            op_type,
            table_name: table_name.into(),
            target_tenant_id: None,
            record_id: None,
            columns: None,
        }
    }

    pub fn with_target_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.target_tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_record(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    /// True when the operation names a target tenant other than `tenant_id`.
    /// An empty target names no tenant.
    pub fn is_cross_tenant(&self, tenant_id: &str) -> bool {
        matches!(self.target_tenant_id.as_deref(), Some(t) if !t.is_empty() && t != tenant_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn all_covers_every_operation() {
        for op in [
            OperationType::Select,
            OperationType::Insert,
            OperationType::Update,
            OperationType::Delete,
        ] {
            assert!(PolicyOperation::All.covers(op));
        }
        assert!(PolicyOperation::Select.covers(OperationType::Select));
        assert!(!PolicyOperation::Select.covers(OperationType::Delete));
    }

    #[test]
    fn same_target_tenant_is_not_cross_tenant() {
        let op = Operation::new(OperationType::Select, "invoices").with_target_tenant("t1");
        assert!(!op.is_cross_tenant("t1"));
        assert!(op.is_cross_tenant("t2"));
        assert!(!Operation::new(OperationType::Select, "invoices").is_cross_tenant("t1"));
    }

    #[test]
    fn empty_target_tenant_is_not_cross_tenant() {
        let op: Operation =
            serde_json::from_str(r#"{"type":"SELECT","tableName":"invoices","targetTenantId":""}"#).unwrap();
        assert!(!op.is_cross_tenant("t1"));
    }

    #[test]
    fn parses_upper_case_names() {
        assert_eq!("DELETE".parse::<OperationType>().ok(), Some(OperationType::Delete));
        assert!("select".parse::<OperationType>().is_err());
        assert_eq!("ALL".parse::<PolicyOperation>().ok(), Some(PolicyOperation::All));
    }
}
