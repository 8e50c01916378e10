//! Data model shared by the policy engine and its HTTP surface.
//!
//! JSON field names are camelCase throughout so records round-trip with the
//! existing API clients.

pub mod audit;
pub mod context;
pub mod evaluation;
pub mod operation;
pub mod policy;
pub mod rule;
pub mod stats;

pub use audit::{AuditOperation, AuditResult, AuditSecurityContext, NewAuditLog, TenantAuditLog};
pub use context::{SubscriptionLevel, TenantMetadata, TenantSecurityContext, TenantType};
pub use evaluation::AccessEvaluationResult;
pub use operation::{Operation, OperationType, PolicyOperation};
pub use policy::{
    AccessRules, ComplianceFlags, ConditionType, IpRestrictions, NewTenantPolicy, PolicyConditions,
    PolicyConfiguration, PolicyMetadata, TenantConditions, TenantPolicy, TenantRestrictions,
    TimeOfDay, TimeRestrictions,
};
pub use rule::{
    ContextConditions, DataConditions, NewTenantRule, RuleActionType, RuleActions, RuleConditions,
    RuleConfiguration, RuleMetadata, RuleTenantIsolation, TenantRule, TenantScope,
};
pub use stats::{AccessStats, ComplianceStats, TenantBreakdown, TenantStats};
