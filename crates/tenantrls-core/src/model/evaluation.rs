//! Outcome of one access evaluation.

use serde::{Deserialize, Serialize};

/// Allow/deny decision with the evidence trail that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessEvaluationResult {
    pub allowed: bool,
    pub reason: String,
    /// Ids of the policies consulted, in evaluation order.
    pub policies_applied: Vec<String>,
    /// Ids of the rules consulted, in evaluation order.
    pub rules_evaluated: Vec<String>,
    /// Wall-clock milliseconds from evaluation start.
    pub execution_time: f64,
    pub tenant_isolation_enforced: bool,
}
