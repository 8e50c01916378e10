//! JSON body parsing with required-field checks ahead of typed decoding.

use serde::de::DeserializeOwned;
use serde_json::Value;

use tenantrls_core::error::{Result, TenantRlsError};

pub fn parse_json(raw: &[u8]) -> Result<Value> {
    serde_json::from_slice(raw).map_err(|e| TenantRlsError::BadRequest(format!("invalid JSON body: {e}")))
}

fn present(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Reject the body unless every dotted path (`context.tenantId`) is present
/// and non-empty; the error lists every missing path.
pub fn require(body: &Value, paths: &[&str]) -> Result<()> {
    let missing: Vec<&str> = paths
        .iter()
        .copied()
        .filter(|path| {
            let v = path.split('.').try_fold(body, |cur, key| cur.get(key));
            !present(v)
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(TenantRlsError::missing(missing))
    }
}

pub fn decode<T: DeserializeOwned>(body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|e| TenantRlsError::BadRequest(format!("invalid request body: {e}")))
}
