//! Capsule command handlers.

use std::sync::Arc;

use serde_json::Value;

use cairn_types::capsule::NewCapsule;
use cairn_types::CapsuleId;

use crate::auth;
use crate::rpc::RpcError;
use crate::DaemonState;

/// Create a capsule owned by the caller. Validation (title bounds, future
/// release date) happens in the service; a malformed date string fails
/// deserialization here as invalid params.
pub async fn create_capsule(
    state: &Arc<DaemonState>,
    params: &Value,
) -> Result<Value, RpcError> {
    let caller = auth::require_caller(state, params).await?;
    let new: NewCapsule = serde_json::from_value(params.clone())
        .map_err(|e| RpcError::invalid_params(&e.to_string()))?;

    let detail = state.service.create(caller.id, new).await?;
    to_value(detail)
}

/// List the caller's capsules, newest first.
pub async fn list_capsules(
    state: &Arc<DaemonState>,
    params: &Value,
) -> Result<Value, RpcError> {
    let caller = auth::require_caller(state, params).await?;
    let summaries = state.service.list(caller.id).await?;
    to_value(summaries)
}

/// Fetch one capsule with owner-gated disclosure.
pub async fn get_capsule(state: &Arc<DaemonState>, params: &Value) -> Result<Value, RpcError> {
    let caller = auth::require_caller(state, params).await?;
    let capsule_id = require_capsule_id(params)?;
    let detail = state.service.get(capsule_id, caller.id).await?;
    to_value(detail)
}

/// Run the unlock sweep on demand. Same operation the scheduler runs at
/// civil midnight; exposed so operators can force a pass.
pub async fn run_unlock_check(
    state: &Arc<DaemonState>,
    params: &Value,
) -> Result<Value, RpcError> {
    auth::require_caller(state, params).await?;
    let unlocked_count = state.service.check_and_unlock().await?;
    Ok(serde_json::json!({ "unlocked_count": unlocked_count }))
}

pub(crate) fn require_capsule_id(params: &Value) -> Result<CapsuleId, RpcError> {
    params
        .get("capsule_id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| RpcError::invalid_params("capsule_id required"))
}

pub(crate) fn to_value<T: serde::Serialize>(value: T) -> Result<Value, RpcError> {
    serde_json::to_value(value)
        .map_err(|e| RpcError::internal_error(&format!("serialize response: {e}")))
}
