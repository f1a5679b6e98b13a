//! Sharing and collaboration command handlers.
//!
//! Tokens travel as `cairn://` links on this surface; the domain service
//! below deals in bare tokens. A link that fails to parse gets the same
//! answer as a link whose token no longer resolves, so a client cannot
//! tell a revoked link from a mangled one.

use std::sync::Arc;

use serde_json::Value;

use cairn_token::link;

use crate::auth;
use crate::commands::capsules::{require_capsule_id, to_value};
use crate::rpc::RpcError;
use crate::DaemonState;

/// Issue a fresh share link for a capsule, replacing any previous one.
pub async fn generate_share_token(
    state: &Arc<DaemonState>,
    params: &Value,
) -> Result<Value, RpcError> {
    let caller = auth::require_caller(state, params).await?;
    let capsule_id = require_capsule_id(params)?;
    let token = state
        .service
        .generate_share_token(capsule_id, caller.id)
        .await?;
    Ok(serde_json::json!({
        "share_token": token,
        "share_link": link::encode_share_link(&token),
    }))
}

/// Read-only view behind a share link. The one method with no caller
/// identity: the link itself is the capability.
pub async fn view_shared_capsule(
    state: &Arc<DaemonState>,
    params: &Value,
) -> Result<Value, RpcError> {
    let token = require_share_link(params)?;
    let view = state.service.view_by_share_token(&token).await?;
    to_value(view)
}

/// Copy a shared capsule into the caller's own collection.
pub async fn copy_shared_capsule(
    state: &Arc<DaemonState>,
    params: &Value,
) -> Result<Value, RpcError> {
    let caller = auth::require_caller(state, params).await?;
    let token = require_share_link(params)?;
    let copy = state
        .service
        .copy_shared_capsule(&token, caller.id)
        .await?;
    to_value(copy)
}

/// Issue a fresh collaboration invite link, replacing any previous one.
pub async fn generate_invite_token(
    state: &Arc<DaemonState>,
    params: &Value,
) -> Result<Value, RpcError> {
    let caller = auth::require_caller(state, params).await?;
    let capsule_id = require_capsule_id(params)?;
    let token = state
        .service
        .generate_invite_token(capsule_id, caller.id)
        .await?;
    Ok(serde_json::json!({
        "invite_token": token,
        "invite_link": link::encode_invite_link(&token),
    }))
}

/// Join a capsule's collaborator set via an invite link.
pub async fn accept_invite(state: &Arc<DaemonState>, params: &Value) -> Result<Value, RpcError> {
    let caller = auth::require_caller(state, params).await?;
    let raw = params
        .get("invite_link")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("invite_link required"))?;
    let token = link::parse_invite_link(raw).map_err(|_| RpcError::invalid_token())?;

    let detail = state.service.accept_invite(&token, caller.id).await?;
    to_value(detail)
}

/// Add or remove a collaborator. Owner only; `action` is "add" or "remove".
pub async fn update_collaborators(
    state: &Arc<DaemonState>,
    params: &Value,
) -> Result<Value, RpcError> {
    let caller = auth::require_caller(state, params).await?;
    let capsule_id = require_capsule_id(params)?;
    let action = params
        .get("action")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("action required"))?;
    let target_id = params
        .get("target_id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| RpcError::invalid_params("target_id required"))?;

    let detail = state
        .service
        .update_collaborators(capsule_id, caller.id, action, target_id)
        .await?;
    to_value(detail)
}

fn require_share_link(params: &Value) -> Result<String, RpcError> {
    let raw = params
        .get("share_link")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("share_link required"))?;
    link::parse_share_link(raw).map_err(|_| RpcError::invalid_token())
}
