//! Caller identity resolution.
//!
//! Every authenticated method carries an `access_token` parameter, the
//! opaque credential minted at account creation. Resolution goes through
//! the store; past this point the daemon trusts the resolved account id.
//! A missing token and an unknown token look identical to the caller.

use std::sync::Arc;

use serde_json::Value;

use cairn_db::queries::accounts;
use cairn_db::DbError;
use cairn_types::account::Account;

use crate::rpc::RpcError;
use crate::DaemonState;

/// Resolve the caller's `access_token` parameter to an account.
pub async fn require_caller(state: &Arc<DaemonState>, params: &Value) -> Result<Account, RpcError> {
    let token = params
        .get("access_token")
        .and_then(|v| v.as_str())
        .ok_or_else(RpcError::unauthenticated)?;

    let db = state.db.lock().await;
    accounts::find_by_access_token(&db, token).map_err(|e| match e {
        DbError::NotFound(_) => RpcError::unauthenticated(),
        other => RpcError::internal_error(&format!("store error: {other}")),
    })
}
