//! Account boundary command handlers.
//!
//! Registration proper (email, verification, password recovery) lives
//! outside the daemon. These two calls are the minimal boundary it exposes:
//! mint an account with its access credential, and remove an account
//! together with every capsule it owns.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use cairn_db::queries::accounts;
use cairn_db::DbError;
use cairn_types::time;

use crate::auth;
use crate::rpc::RpcError;
use crate::DaemonState;

/// Create an account and mint its access credential. The token is returned
/// exactly once; the daemon stores it only for lookup.
pub async fn create_account(
    state: &Arc<DaemonState>,
    params: &Value,
) -> Result<Value, RpcError> {
    let display_name = params
        .get("display_name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("display_name required"))?;
    if display_name.trim().is_empty() {
        return Err(RpcError::invalid_params("display_name must not be empty"));
    }

    let access_token = cairn_token::generate();
    let account_id = {
        let db = state.db.lock().await;
        accounts::insert(&db, display_name, &access_token, time::now())
            .map_err(|e| RpcError::internal_error(&format!("store error: {e}")))?
    };

    info!("Created account {}", account_id);

    Ok(serde_json::json!({
        "account_id": account_id,
        "access_token": access_token,
    }))
}

/// Delete the calling account and every capsule it owns.
pub async fn delete_account(
    state: &Arc<DaemonState>,
    params: &Value,
) -> Result<Value, RpcError> {
    let caller = auth::require_caller(state, params).await?;

    // Capsules go first. If the cascade stops partway the account row
    // survives and the call can be retried; the reverse order would leave
    // orphaned capsules behind a dead account.
    let deleted_capsules = state
        .service
        .delete_owned(caller.id)
        .await
        .map_err(RpcError::from)?;

    {
        let db = state.db.lock().await;
        accounts::delete(&db, caller.id).map_err(|e| match e {
            DbError::NotFound(_) => RpcError::unauthenticated(),
            other => RpcError::internal_error(&format!("store error: {other}")),
        })?;
    }

    info!(
        "Deleted account {} and {} capsule(s)",
        caller.id, deleted_capsules
    );

    Ok(serde_json::json!({
        "account_deleted": true,
        "deleted_capsules": deleted_capsules,
    }))
}
