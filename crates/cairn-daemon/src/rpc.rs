//! JSON-RPC server over a Unix domain socket.
//!
//! Listens on `daemon.sock` in the data directory, accepts connections, and
//! dispatches line-delimited JSON-RPC 2.0 calls to the command handlers.
//! Domain failures arrive as [`cairn_capsule::CapsuleError`] and are mapped
//! to coded errors here; handlers never build error strings for clients to
//! parse.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};

use cairn_capsule::CapsuleError;

use crate::commands;
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    /// Error code.
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: -32700,
            message: "PARSE_ERROR".to_string(),
            data: None,
        }
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self {
            code: -32600,
            message: "INVALID_REQUEST".to_string(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"method": method})),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self {
            code: -32602,
            message: "INVALID_PARAMS".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self {
            code: -32603,
            message: "INTERNAL_ERROR".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    // Domain errors

    /// Missing or unknown access token (-32010).
    pub fn unauthenticated() -> Self {
        Self {
            code: -32010,
            message: "UNAUTHENTICATED".to_string(),
            data: None,
        }
    }

    /// Referenced record does not exist (-32020).
    pub fn capsule_not_found(what: &str) -> Self {
        Self {
            code: -32020,
            message: "CAPSULE_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"what": what})),
        }
    }

    /// Record exists but the caller does not own it (-32021).
    pub fn access_denied() -> Self {
        Self {
            code: -32021,
            message: "ACCESS_DENIED".to_string(),
            data: None,
        }
    }

    /// Release date is not strictly in the future (-32022).
    pub fn invalid_release_date(detail: &str) -> Self {
        Self {
            code: -32022,
            message: "INVALID_RELEASE_DATE".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Share or invite token does not resolve (-32023).
    pub fn invalid_token() -> Self {
        Self {
            code: -32023,
            message: "INVALID_TOKEN".to_string(),
            data: None,
        }
    }

    /// Capsule is still locked; disclosure refused (-32024).
    pub fn not_unlocked() -> Self {
        Self {
            code: -32024,
            message: "NOT_UNLOCKED".to_string(),
            data: None,
        }
    }
}

impl From<CapsuleError> for RpcError {
    fn from(e: CapsuleError) -> Self {
        match e {
            CapsuleError::NotFound(what) => Self::capsule_not_found(&what),
            CapsuleError::Forbidden => Self::access_denied(),
            CapsuleError::InvalidDate(detail) => Self::invalid_release_date(&detail),
            CapsuleError::InvalidArgument(detail) => Self::invalid_params(&detail),
            CapsuleError::InvalidToken => Self::invalid_token(),
            CapsuleError::NotUnlocked => Self::not_unlocked(),
            CapsuleError::Store(e) => Self::internal_error(&format!("store error: {e}")),
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }

        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) => dispatch_request(state.clone(), request).await,
            Err(_) => RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
        };

        let mut response_json = serde_json::to_string(&response)?;
        response_json.push('\n');
        writer.write_all(response_json.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    let method = request.method.as_str();

    debug!("Dispatching RPC method: {}", method);

    if request.jsonrpc != "2.0" {
        return RpcResponse::error(id, RpcError::invalid_request());
    }

    let result = match method {
        // Account boundary
        "create_account" => commands::accounts::create_account(&state, &request.params).await,
        "delete_account" => commands::accounts::delete_account(&state, &request.params).await,

        // Capsules
        "create_capsule" => commands::capsules::create_capsule(&state, &request.params).await,
        "list_capsules" => commands::capsules::list_capsules(&state, &request.params).await,
        "get_capsule" => commands::capsules::get_capsule(&state, &request.params).await,
        "run_unlock_check" => commands::capsules::run_unlock_check(&state, &request.params).await,

        // Sharing and collaboration
        "generate_share_token" => {
            commands::sharing::generate_share_token(&state, &request.params).await
        }
        "view_shared_capsule" => {
            commands::sharing::view_shared_capsule(&state, &request.params).await
        }
        "copy_shared_capsule" => {
            commands::sharing::copy_shared_capsule(&state, &request.params).await
        }
        "generate_invite_token" => {
            commands::sharing::generate_invite_token(&state, &request.params).await
        }
        "accept_invite" => commands::sharing::accept_invite(&state, &request.params).await,
        "update_collaborators" => {
            commands::sharing::update_collaborators(&state, &request.params).await
        }

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}
