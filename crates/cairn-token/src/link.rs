//! Share and invite link encoding (`cairn://share`, `cairn://invite` URLs).
//!
//! A link is just the token behind a scheme prefix. Parsing checks the prefix
//! and that the payload decodes to a full-entropy token, so truncated or
//! hand-edited links are rejected before they ever reach the store.

use crate::{Result, TokenError, TOKEN_BYTES};

/// The URI scheme for read-only share links.
const SHARE_SCHEME: &str = "cairn://share/";

/// The URI scheme for collaboration invite links.
const INVITE_SCHEME: &str = "cairn://invite/";

/// Encode a share token as a `cairn://share/<token>` URI.
pub fn encode_share_link(token: &str) -> String {
    format!("{SHARE_SCHEME}{token}")
}

/// Parse a `cairn://share/<token>` URI back into its token.
pub fn parse_share_link(uri: &str) -> Result<String> {
    parse(uri, SHARE_SCHEME, "cairn://share/")
}

/// Encode an invite token as a `cairn://invite/<token>` URI.
pub fn encode_invite_link(token: &str) -> String {
    format!("{INVITE_SCHEME}{token}")
}

/// Parse a `cairn://invite/<token>` URI back into its token.
pub fn parse_invite_link(uri: &str) -> Result<String> {
    parse(uri, INVITE_SCHEME, "cairn://invite/")
}

fn parse(uri: &str, scheme: &str, label: &str) -> Result<String> {
    let payload = uri
        .strip_prefix(scheme)
        .ok_or_else(|| TokenError::InvalidLink(format!("missing {label} prefix")))?;

    let bytes = base64::Engine::decode(
        &base64::engine::general_purpose::URL_SAFE_NO_PAD,
        payload,
    )
    .map_err(|e| TokenError::InvalidLink(format!("base64 decode error: {e}")))?;

    if bytes.len() != TOKEN_BYTES {
        return Err(TokenError::InvalidLink(format!(
            "token must be {TOKEN_BYTES} bytes"
        )));
    }

    Ok(payload.to_string())
}
