//! # cairn-token
//!
//! Opaque token issuance for capsule sharing and invites, plus the
//! `cairn://share` / `cairn://invite` link helpers built on top of it.
//!
//! Tokens only need to be unguessable, not cryptographic credentials: 32
//! random bytes from the OS generator, base64url-encoded without padding.
//! Uniqueness is enforced by the store's unique indexes, not here.

pub mod link;

/// Error types for token operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The share/invite link is malformed.
    #[error("invalid link: {0}")]
    InvalidLink(String),
}

/// Convenience result type for token operations.
pub type Result<T> = std::result::Result<T, TokenError>;

/// Raw entropy per token.
pub const TOKEN_BYTES: usize = 32;

/// Generate a fresh opaque token.
pub fn generate() -> String {
    let mut secret = [0u8; TOKEN_BYTES];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut secret);
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, secret)
}
