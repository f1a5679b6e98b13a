//! # cairn-render
//!
//! The audio side of capsule disclosure: once a capsule unlocks, its content
//! is rendered to speech exactly once and the resulting artifact URL is
//! cached on the capsule row.
//!
//! This crate owns the two external collaborators involved:
//!
//! - [`Renderer`] - text to audio bytes (HTTP implementation: [`tts::TtsClient`])
//! - [`BlobStore`] - durable artifact storage (HTTP implementation:
//!   [`blob::HttpBlobStore`])
//!
//! and [`pipeline::RenderCache`], the compute-if-absent step the read path
//! invokes. Both collaborators are traits so tests can run without a network.

pub mod blob;
pub mod pipeline;
pub mod tts;

use async_trait::async_trait;

pub use pipeline::RenderCache;

/// Error types for external render/storage calls.
#[derive(Debug, thiserror::Error)]
pub enum ExternalError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote service answered with a non-success status.
    #[error("service error: HTTP {status} - {detail}")]
    Api { status: u16, detail: String },

    /// The remote service answered 2xx with an empty body.
    #[error("empty response body")]
    Empty,
}

/// Convenience result type for external calls.
pub type Result<T> = std::result::Result<T, ExternalError>;

/// Text-to-audio renderer. One attempt per call; retry policy belongs to the
/// caller (the pipeline deliberately has none).
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, text: &str) -> Result<Vec<u8>>;
}

/// Durable blob storage keyed by artifact name.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key` and return the public URL.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String>;

    /// Remove an artifact. Returns whether it existed. Maintenance tooling
    /// only; the read path never deletes.
    async fn delete(&self, key: &str) -> Result<bool>;
}
