//! Compute-if-absent audio caching.
//!
//! The disclosed read path calls [`RenderCache::ensure_audio`]. It renders,
//! uploads, then persists the artifact URL with a conditional write, so under
//! concurrent first reads the render may run more than once but at most one
//! reference is ever stored. Every failure is logged and absorbed: a read
//! never fails because audio could not be produced, and an empty cache is
//! retried on the next read.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use rusqlite::Connection;
use tokio::sync::Mutex;

use cairn_types::{capsule::Capsule, time, AccountId, CapsuleId};

use crate::{BlobStore, Renderer};

/// Artifact key for a capsule rendering.
///
/// The sub-second suffix keeps keys distinct when a failed attempt is retried
/// or two renders race; stale uploads are simply never referenced.
pub fn artifact_key(owner_id: AccountId, capsule_id: CapsuleId, at: DateTime<FixedOffset>) -> String {
    format!(
        "capsule_{owner_id}_{capsule_id}_{}.{:03}.mp3",
        at.timestamp(),
        at.timestamp_subsec_millis()
    )
}

/// The render collaborators bundled for the read path.
#[derive(Clone)]
pub struct RenderCache {
    renderer: Arc<dyn Renderer>,
    blobs: Arc<dyn BlobStore>,
}

impl RenderCache {
    pub fn new(renderer: Arc<dyn Renderer>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { renderer, blobs }
    }

    /// Return the capsule's audio URL, producing and caching it if absent.
    ///
    /// `None` means no audio is available this read; the capsule row is left
    /// unreferenced so a later read attempts again. The store lock is never
    /// held across the external calls.
    pub async fn ensure_audio(&self, db: &Mutex<Connection>, capsule: &Capsule) -> Option<String> {
        if !capsule.unlocked || capsule.content.is_empty() {
            return None;
        }
        if capsule.audio_ref.is_some() {
            return capsule.audio_ref.clone();
        }

        let bytes = match self.renderer.render(&capsule.content).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("audio render failed for capsule {}: {e}", capsule.id);
                return None;
            }
        };

        let key = artifact_key(capsule.owner_id, capsule.id, time::now());
        let url = match self.blobs.put(&key, &bytes).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("audio upload failed for capsule {}: {e}", capsule.id);
                return None;
            }
        };

        let persisted = {
            let conn = db.lock().await;
            cairn_db::queries::capsules::set_audio_ref_if_absent(&conn, capsule.id, &url, time::now())
        };

        match persisted {
            Ok(true) => Some(url),
            Ok(false) => {
                // Lost the race; serve whichever reference landed first.
                let conn = db.lock().await;
                match cairn_db::queries::capsules::get(&conn, capsule.id) {
                    Ok(current) => current.audio_ref,
                    Err(e) => {
                        tracing::warn!("audio re-read failed for capsule {}: {e}", capsule.id);
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!("audio reference persist failed for capsule {}: {e}", capsule.id);
                None
            }
        }
    }
}
