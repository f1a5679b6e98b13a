//! Integration test: full capsule lifecycle.
//!
//! Exercises the complete create -> wait -> unlock -> disclose pipeline:
//! 1. Create accounts and a capsule sealed thirty days out
//! 2. Verify the locked capsule never discloses content, in any view
//! 3. Verify owner gating: strangers get denied, missing ids get not-found
//! 4. Let the release date pass and run the unlock sweep
//! 5. Read the unlocked capsule: content and rendered audio appear
//! 6. Verify the narration was rendered exactly once and the artifact
//!    reference is stable across reads
//!
//! Uses only the library crates (cairn-db, cairn-capsule, cairn-render,
//! cairn-types) without requiring a running daemon process.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use cairn_capsule::{CapsuleError, CapsuleService};
use cairn_db::queries::accounts;
use cairn_render::{BlobStore, RenderCache, Renderer};
use cairn_types::capsule::NewCapsule;
use cairn_types::time;

struct CountingRenderer {
    calls: AtomicUsize,
}

#[async_trait]
impl Renderer for CountingRenderer {
    async fn render(&self, text: &str) -> cairn_render::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(text.as_bytes().to_vec())
    }
}

struct StubBlobStore;

#[async_trait]
impl BlobStore for StubBlobStore {
    async fn put(&self, key: &str, _bytes: &[u8]) -> cairn_render::Result<String> {
        Ok(format!("https://blobs.test/{key}"))
    }

    async fn delete(&self, _key: &str) -> cairn_render::Result<bool> {
        Ok(true)
    }
}

#[tokio::test]
async fn capsule_lifecycle_create_to_disclosure() {
    // =========================================================
    // Step 1: Accounts and a capsule sealed thirty days out
    // =========================================================
    let db = Arc::new(Mutex::new(
        cairn_db::open_memory().expect("In-memory store should open"),
    ));
    let renderer = Arc::new(CountingRenderer {
        calls: AtomicUsize::new(0),
    });
    let render = RenderCache::new(renderer.clone(), Arc::new(StubBlobStore));
    let service = CapsuleService::new(db.clone(), render);

    let (owner_id, stranger_id) = {
        let conn = db.lock().await;
        let owner = accounts::insert(&conn, "Mira", &cairn_token::generate(), time::now())
            .expect("Owner account should insert");
        let stranger = accounts::insert(&conn, "Noah", &cairn_token::generate(), time::now())
            .expect("Stranger account should insert");
        (owner, stranger)
    };

    let release = time::today() + chrono::Days::new(30);
    let created = service
        .create(
            owner_id,
            NewCapsule {
                title: "Open when you turn thirty".to_string(),
                content: "The summer we built the treehouse.".to_string(),
                release_date: release,
                author_id: None,
                collaborators: vec![],
            },
        )
        .await
        .expect("Capsule creation should succeed");

    assert!(!created.unlocked, "A fresh capsule must start locked");
    assert_eq!(
        created.days_remaining,
        Some(30),
        "Days remaining must count down from the release date"
    );

    // =========================================================
    // Step 2: Locked means redacted, in every view
    // =========================================================
    assert_eq!(created.content, None, "Locked detail must carry no content");
    assert_eq!(created.audio_ref, None, "Locked detail must carry no audio");

    let detail = service
        .get(created.id, owner_id)
        .await
        .expect("Owner read should succeed");
    assert_eq!(
        detail.content, None,
        "Even the owner cannot read a locked capsule's content"
    );

    // The wire shape must omit the keys entirely, not null them.
    let listed = service.list(owner_id).await.expect("List should succeed");
    assert_eq!(listed.len(), 1, "Owner should see exactly one capsule");
    let as_json = serde_json::to_value(&listed).expect("Summaries should serialize");
    let entry = &as_json.as_array().expect("JSON array")[0];
    assert!(
        entry.get("content").is_none(),
        "Summary JSON must have no content key"
    );
    assert!(
        entry.get("audio_ref").is_none(),
        "Summary JSON must have no audio_ref key"
    );
    assert!(
        entry.get("days_remaining").is_some(),
        "Locked summary JSON must carry days_remaining"
    );

    // =========================================================
    // Step 3: Owner gating distinguishes denied from missing
    // =========================================================
    let err = service
        .get(created.id, stranger_id)
        .await
        .expect_err("Stranger read must fail");
    assert!(
        matches!(err, CapsuleError::Forbidden),
        "Existing capsule, wrong owner: access denied"
    );

    let err = service
        .get(created.id + 999, owner_id)
        .await
        .expect_err("Missing capsule read must fail");
    assert!(
        matches!(err, CapsuleError::NotFound(_)),
        "Missing capsule: not found, never access denied"
    );

    // =========================================================
    // Step 4: The release date passes; the sweep promotes
    // =========================================================
    let yesterday = time::today().pred_opt().expect("yesterday exists");
    {
        let conn = db.lock().await;
        conn.execute(
            "UPDATE capsules SET release_date = ?1 WHERE id = ?2",
            rusqlite::params![yesterday.to_string(), created.id],
        )
        .expect("Release date rewrite should succeed");
    }

    let unlocked_count = service
        .check_and_unlock()
        .await
        .expect("Unlock sweep should succeed");
    assert_eq!(unlocked_count, 1, "Exactly one capsule was due");

    let again = service
        .check_and_unlock()
        .await
        .expect("Second sweep should succeed");
    assert_eq!(again, 0, "The sweep must be idempotent");

    // =========================================================
    // Step 5: Disclosure after unlock
    // =========================================================
    let detail = service
        .get(created.id, owner_id)
        .await
        .expect("Post-unlock read should succeed");
    assert!(detail.unlocked, "Capsule must be unlocked after the sweep");
    assert_eq!(
        detail.days_remaining, None,
        "Unlocked capsules carry no countdown"
    );
    assert_eq!(
        detail.content.as_deref(),
        Some("The summer we built the treehouse."),
        "Unlocked detail must disclose the content"
    );
    let audio = detail.audio_ref.expect("Unlocked read should have audio");
    assert!(
        audio.starts_with("https://blobs.test/capsule_"),
        "Audio URL must point at the stored artifact"
    );
    assert!(audio.ends_with(".mp3"), "Artifacts are mp3 files");

    // =========================================================
    // Step 6: Render-once; the reference never changes
    // =========================================================
    let second = service
        .get(created.id, owner_id)
        .await
        .expect("Repeat read should succeed");
    assert_eq!(
        second.audio_ref.as_deref(),
        Some(audio.as_str()),
        "Audio reference must be stable across reads"
    );
    assert_eq!(
        renderer.calls.load(Ordering::SeqCst),
        1,
        "Narration must be rendered exactly once"
    );

    // Strangers stay locked out even after unlock.
    let err = service
        .get(created.id, stranger_id)
        .await
        .expect_err("Stranger read must still fail");
    assert!(
        matches!(err, CapsuleError::Forbidden),
        "Unlocking is disclosure to the owner, not to everyone"
    );
}

#[tokio::test]
async fn unlock_sweep_promotes_only_due_capsules() {
    let db = Arc::new(Mutex::new(
        cairn_db::open_memory().expect("In-memory store should open"),
    ));
    let render = RenderCache::new(
        Arc::new(CountingRenderer {
            calls: AtomicUsize::new(0),
        }),
        Arc::new(StubBlobStore),
    );
    let service = CapsuleService::new(db.clone(), render);

    let owner_id = {
        let conn = db.lock().await;
        accounts::insert(&conn, "Mira", &cairn_token::generate(), time::now())
            .expect("Account should insert")
    };

    // One capsule due yesterday, one due today, one due far out.
    let today = time::today();
    let yesterday = today.pred_opt().expect("yesterday exists");
    let far_out = today + chrono::Days::new(365);
    {
        let conn = db.lock().await;
        for (title, date) in [
            ("Due yesterday", yesterday),
            ("Due today", today),
            ("Not due", far_out),
        ] {
            cairn_db::queries::capsules::insert(
                &conn,
                &cairn_db::queries::capsules::NewCapsuleRow {
                    owner_id,
                    author_id: Some(owner_id),
                    title,
                    content: "body",
                    audio_ref: None,
                    release_date: date,
                    unlocked: false,
                    collaborators: &[],
                    now: time::now(),
                },
            )
            .expect("Seed capsule should insert");
        }
    }

    let unlocked_count = service
        .check_and_unlock()
        .await
        .expect("Sweep should succeed");
    assert_eq!(
        unlocked_count, 2,
        "Capsules due today or earlier must unlock; future ones must not"
    );

    let summaries = service.list(owner_id).await.expect("List should succeed");
    for summary in &summaries {
        let expected = summary.title != "Not due";
        assert_eq!(
            summary.unlocked, expected,
            "Unlock state wrong for {:?}",
            summary.title
        );
    }
}
