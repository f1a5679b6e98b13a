//! Integration test: share token lifecycle.
//!
//! Exercises the read-only sharing surface end to end:
//! 1. An author seals a capsule, it unlocks, a share token is issued
//! 2. The token resolves to a read-only view with the author's name
//! 3. A second account copies the capsule into its own collection
//! 4. Rotation: a fresh token kills the old link but not prior copies
//! 5. Locked capsules refuse both viewing and copying
//! 6. Unknown tokens are indistinguishable from revoked ones

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use cairn_capsule::{CapsuleError, CapsuleService};
use cairn_db::queries::{accounts, capsules};
use cairn_render::{BlobStore, RenderCache, Renderer};
use cairn_types::capsule::NewCapsule;
use cairn_types::time;

struct StubRenderer;

#[async_trait]
impl Renderer for StubRenderer {
    async fn render(&self, text: &str) -> cairn_render::Result<Vec<u8>> {
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

fn build_service(db: &Arc<Mutex<rusqlite::Connection>>) -> CapsuleService {
    let render = RenderCache::new(Arc::new(StubRenderer), Arc::new(StubBlobStore));
    CapsuleService::new(db.clone(), render)
}

async fn make_account(db: &Mutex<rusqlite::Connection>, name: &str) -> i64 {
    let conn = db.lock().await;
    accounts::insert(&conn, name, &cairn_token::generate(), time::now())
        .expect("Account should insert")
}

/// Create a capsule through the service, then let its release date pass and
/// run the sweep so it is genuinely unlocked rather than staged that way.
async fn create_unlocked(service: &CapsuleService, db: &Mutex<rusqlite::Connection>, owner: i64) -> i64 {
    let created = service
        .create(
            owner,
            NewCapsule {
                title: "Letters from the coast".to_string(),
                content: "We watched the tide come in.".to_string(),
                release_date: time::today() + chrono::Days::new(7),
                author_id: None,
                collaborators: vec![],
            },
        )
        .await
        .expect("Capsule creation should succeed");

    let yesterday = time::today().pred_opt().expect("yesterday exists");
    {
        let conn = db.lock().await;
        conn.execute(
            "UPDATE capsules SET release_date = ?1 WHERE id = ?2",
            rusqlite::params![yesterday.to_string(), created.id],
        )
        .expect("Release date rewrite should succeed");
    }
    let promoted = service.check_and_unlock().await.expect("Sweep should run");
    assert_eq!(promoted, 1, "The staged capsule must unlock");
    created.id
}

#[tokio::test]
async fn share_token_view_copy_and_rotation() {
    let db = Arc::new(Mutex::new(
        cairn_db::open_memory().expect("In-memory store should open"),
    ));
    let service = build_service(&db);

    // =========================================================
    // Step 1: Author, reader, and an unlocked capsule
    // =========================================================
    let author_id = make_account(&db, "Mira").await;
    let reader_id = make_account(&db, "Noah").await;
    let capsule_id = create_unlocked(&service, &db, author_id).await;

    let token = service
        .generate_share_token(capsule_id, author_id)
        .await
        .expect("Share token issue should succeed");

    // Only the owner may issue tokens.
    let err = service
        .generate_share_token(capsule_id, reader_id)
        .await
        .expect_err("Non-owner token issue must fail");
    assert!(matches!(err, CapsuleError::Forbidden));

    // =========================================================
    // Step 2: The token resolves to a named, read-only view
    // =========================================================
    let view = service
        .view_by_share_token(&token)
        .await
        .expect("Share view should resolve");
    assert_eq!(
        view.author_name.as_deref(),
        Some("Mira"),
        "View must carry the author's display name"
    );
    assert!(view.capsule.unlocked, "Shared view is of an unlocked capsule");
    assert_eq!(
        view.capsule.content.as_deref(),
        Some("We watched the tide come in."),
        "Shared view must disclose the content"
    );

    // =========================================================
    // Step 3: Copying into the reader's collection
    // =========================================================
    let copy = service
        .copy_shared_capsule(&token, reader_id)
        .await
        .expect("Copy should succeed");
    assert_eq!(copy.owner_id, reader_id, "The copy belongs to the reader");
    assert_eq!(
        copy.title, "[Shared] Letters from the coast",
        "Copies are marked in the title"
    );
    assert_eq!(
        copy.author_id,
        Some(author_id),
        "Authorship survives the copy"
    );
    assert!(copy.unlocked, "Copies of unlocked capsules are born unlocked");

    // The copy is a fresh record with no tokens of its own.
    {
        let conn = db.lock().await;
        let row = capsules::get(&conn, copy.id).expect("Copy row should exist");
        assert_eq!(row.share_token, None, "Copies start without a share token");
        assert_eq!(row.invite_token, None, "Copies start without an invite token");
    }

    // =========================================================
    // Step 4: Rotation kills the old link, not prior copies
    // =========================================================
    let fresh = service
        .generate_share_token(capsule_id, author_id)
        .await
        .expect("Second token issue should succeed");
    assert_ne!(fresh, token, "Rotation must mint a different token");

    let err = service
        .view_by_share_token(&token)
        .await
        .expect_err("Old token must be dead");
    assert!(matches!(err, CapsuleError::InvalidToken));

    service
        .view_by_share_token(&fresh)
        .await
        .expect("Fresh token must resolve");

    let copy_after = service
        .get(copy.id, reader_id)
        .await
        .expect("The copy must survive rotation");
    assert_eq!(copy_after.title, "[Shared] Letters from the coast");

    // =========================================================
    // Step 5: Locked capsules refuse the sharing surface
    // =========================================================
    let sealed = service
        .create(
            author_id,
            NewCapsule {
                title: "Still sealed".to_string(),
                content: "not yet".to_string(),
                release_date: time::today() + chrono::Days::new(30),
                author_id: None,
                collaborators: vec![],
            },
        )
        .await
        .expect("Second capsule should create");

    let sealed_token = service
        .generate_share_token(sealed.id, author_id)
        .await
        .expect("Tokens may be issued while locked");

    let err = service
        .view_by_share_token(&sealed_token)
        .await
        .expect_err("Viewing a locked capsule must fail");
    assert!(
        matches!(err, CapsuleError::NotUnlocked),
        "Locked shares refuse with NotUnlocked, not InvalidToken"
    );

    let err = service
        .copy_shared_capsule(&sealed_token, reader_id)
        .await
        .expect_err("Copying a locked capsule must fail");
    assert!(matches!(err, CapsuleError::NotUnlocked));

    // =========================================================
    // Step 6: Unknown tokens look exactly like revoked ones
    // =========================================================
    let err = service
        .view_by_share_token(&cairn_token::generate())
        .await
        .expect_err("A never-issued token must fail");
    assert!(matches!(err, CapsuleError::InvalidToken));
}

#[tokio::test]
async fn copied_audio_reference_is_reused_not_rerendered() {
    let db = Arc::new(Mutex::new(
        cairn_db::open_memory().expect("In-memory store should open"),
    ));
    let service = build_service(&db);

    let author_id = make_account(&db, "Mira").await;
    let reader_id = make_account(&db, "Noah").await;
    let capsule_id = create_unlocked(&service, &db, author_id).await;

    // Owner read renders and caches the narration.
    let detail = service
        .get(capsule_id, author_id)
        .await
        .expect("Owner read should succeed");
    let audio = detail.audio_ref.expect("Owner read should cache audio");

    let token = service
        .generate_share_token(capsule_id, author_id)
        .await
        .expect("Share token issue should succeed");
    let copy = service
        .copy_shared_capsule(&token, reader_id)
        .await
        .expect("Copy should succeed");

    assert_eq!(
        copy.audio_ref.as_deref(),
        Some(audio.as_str()),
        "The copy must reuse the already-rendered artifact"
    );
}
