//! The daily unlock sweep.
//!
//! [`UnlockScheduler`] is an explicitly owned background job: the daemon
//! builds one over its own store connection, calls [`start`] at boot and
//! [`stop`] at shutdown; tests build theirs against an in-memory store. The
//! task sleeps until the next midnight in the civil timezone, runs the same
//! bulk promotion [`CapsuleService::check_and_unlock`] exposes on demand,
//! and goes back to sleep. A failed sweep is logged and dropped; the next
//! boundary is an independent attempt.
//!
//! [`start`]: UnlockScheduler::start
//! [`stop`]: UnlockScheduler::stop
//! [`CapsuleService::check_and_unlock`]: crate::CapsuleService::check_and_unlock

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Timelike};
use rusqlite::Connection;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};

use cairn_db::queries::capsules;
use cairn_types::time;

/// Seconds between sweep boundaries (one civil day).
pub const SWEEP_PERIOD_SECS: u64 = 24 * 60 * 60;

/// Seconds from `now` until the next civil-midnight boundary.
///
/// Exactly at midnight this returns a full day: the boundary that just
/// passed counts as handled.
pub fn seconds_until_next_sweep(now: DateTime<FixedOffset>) -> u64 {
    let elapsed = u64::from(now.num_seconds_from_midnight());
    SWEEP_PERIOD_SECS - (elapsed % SWEEP_PERIOD_SECS)
}

/// Promote every due capsule once. Returns the number transitioned.
async fn run_sweep(db: &Mutex<Connection>) -> cairn_db::Result<usize> {
    let conn = db.lock().await;
    capsules::mark_unlocked_due(&conn, time::today(), time::now())
}

/// Recurring promotion of capsules whose release date has arrived.
pub struct UnlockScheduler {
    db: Arc<Mutex<Connection>>,
    shutdown_tx: broadcast::Sender<()>,
    task: Option<JoinHandle<()>>,
}

impl UnlockScheduler {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            db,
            shutdown_tx,
            task: None,
        }
    }

    /// Whether the background task is currently running.
    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Spawn the sweep task. Starting an already-started scheduler is a
    /// no-op.
    pub fn start(&mut self) {
        if self.task.is_some() {
            return;
        }

        let db = self.db.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        self.task = Some(tokio::spawn(async move {
            info!("unlock scheduler started");
            loop {
                let wait = seconds_until_next_sweep(time::now());
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(wait)) => {
                        match run_sweep(&db).await {
                            Ok(count) => info!("unlock sweep promoted {count} capsule(s)"),
                            Err(e) => error!("unlock sweep failed: {e}"),
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
            info!("unlock scheduler stopped");
        }));
    }

    /// Signal the sweep task and wait for it to exit. Stopping a scheduler
    /// that never started is a no-op.
    pub async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = self.shutdown_tx.send(());
            if let Err(e) = task.await {
                error!("unlock scheduler task failed to join: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use cairn_types::CapsuleId;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).expect("ts")
    }

    async fn seed_due_capsule(db: &Mutex<Connection>) -> CapsuleId {
        let conn = db.lock().await;
        capsules::insert(
            &conn,
            &capsules::NewCapsuleRow {
                owner_id: 1,
                author_id: Some(1),
                title: "Due",
                content: "hello",
                audio_ref: None,
                release_date: time::today(),
                unlocked: false,
                collaborators: &[],
                now: time::now(),
            },
        )
        .expect("seed capsule")
    }

    async fn is_unlocked(db: &Mutex<Connection>, id: CapsuleId) -> bool {
        let conn = db.lock().await;
        capsules::get(&conn, id).expect("get").unlocked
    }

    #[test]
    fn test_seconds_until_next_sweep() {
        // at midnight the next boundary is a full day away
        assert_eq!(
            seconds_until_next_sweep(ts("2025-06-01T00:00:00+09:00")),
            SWEEP_PERIOD_SECS
        );
        assert_eq!(seconds_until_next_sweep(ts("2025-06-01T23:59:59+09:00")), 1);
        assert_eq!(
            seconds_until_next_sweep(ts("2025-06-01T12:00:00+09:00")),
            12 * 60 * 60
        );
    }

    #[test]
    fn test_seconds_until_next_sweep_bounds() {
        let secs = seconds_until_next_sweep(time::now());
        assert!(secs > 0);
        assert!(secs <= SWEEP_PERIOD_SECS);
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() {
        let db = Mutex::new(cairn_db::open_memory().expect("open"));
        let id = seed_due_capsule(&db).await;

        assert_eq!(run_sweep(&db).await.expect("sweep"), 1);
        assert!(is_unlocked(&db, id).await);
        assert_eq!(run_sweep(&db).await.expect("sweep again"), 0);
    }

    #[tokio::test]
    async fn test_start_stop_lifecycle() {
        let db = Arc::new(Mutex::new(cairn_db::open_memory().expect("open")));
        let mut scheduler = UnlockScheduler::new(db);

        assert!(!scheduler.is_running());
        scheduler.start();
        assert!(scheduler.is_running());
        // a second start changes nothing
        scheduler.start();
        assert!(scheduler.is_running());

        scheduler.stop().await;
        assert!(!scheduler.is_running());
        // stopping again is fine
        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_scheduler_sweeps_at_the_boundary() {
        let db = Arc::new(Mutex::new(cairn_db::open_memory().expect("open")));
        let id = seed_due_capsule(&db).await;

        let mut scheduler = UnlockScheduler::new(db.clone());
        scheduler.start();

        // let the task arm its timer, then jump past the boundary
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        tokio::time::advance(Duration::from_secs(SWEEP_PERIOD_SECS)).await;

        let mut unlocked = false;
        for _ in 0..100 {
            tokio::task::yield_now().await;
            if is_unlocked(&db, id).await {
                unlocked = true;
                break;
            }
        }
        assert!(unlocked, "sweep should have promoted the due capsule");

        scheduler.stop().await;
    }
}
