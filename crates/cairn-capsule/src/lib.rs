//! # cairn-capsule
//!
//! The capsule domain: disclosure policy, ownership checks, sharing and
//! invites, and the daily unlock sweep.
//!
//! - [`CapsuleService`] - every capsule operation, over a shared store handle
//! - [`guard`] - the ownership predicate mutations and private reads go through
//! - [`UnlockScheduler`] - owned background task that promotes due capsules
//!   at each civil-midnight boundary
//!
//! The state machine is deliberately small: a capsule is locked until its
//! release date arrives and a sweep flips it, and the flip is one-way.

pub mod error;
pub mod guard;
pub mod scheduler;
pub mod service;

pub use error::{CapsuleError, Result};
pub use scheduler::UnlockScheduler;
pub use service::CapsuleService;
