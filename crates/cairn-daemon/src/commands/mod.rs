//! JSON-RPC command handlers.
//!
//! Handlers are thin: extract parameters, resolve the caller, call the
//! capsule service, serialize the result. Domain rules live in
//! `cairn-capsule`; nothing here inspects capsule state directly.

pub mod accounts;
pub mod capsules;
pub mod sharing;
