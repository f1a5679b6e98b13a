//! Integration test crate for the Cairn capsule service.
//!
//! This crate has no library code; it only contains integration tests
//! that exercise end-to-end capsule flows across multiple workspace crates.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p cairn-integration-tests
//! ```
