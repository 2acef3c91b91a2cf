//! Revision store and tree differ backed by git2.
//!
//! Resolves branches, tags, and commits of a local clone to immutable
//! snapshots, keeps local branches in step with their remote, reads file
//! content at a snapshot, and computes whitespace-insensitive, rename-aware
//! file diffs between two snapshots.

pub mod differ;
pub mod store;

pub use differ::TreeDiffer;
pub use store::{Credentials, RevisionStore, Snapshot, StoreOptions, SyncOutcome};
