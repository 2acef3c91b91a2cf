//! Change classification for deltacov.
//!
//! Turns a file-level diff between two revisions into a [`ChangeSet`] of
//! classes and methods that need coverage:
//! - [`filter`]: drop deleted, non-source and test-source paths
//! - [`classifier`]: compare old and new methods of one file
//! - [`batch`]: classify many files on a worker pool
//! - [`exclusion`]: prune classes by package or name pattern
//! - [`pipeline`]: the end-to-end run against a repository
//! - [`report`]: the run's result and its text and Markdown renderings
//! - [`scope`]: lookups for a coverage engine consuming the result
//!
//! [`ChangeSet`]: deltacov_core::ChangeSet

pub mod batch;
pub mod classifier;
pub mod exclusion;
pub mod filter;
pub mod pipeline;
pub mod report;
pub mod scope;
