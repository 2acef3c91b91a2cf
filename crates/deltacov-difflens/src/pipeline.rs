//! End-to-end diff run: sync, resolve, diff, filter, read, classify, exclude.
//!
//! Everything that touches the repository runs on the calling thread.
//! Only owned file contents are handed to the classification pool.

use std::collections::BTreeSet;

use deltacov_core::{ChangeKind, ChangeSet, DeltacovConfig, DeltacovError, FileDiffEntry, RevisionRef};
use deltacov_gitstore::{RevisionStore, Snapshot, SyncOutcome, TreeDiffer};

use crate::batch::classify_batch;
use crate::classifier::MaterializedEntry;
use crate::exclusion::ExclusionFilter;
use crate::filter::PathFilter;

pub use crate::report::DiffReport;

/// The two revisions to compare.
///
/// # Examples
///
/// ```
/// use deltacov_core::RevisionRef;
/// use deltacov_difflens::pipeline::DiffRequest;
///
/// let request = DiffRequest::new(
///     RevisionRef::Tag("v1.0".into()),
///     RevisionRef::Tag("v1.1".into()),
/// )
/// .with_refresh_branch("develop");
/// assert_eq!(request.refresh_branch.as_deref(), Some("develop"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRequest {
    pub old: RevisionRef,
    pub new: RevisionRef,
    /// Branch to sync before resolving, so fresh tags and commits are visible.
    pub refresh_branch: Option<String>,
}

impl DiffRequest {
    pub fn new(old: RevisionRef, new: RevisionRef) -> Self {
        Self {
            old,
            new,
            refresh_branch: None,
        }
    }

    pub fn with_refresh_branch(mut self, branch: impl Into<String>) -> Self {
        self.refresh_branch = Some(branch.into());
        self
    }

    /// Branches to sync, in order, without duplicates.
    fn branches_to_sync(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        let candidates = [
            self.refresh_branch.as_deref(),
            branch_name(&self.old),
            branch_name(&self.new),
        ];
        candidates
            .into_iter()
            .flatten()
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

fn branch_name(revision: &RevisionRef) -> Option<&str> {
    match revision {
        RevisionRef::Branch(name) => Some(name),
        RevisionRef::Tag(_) | RevisionRef::Commit(_) => None,
    }
}

/// Tunables for one run.
#[derive(Debug, Clone)]
pub struct DiffOptions {
    pub chunk_size: usize,
    pub source_extension: String,
    pub test_dirs: Vec<String>,
    pub rename_threshold: u16,
    pub exclude_packages: Vec<String>,
    pub exclude_classes: Vec<String>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self::from_config(&DeltacovConfig::default())
    }
}

impl DiffOptions {
    /// Take diff settings and exclusion patterns from configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use deltacov_core::DeltacovConfig;
    /// use deltacov_difflens::pipeline::DiffOptions;
    ///
    /// let options = DiffOptions::from_config(&DeltacovConfig::default());
    /// assert_eq!(options.chunk_size, 100);
    /// assert!(options.exclude_packages.is_empty());
    /// ```
    pub fn from_config(config: &DeltacovConfig) -> Self {
        Self {
            chunk_size: config.diff.chunk_size,
            source_extension: config.diff.source_extension.clone(),
            test_dirs: config.diff.test_dirs.clone(),
            rename_threshold: config.diff.rename_threshold,
            exclude_packages: config.exclude.packages.clone(),
            exclude_classes: config.exclude.classes.clone(),
        }
    }
}

/// Compute the change-set between the two revisions of `request`.
///
/// Invalid exclusion or test-directory patterns are reported before the
/// repository is touched.
///
/// # Errors
///
/// - [`DeltacovError::PatternCompile`] or [`DeltacovError::Config`] for bad
///   patterns or a zero chunk size.
/// - [`DeltacovError::SyncFailure`] if a branch cannot be synchronized.
/// - [`DeltacovError::RevisionNotFound`] if a revision does not resolve.
/// - [`DeltacovError::PathNotFound`] or [`DeltacovError::Git`] if the diff
///   refers to content the repository cannot produce.
///
/// Files that fail to parse are not errors; they end up in
/// [`DiffReport::diagnostics`].
pub fn run_diff(
    store: &mut RevisionStore,
    request: &DiffRequest,
    options: &DiffOptions,
) -> Result<DiffReport, DeltacovError> {
    let exclusion = ExclusionFilter::new(&options.exclude_packages, &options.exclude_classes)?;
    let path_filter = PathFilter::new(&options.source_extension, &options.test_dirs)?;
    if options.chunk_size == 0 {
        return Err(DeltacovError::Config("chunk size must be at least 1".into()));
    }

    for branch in request.branches_to_sync() {
        let outcome = store.sync_local_branch(branch)?;
        match outcome {
            SyncOutcome::Skipped | SyncOutcome::UpToDate => {
                tracing::debug!(branch, ?outcome, "branch sync")
            }
            _ => tracing::info!(branch, ?outcome, "branch sync"),
        }
    }

    let old = store.resolve(&request.old)?;
    let new = store.resolve(&request.new)?;
    tracing::info!(%old, %new, "comparing revisions");

    let entries = TreeDiffer::new(options.rename_threshold).diff(store, &old, &new)?;
    let filtered = path_filter.filter(entries);
    tracing::info!(
        kept = filtered.kept.len(),
        skipped = filtered.skipped.len(),
        "filtered changed paths"
    );

    let materialized = materialize(store, &old, &new, filtered.kept)?;
    let output = classify_batch(&materialized, options.chunk_size)?;

    let classified = output.classes.len();
    let change_set = exclusion.filter(ChangeSet::new(output.classes));
    tracing::info!(
        classes = change_set.len(),
        excluded = classified - change_set.len(),
        methods = change_set.method_count(),
        diagnostics = output.diagnostics.len(),
        "change-set ready"
    );

    let mut skipped = filtered.skipped;
    skipped.extend(output.dropped);

    Ok(DiffReport {
        old,
        new,
        change_set,
        diagnostics: output.diagnostics,
        skipped,
    })
}

fn materialize(
    store: &RevisionStore,
    old: &Snapshot,
    new: &Snapshot,
    entries: Vec<FileDiffEntry>,
) -> Result<Vec<MaterializedEntry>, DeltacovError> {
    let mut materialized = Vec::with_capacity(entries.len());
    for entry in entries {
        let (old_text, new_text) = match entry.kind {
            ChangeKind::Delete => (None, Vec::new()),
            ChangeKind::Add => (None, store.read_file(new, &entry.new_path)?),
            ChangeKind::Modify | ChangeKind::Rename => (
                Some(store.read_file(old, &entry.old_path)?),
                store.read_file(new, &entry.new_path)?,
            ),
        };
        materialized.push(MaterializedEntry {
            entry,
            old_text,
            new_text,
        });
    }
    Ok(materialized)
}
