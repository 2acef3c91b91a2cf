//! File-level diff between two snapshots.

use std::path::Path;

use deltacov_core::{ChangeKind, DeltacovError, FileDiffEntry, LineEdit, LineRange};
use git2::{Delta, Diff, DiffFindOptions, DiffOptions, Patch};

use crate::store::{RevisionStore, Snapshot};

/// Computes whitespace-insensitive, rename-aware file diffs.
///
/// # Examples
///
/// ```
/// use deltacov_gitstore::TreeDiffer;
///
/// let differ = TreeDiffer::new(60);
/// assert_eq!(differ.rename_threshold(), 60);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TreeDiffer {
    rename_threshold: u16,
}

impl Default for TreeDiffer {
    fn default() -> Self {
        Self {
            rename_threshold: 50,
        }
    }
}

impl TreeDiffer {
    /// Create a differ with the given rename similarity threshold (0-100).
    pub fn new(rename_threshold: u16) -> Self {
        Self {
            rename_threshold: rename_threshold.min(100),
        }
    }

    pub fn rename_threshold(&self) -> u16 {
        self.rename_threshold
    }

    /// Diff the trees of `old` and `new`.
    ///
    /// Lines whose only difference is whitespace do not count as changed,
    /// and modified or renamed files left with no edits after that are
    /// dropped. Each edit is one zero-context hunk. Binary files are
    /// skipped. Entries come back in libgit2's path order.
    ///
    /// # Errors
    ///
    /// Returns [`DeltacovError::Git`] if either tree cannot be loaded or the
    /// diff cannot be computed.
    pub fn diff(
        &self,
        store: &RevisionStore,
        old: &Snapshot,
        new: &Snapshot,
    ) -> Result<Vec<FileDiffEntry>, DeltacovError> {
        let repo = store.repository();
        let old_tree = repo
            .find_tree(old.tree)
            .map_err(|e| DeltacovError::Git(format!("failed to load tree for {old}: {e}")))?;
        let new_tree = repo
            .find_tree(new.tree)
            .map_err(|e| DeltacovError::Git(format!("failed to load tree for {new}: {e}")))?;

        let mut diff_opts = DiffOptions::new();
        diff_opts
            .ignore_whitespace(true)
            .ignore_filemode(true)
            .context_lines(0);
        let mut diff = repo
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), Some(&mut diff_opts))
            .map_err(|e| DeltacovError::Git(format!("failed to compute diff: {e}")))?;

        // Enable rename detection
        let mut find_opts = DiffFindOptions::new();
        find_opts
            .renames(true)
            .rename_threshold(self.rename_threshold)
            .ignore_whitespace(true);
        diff.find_similar(Some(&mut find_opts))
            .map_err(|e| DeltacovError::Git(format!("failed to find renames: {e}")))?;

        let mut entries = Vec::new();
        for (idx, delta) in diff.deltas().enumerate() {
            let kind = match delta.status() {
                Delta::Added | Delta::Copied => ChangeKind::Add,
                Delta::Deleted => ChangeKind::Delete,
                Delta::Modified => ChangeKind::Modify,
                Delta::Renamed => ChangeKind::Rename,
                _ => continue,
            };

            let new_path = path_string(delta.new_file().path());
            let old_path = path_string(delta.old_file().path());
            let (old_path, new_path) = match (old_path, new_path) {
                (Some(old), Some(new)) => (old, new),
                (Some(only), None) | (None, Some(only)) => (only.clone(), only),
                (None, None) => continue,
            };

            if delta.flags().is_binary() {
                tracing::debug!(path = %new_path, "skipping binary file");
                continue;
            }

            let edits = match kind {
                ChangeKind::Modify | ChangeKind::Rename => collect_edits(&diff, idx)?,
                ChangeKind::Add | ChangeKind::Delete => Vec::new(),
            };
            if matches!(kind, ChangeKind::Modify | ChangeKind::Rename) && edits.is_empty() {
                tracing::debug!(path = %new_path, "no edits after whitespace suppression");
                continue;
            }

            entries.push(FileDiffEntry {
                old_path,
                new_path,
                kind,
                edits,
            });
        }

        tracing::debug!(files = entries.len(), %old, %new, "computed tree diff");
        Ok(entries)
    }
}

fn path_string(path: Option<&Path>) -> Option<String> {
    path.map(|p| p.to_string_lossy().replace('\\', "/"))
        .filter(|p| !p.is_empty())
}

fn collect_edits(diff: &Diff<'_>, idx: usize) -> Result<Vec<LineEdit>, DeltacovError> {
    let patch = Patch::from_diff(diff, idx)
        .map_err(|e| DeltacovError::Git(format!("failed to build patch: {e}")))?;
    let Some(patch) = patch else {
        return Ok(Vec::new());
    };

    let mut edits = Vec::with_capacity(patch.num_hunks());
    for hunk_idx in 0..patch.num_hunks() {
        let (hunk, _) = patch
            .hunk(hunk_idx)
            .map_err(|e| DeltacovError::Git(format!("failed to read hunk: {e}")))?;
        let edit = LineEdit {
            deleted: LineRange::from_start_len(hunk.old_start(), hunk.old_lines()),
            added: LineRange::from_start_len(hunk.new_start(), hunk.new_lines()),
        };
        if edit.deleted.is_some() || edit.added.is_some() {
            edits.push(edit);
        }
    }
    Ok(edits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_clamped() {
        assert_eq!(TreeDiffer::new(250).rename_threshold(), 100);
        assert_eq!(TreeDiffer::default().rename_threshold(), 50);
    }

    #[test]
    fn path_string_normalizes_separators() {
        assert_eq!(
            path_string(Some(Path::new("src\\main\\A.java"))).as_deref(),
            Some("src/main/A.java")
        );
        assert_eq!(path_string(Some(Path::new(""))), None);
        assert_eq!(path_string(None), None);
    }
}
