//! Path filtering ahead of classification.
//!
//! Drops deleted files, files without the source extension, and files under
//! test-source directories, so they are never read or parsed.

use std::path::Path;

use deltacov_core::{ChangeKind, DeltacovError, DiffConfig, FileDiffEntry};
use serde::Serialize;

/// Decides which diff entries reach the classifier.
///
/// # Examples
///
/// ```
/// use deltacov_difflens::filter::PathFilter;
///
/// let filter = PathFilter::new("java", &["**/src/test/**".to_string()]).unwrap();
/// assert!(!filter.should_skip("core/src/main/java/App.java"));
/// assert!(filter.should_skip("core/src/test/java/AppTest.java"));
/// assert!(filter.should_skip("README.md"));
/// ```
#[derive(Debug, Clone)]
pub struct PathFilter {
    extension: String,
    test_patterns: Vec<glob::Pattern>,
}

impl PathFilter {
    /// Create a filter keeping files with `extension` (with or without the
    /// leading dot) outside every `test_dirs` glob.
    ///
    /// # Errors
    ///
    /// Returns [`DeltacovError::Config`] if a glob pattern is invalid.
    pub fn new(extension: &str, test_dirs: &[String]) -> Result<Self, DeltacovError> {
        let mut test_patterns = Vec::with_capacity(test_dirs.len());
        for pat in test_dirs {
            let pattern = glob::Pattern::new(pat).map_err(|e| {
                DeltacovError::Config(format!("invalid test directory pattern '{pat}': {e}"))
            })?;
            test_patterns.push(pattern);
        }

        Ok(Self {
            extension: extension.trim_start_matches('.').to_string(),
            test_patterns,
        })
    }

    /// Create a filter from diff configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DeltacovError::Config`] if a glob pattern is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use deltacov_core::DiffConfig;
    /// use deltacov_difflens::filter::PathFilter;
    ///
    /// let filter = PathFilter::from_config(&DiffConfig::default()).unwrap();
    /// assert!(filter.should_skip("src/test/java/FooTest.java"));
    /// ```
    pub fn from_config(config: &DiffConfig) -> Result<Self, DeltacovError> {
        Self::new(&config.source_extension, &config.test_dirs)
    }

    /// Check if a single path would be skipped.
    pub fn should_skip(&self, path: &str) -> bool {
        self.check_skip(path).is_some()
    }

    /// Split `entries` into those to classify and those skipped.
    ///
    /// Order of the kept entries is preserved.
    pub fn filter(&self, entries: Vec<FileDiffEntry>) -> FilterResult {
        let mut kept = Vec::new();
        let mut skipped = Vec::new();

        for entry in entries {
            let reason = if entry.kind == ChangeKind::Delete {
                Some(SkipReason::Deleted)
            } else {
                self.check_skip(&entry.new_path)
            };

            match reason {
                Some(reason) => {
                    tracing::debug!(path = %entry.new_path, %reason, "skipping file");
                    skipped.push(SkippedFile {
                        path: entry.new_path,
                        reason,
                    });
                }
                None => kept.push(entry),
            }
        }

        FilterResult { kept, skipped }
    }

    fn check_skip(&self, path: &str) -> Option<SkipReason> {
        let ext = Path::new(path).extension().and_then(|e| e.to_str());
        if ext != Some(self.extension.as_str()) {
            return Some(SkipReason::NotSource);
        }

        self.test_patterns
            .iter()
            .find(|pat| pat.matches(path))
            .map(|pat| SkipReason::TestSource(pat.to_string()))
    }
}

/// Result of filtering diff entries.
#[derive(Debug, Clone, Default)]
pub struct FilterResult {
    /// Entries that passed the filter.
    pub kept: Vec<FileDiffEntry>,
    /// Entries that were skipped with reasons.
    pub skipped: Vec<SkippedFile>,
}

/// A file that was left out of the change-set without being an error.
///
/// # Examples
///
/// ```
/// use deltacov_difflens::filter::{SkipReason, SkippedFile};
///
/// let skipped = SkippedFile {
///     path: "src/main/java/Shape.java".into(),
///     reason: SkipReason::Interface,
/// };
/// assert_eq!(skipped.to_string(), "src/main/java/Shape.java (interface)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    /// Path in the new revision (the old path for deletions).
    pub path: String,
    /// Why the file was skipped.
    pub reason: SkipReason,
}

impl std::fmt::Display for SkippedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.path, self.reason)
    }
}

/// Reason a file was skipped.
///
/// # Examples
///
/// ```
/// use deltacov_difflens::filter::SkipReason;
///
/// let reason = SkipReason::TestSource("**/src/test/**".into());
/// assert_eq!(format!("{reason}"), "test source: **/src/test/**");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// Deleted files cannot be covered going forward.
    Deleted,
    /// Extension is not the configured source extension.
    NotSource,
    /// Path matched a test-source directory pattern.
    TestSource(String),
    /// Primary type is an interface; nothing coverable.
    Interface,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Deleted => write!(f, "deleted"),
            SkipReason::NotSource => write!(f, "not a source file"),
            SkipReason::TestSource(pat) => write!(f, "test source: {pat}"),
            SkipReason::Interface => write!(f, "interface"),
        }
    }
}
