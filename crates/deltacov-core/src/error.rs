/// Errors that can occur while computing a change-set.
///
/// Structural failures (a revision that cannot be resolved, a remote that
/// cannot be synchronized, an invalid exclusion pattern) are fatal and surface
/// here. Per-file parse failures are not errors; they are reported as
/// [`crate::Diagnostic`] values alongside the change-set.
///
/// Library crates use this type directly; the binary converts to
/// `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use deltacov_core::DeltacovError;
///
/// let err = DeltacovError::RevisionNotFound {
///     reference: "branch feature/login".into(),
/// };
/// assert!(err.to_string().contains("feature/login"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DeltacovError {
    /// A branch, tag, or commit could not be resolved.
    #[error("revision not found: {reference}")]
    #[diagnostic(
        code(deltacov::revision_not_found),
        help("check the name exists locally or on the remote")
    )]
    RevisionNotFound {
        /// Human-readable description of the reference, e.g. `tag v1.2.0`.
        reference: String,
    },

    /// Synchronizing a local branch with its remote failed.
    #[error("failed to sync branch '{branch}': {reason}")]
    #[diagnostic(code(deltacov::sync_failure))]
    SyncFailure {
        /// Local branch name.
        branch: String,
        /// Underlying cause (network, auth, divergence).
        reason: String,
    },

    /// A path does not exist in the tree of the given revision.
    #[error("path '{path}' not found in {revision}")]
    #[diagnostic(code(deltacov::path_not_found))]
    PathNotFound {
        /// Repository-relative path.
        path: String,
        /// Revision the lookup was made against.
        revision: String,
    },

    /// An exclusion pattern is not a valid regular expression.
    #[error("invalid exclusion pattern '{pattern}'")]
    #[diagnostic(code(deltacov::pattern_compile))]
    PatternCompile {
        /// The offending pattern as supplied.
        pattern: String,
        /// Compiler error from the regex engine.
        #[source]
        source: regex::Error,
    },

    /// Any other git operation failure.
    #[error("git error: {0}")]
    #[diagnostic(code(deltacov::git))]
    Git(String),

    /// The classification worker pool could not be started.
    #[error("worker pool error: {0}")]
    WorkerPool(String),

    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(deltacov::config))]
    Config(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
