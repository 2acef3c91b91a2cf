use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DeltacovError;

/// Top-level configuration loaded from `.deltacov.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
///
/// # Examples
///
/// ```
/// use deltacov_core::DeltacovConfig;
///
/// let config = DeltacovConfig::default();
/// assert_eq!(config.diff.chunk_size, 100);
/// assert_eq!(config.repository.remote, "origin");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeltacovConfig {
    /// Repository and remote synchronization settings.
    #[serde(default)]
    pub repository: RepositoryConfig,
    /// Diffing and classification settings.
    #[serde(default)]
    pub diff: DiffConfig,
    /// Package and class exclusion patterns.
    #[serde(default)]
    pub exclude: ExcludeConfig,
}

impl DeltacovConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DeltacovError::Io`] if the file cannot be read,
    /// [`DeltacovError::Toml`] if the content is not valid TOML, or
    /// [`DeltacovError::Config`] if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use deltacov_core::DeltacovConfig;
    /// use std::path::Path;
    ///
    /// let config = DeltacovConfig::from_file(Path::new(".deltacov.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, DeltacovError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`DeltacovError::Toml`] if parsing fails, or
    /// [`DeltacovError::Config`] if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use deltacov_core::DeltacovConfig;
    ///
    /// let toml = r#"
    /// [diff]
    /// chunk_size = 25
    /// "#;
    /// let config = DeltacovConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.diff.chunk_size, 25);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, DeltacovError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), DeltacovError> {
        if self.diff.chunk_size == 0 {
            return Err(DeltacovError::Config(
                "diff.chunk_size must be at least 1".into(),
            ));
        }
        if self.diff.rename_threshold > 100 {
            return Err(DeltacovError::Config(
                "diff.rename_threshold must be between 0 and 100".into(),
            ));
        }
        if self.diff.source_extension.trim_start_matches('.').is_empty() {
            return Err(DeltacovError::Config(
                "diff.source_extension must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Repository access configuration.
///
/// The password is never read from the file; the CLI takes it from
/// `DELTACOV_GIT_PASSWORD`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Remote used for branch synchronization (default: `"origin"`).
    #[serde(default = "default_remote")]
    pub remote: String,
    /// Skip all remote synchronization (default: false).
    #[serde(default)]
    pub offline: bool,
    /// Username for remote authentication.
    pub username: Option<String>,
}

fn default_remote() -> String {
    "origin".into()
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            offline: false,
            username: None,
        }
    }
}

/// Diffing and classification configuration.
///
/// # Examples
///
/// ```
/// use deltacov_core::DiffConfig;
///
/// let config = DiffConfig::default();
/// assert_eq!(config.source_extension, "java");
/// assert_eq!(config.test_dirs, vec!["**/src/test/**".to_string()]);
/// assert_eq!(config.rename_threshold, 50);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Number of files classified per worker (default: 100).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Extension of source files to classify (default: `"java"`).
    #[serde(default = "default_source_extension")]
    pub source_extension: String,
    /// Glob patterns of test-source directories to exclude.
    #[serde(default = "default_test_dirs")]
    pub test_dirs: Vec<String>,
    /// Minimum similarity percentage for rename detection (default: 50).
    #[serde(default = "default_rename_threshold")]
    pub rename_threshold: u16,
}

fn default_chunk_size() -> usize {
    100
}

fn default_source_extension() -> String {
    "java".into()
}

fn default_test_dirs() -> Vec<String> {
    vec!["**/src/test/**".into()]
}

fn default_rename_threshold() -> u16 {
    50
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            source_extension: default_source_extension(),
            test_dirs: default_test_dirs(),
            rename_threshold: default_rename_threshold(),
        }
    }
}

/// Regular expressions matched against whole package and class names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeConfig {
    #[serde(default)]
    pub packages: Vec<String>,
    #[serde(default)]
    pub classes: Vec<String>,
}
