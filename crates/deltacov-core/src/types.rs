use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of revision a [`RevisionRef`] names.
///
/// # Examples
///
/// ```
/// use deltacov_core::RevisionKind;
///
/// let kind: RevisionKind = "tag".parse().unwrap();
/// assert_eq!(kind, RevisionKind::Tag);
/// assert_eq!(kind.to_string(), "tag");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionKind {
    /// A branch name; resolved after syncing with its remote.
    Branch,
    /// A tag name; immutable.
    Tag,
    /// A full or abbreviated commit id; immutable.
    Commit,
}

impl fmt::Display for RevisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevisionKind::Branch => write!(f, "branch"),
            RevisionKind::Tag => write!(f, "tag"),
            RevisionKind::Commit => write!(f, "commit"),
        }
    }
}

impl FromStr for RevisionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "branch" => Ok(RevisionKind::Branch),
            "tag" => Ok(RevisionKind::Tag),
            "commit" | "sha" => Ok(RevisionKind::Commit),
            other => Err(format!("unknown revision kind: {other}")),
        }
    }
}

/// A logical pointer to a tree snapshot.
///
/// # Examples
///
/// ```
/// use deltacov_core::{RevisionKind, RevisionRef};
///
/// let rev = RevisionRef::new(RevisionKind::Branch, "develop");
/// assert_eq!(rev, RevisionRef::Branch("develop".into()));
/// assert_eq!(rev.to_string(), "branch develop");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "name")]
pub enum RevisionRef {
    Branch(String),
    Tag(String),
    Commit(String),
}

impl RevisionRef {
    /// Build a reference from a kind and a name.
    pub fn new(kind: RevisionKind, name: impl Into<String>) -> Self {
        let name = name.into();
        match kind {
            RevisionKind::Branch => RevisionRef::Branch(name),
            RevisionKind::Tag => RevisionRef::Tag(name),
            RevisionKind::Commit => RevisionRef::Commit(name),
        }
    }

    pub fn kind(&self) -> RevisionKind {
        match self {
            RevisionRef::Branch(_) => RevisionKind::Branch,
            RevisionRef::Tag(_) => RevisionKind::Tag,
            RevisionRef::Commit(_) => RevisionKind::Commit,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RevisionRef::Branch(n) | RevisionRef::Tag(n) | RevisionRef::Commit(n) => n,
        }
    }
}

impl fmt::Display for RevisionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.name())
    }
}

/// Path-level change kind between two snapshots.
///
/// # Examples
///
/// ```
/// use deltacov_core::ChangeKind;
///
/// assert_eq!(ChangeKind::Rename.to_string(), "rename");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Modify,
    Delete,
    Rename,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Add => write!(f, "add"),
            ChangeKind::Modify => write!(f, "modify"),
            ChangeKind::Delete => write!(f, "delete"),
            ChangeKind::Rename => write!(f, "rename"),
        }
    }
}

/// An inclusive, 1-based span of source lines.
///
/// # Examples
///
/// ```
/// use deltacov_core::LineRange;
///
/// let range = LineRange::from_start_len(10, 3).unwrap();
/// assert_eq!((range.start, range.end), (10, 12));
/// assert!(range.contains(12));
/// assert!(!range.contains(13));
/// assert!(LineRange::from_start_len(10, 0).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineRange {
    /// First line (1-based).
    pub start: u32,
    /// Last line (1-based, inclusive).
    pub end: u32,
}

impl LineRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Build a range from a start line and a line count. Returns `None`
    /// for an empty span.
    pub fn from_start_len(start: u32, len: u32) -> Option<Self> {
        if len == 0 {
            return None;
        }
        Some(Self {
            start,
            end: start + len - 1,
        })
    }

    pub fn contains(&self, line: u32) -> bool {
        line >= self.start && line <= self.end
    }

    /// Number of lines covered; zero for an empty range.
    pub fn len(&self) -> u32 {
        self.end.saturating_add(1).saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// One edit region of a modified file: the lines removed from the old
/// version and the lines that replaced them in the new version. Either side
/// may be empty (pure insertion or pure deletion).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEdit {
    /// Lines removed from the old version.
    pub deleted: Option<LineRange>,
    /// Lines added in the new version.
    pub added: Option<LineRange>,
}

/// One path-level change between two snapshots.
///
/// # Examples
///
/// ```
/// use deltacov_core::{ChangeKind, FileDiffEntry, LineEdit, LineRange};
///
/// let entry = FileDiffEntry {
///     old_path: "src/main/java/a/Foo.java".into(),
///     new_path: "src/main/java/a/Foo.java".into(),
///     kind: ChangeKind::Modify,
///     edits: vec![LineEdit {
///         deleted: None,
///         added: LineRange::from_start_len(5, 4),
///     }],
/// };
/// assert_eq!(entry.added_lines(), vec![LineRange::new(5, 8)]);
/// assert!(entry.deleted_lines().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDiffEntry {
    /// Path in the old snapshot (`/dev/null` style paths are never used;
    /// for additions this equals `new_path`).
    pub old_path: String,
    /// Path in the new snapshot (for deletions this equals `old_path`).
    pub new_path: String,
    /// Kind of change.
    pub kind: ChangeKind,
    /// Ordered line edits; empty for additions and deletions.
    pub edits: Vec<LineEdit>,
}

impl FileDiffEntry {
    /// Added line ranges in new-version line numbers, in edit order.
    pub fn added_lines(&self) -> Vec<LineRange> {
        self.edits.iter().filter_map(|e| e.added).collect()
    }

    /// Deleted line ranges in old-version line numbers, in edit order.
    pub fn deleted_lines(&self) -> Vec<LineRange> {
        self.edits.iter().filter_map(|e| e.deleted).collect()
    }
}

/// How a method differs from the old revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodChange {
    /// No method with the same name and parameter signature existed.
    Added,
    /// Same identity key, different fingerprint.
    Modified,
}

impl fmt::Display for MethodChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodChange::Added => write!(f, "added"),
            MethodChange::Modified => write!(f, "modified"),
        }
    }
}

/// A changed method within a [`ClassInfo`].
///
/// # Examples
///
/// ```
/// use deltacov_core::{LineRange, MethodChange, MethodInfo};
///
/// let method = MethodInfo {
///     name: "charge".into(),
///     parameters: vec!["Order".into(), "int".into()],
///     fingerprint: "ab12".into(),
///     change: MethodChange::Modified,
///     lines: LineRange::new(14, 20),
/// };
/// assert_eq!(method.signature(), "charge(Order, int)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodInfo {
    /// Method name (constructors use the class name).
    pub name: String,
    /// Parameter type texts in declaration order.
    pub parameters: Vec<String>,
    /// SHA-256 hex digest of the normalized declaration text.
    pub fingerprint: String,
    /// Classification against the old revision.
    pub change: MethodChange,
    /// Span of the declaration in the new revision.
    pub lines: LineRange,
}

impl MethodInfo {
    /// Human-readable `name(Type, Type)` form.
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.parameters.join(", "))
    }
}

/// Whether a class is new or an edited version of an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassChange {
    Add,
    Modify,
}

impl fmt::Display for ClassChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassChange::Add => write!(f, "add"),
            ClassChange::Modify => write!(f, "modify"),
        }
    }
}

/// One changed class and the methods in it that need coverage.
///
/// # Examples
///
/// ```
/// use deltacov_core::{ClassChange, ClassInfo};
///
/// let class = ClassInfo {
///     class_name: "Billing".into(),
///     package: "com.shop.pay".into(),
///     change: ClassChange::Add,
///     methods: vec![],
///     added_lines: vec![],
///     deleted_lines: vec![],
///     source_path: "src/main/java/com/shop/pay/Billing.java".into(),
/// };
/// assert_eq!(class.qualified_name(), "com.shop.pay.Billing");
/// assert_eq!(class.internal_name(), "com/shop/pay/Billing");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    /// Simple name of the primary type.
    pub class_name: String,
    /// Dotted package name; empty for the default package.
    pub package: String,
    /// Added or modified.
    pub change: ClassChange,
    /// Added and modified methods, in declaration order.
    pub methods: Vec<MethodInfo>,
    /// Added line ranges (new revision). Empty for [`ClassChange::Add`].
    pub added_lines: Vec<LineRange>,
    /// Deleted line ranges (old revision). Empty for [`ClassChange::Add`].
    pub deleted_lines: Vec<LineRange>,
    /// Repository-relative source path in the new revision.
    pub source_path: String,
}

impl ClassInfo {
    /// Dotted fully-qualified name, e.g. `com.shop.Billing`.
    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.class_name.clone()
        } else {
            format!("{}.{}", self.package, self.class_name)
        }
    }

    /// JVM internal name, e.g. `com/shop/Billing`.
    pub fn internal_name(&self) -> String {
        self.qualified_name().replace('.', "/")
    }
}

/// The ordered, immutable result of one diff run.
///
/// # Examples
///
/// ```
/// use deltacov_core::ChangeSet;
///
/// let set = ChangeSet::default();
/// assert!(set.is_empty());
/// assert_eq!(set.method_count(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet {
    classes: Vec<ClassInfo>,
}

impl ChangeSet {
    pub fn new(classes: Vec<ClassInfo>) -> Self {
        Self { classes }
    }

    pub fn classes(&self) -> &[ClassInfo] {
        &self.classes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClassInfo> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Total number of changed methods across all classes.
    pub fn method_count(&self) -> usize {
        self.classes.iter().map(|c| c.methods.len()).sum()
    }

    pub fn into_classes(self) -> Vec<ClassInfo> {
        self.classes
    }
}

impl FromIterator<ClassInfo> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = ClassInfo>>(iter: I) -> Self {
        Self {
            classes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a ClassInfo;
    type IntoIter = std::slice::Iter<'a, ClassInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.classes.iter()
    }
}

/// Why a file was dropped from classification without failing the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// No class-like declaration could be recovered from the source.
    ParseFailure,
    /// The file content is not valid UTF-8.
    InvalidEncoding,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::ParseFailure => write!(f, "parse failure"),
            DiagnosticKind::InvalidEncoding => write!(f, "invalid encoding"),
        }
    }
}

/// A non-fatal, per-file problem encountered during classification.
///
/// # Examples
///
/// ```
/// use deltacov_core::{Diagnostic, DiagnosticKind};
///
/// let diag = Diagnostic {
///     path: "src/main/java/Broken.java".into(),
///     kind: DiagnosticKind::ParseFailure,
///     message: "no class declaration found".into(),
/// };
/// assert_eq!(
///     diag.to_string(),
///     "src/main/java/Broken.java: parse failure: no class declaration found"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub path: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.path, self.kind, self.message)
    }
}

/// Output format for command results.
///
/// # Examples
///
/// ```
/// use deltacov_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
