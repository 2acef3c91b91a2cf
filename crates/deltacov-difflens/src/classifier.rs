//! Per-file method classification.

use std::collections::HashMap;

use deltacov_core::{
    ChangeKind, ClassChange, ClassInfo, Diagnostic, DiagnosticKind, FileDiffEntry, MethodChange,
    MethodInfo,
};
use deltacov_javalens::{fingerprint, parse, ParsedUnit};

use crate::filter::{SkipReason, SkippedFile};

/// A diff entry with the file contents it refers to, read up front so
/// classification never touches the repository.
#[derive(Debug, Clone)]
pub struct MaterializedEntry {
    pub entry: FileDiffEntry,
    /// Content at the old revision; `None` for additions.
    pub old_text: Option<Vec<u8>>,
    /// Content at the new revision; empty for deletions.
    pub new_text: Vec<u8>,
}

/// What classifying one file produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A changed class with its added and modified methods.
    Class(ClassInfo),
    /// Nothing coverable; not an error.
    Dropped(SkippedFile),
    /// The file could not be decoded or parsed.
    Failed(Diagnostic),
}

/// Classify one materialized entry.
///
/// Additions list every method as added. Modifications and renames match
/// new methods against old ones by name and parameter types: unmatched
/// methods are added, matched methods with a different fingerprint are
/// modified, and identical ones are left out. Deleted files and interfaces
/// are dropped.
///
/// # Examples
///
/// ```
/// use deltacov_core::{ChangeKind, ClassChange, FileDiffEntry};
/// use deltacov_difflens::classifier::{classify, MaterializedEntry, Outcome};
///
/// let item = MaterializedEntry {
///     entry: FileDiffEntry {
///         old_path: "Cart.java".into(),
///         new_path: "Cart.java".into(),
///         kind: ChangeKind::Add,
///         edits: vec![],
///     },
///     old_text: None,
///     new_text: b"class Cart { int size() { return 0; } }".to_vec(),
/// };
/// let Outcome::Class(class) = classify(&item) else { panic!("expected a class") };
/// assert_eq!(class.change, ClassChange::Add);
/// assert_eq!(class.methods[0].name, "size");
/// ```
pub fn classify(item: &MaterializedEntry) -> Outcome {
    let entry = &item.entry;
    let change = match entry.kind {
        ChangeKind::Delete => {
            return Outcome::Dropped(SkippedFile {
                path: entry.old_path.clone(),
                reason: SkipReason::Deleted,
            })
        }
        ChangeKind::Add => ClassChange::Add,
        ChangeKind::Modify | ChangeKind::Rename => ClassChange::Modify,
    };

    let new_unit = match decode(&item.new_text) {
        Ok(text) => parse(text),
        Err(e) => {
            return failed(
                &entry.new_path,
                DiagnosticKind::InvalidEncoding,
                format!("content is not valid UTF-8: {e}"),
            )
        }
    };
    let Some(new_type) = new_unit.primary_type else {
        return failed(
            &entry.new_path,
            DiagnosticKind::ParseFailure,
            "no class, record or interface declaration found".into(),
        );
    };
    if !new_type.kind.is_class_like() {
        tracing::debug!(path = %entry.new_path, "skipping interface");
        return Outcome::Dropped(SkippedFile {
            path: entry.new_path.clone(),
            reason: SkipReason::Interface,
        });
    }
    if new_unit.has_errors {
        tracing::debug!(path = %entry.new_path, "syntax errors recovered while parsing");
    }

    let old_methods = match change {
        ClassChange::Add => HashMap::new(),
        ClassChange::Modify => old_fingerprints(item),
    };

    let methods = new_type
        .methods
        .iter()
        .filter_map(|method| {
            let hash = fingerprint(method);
            let key = (method.name.clone(), method.parameters.clone());
            let change = match old_methods.get(&key) {
                None => MethodChange::Added,
                Some(old) if *old == hash => return None,
                Some(_) => MethodChange::Modified,
            };
            Some(MethodInfo {
                name: method.name.clone(),
                parameters: method.parameters.clone(),
                fingerprint: hash,
                change,
                lines: method.lines,
            })
        })
        .collect();

    let (added_lines, deleted_lines) = match change {
        ClassChange::Add => (Vec::new(), Vec::new()),
        ClassChange::Modify => (entry.added_lines(), entry.deleted_lines()),
    };

    Outcome::Class(ClassInfo {
        class_name: new_type.name,
        package: new_unit.package,
        change,
        methods,
        added_lines,
        deleted_lines,
        source_path: entry.new_path.clone(),
    })
}

type IdentityKey = (String, Vec<String>);

/// Fingerprints of the old revision's methods by identity key. Later
/// declarations overwrite earlier ones with the same key.
fn old_fingerprints(item: &MaterializedEntry) -> HashMap<IdentityKey, String> {
    let path = &item.entry.old_path;
    let unit = match item.old_text.as_deref().map(decode) {
        Some(Ok(text)) => parse(text),
        Some(Err(_)) | None => {
            tracing::warn!(%path, "old content unreadable, treating all methods as added");
            ParsedUnit::default()
        }
    };

    let mut map = HashMap::new();
    if let Some(old_type) = unit.primary_type {
        for method in &old_type.methods {
            map.insert(
                (method.name.clone(), method.parameters.clone()),
                fingerprint(method),
            );
        }
    }
    map
}

fn decode(bytes: &[u8]) -> Result<&str, std::str::Utf8Error> {
    let text = std::str::from_utf8(bytes)?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

fn failed(path: &str, kind: DiagnosticKind, message: String) -> Outcome {
    let diagnostic = Diagnostic {
        path: path.to_string(),
        kind,
        message,
    };
    tracing::warn!(%diagnostic, "dropping file");
    Outcome::Failed(diagnostic)
}
