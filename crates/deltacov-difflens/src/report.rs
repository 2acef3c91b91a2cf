//! The result of a diff run and its renderings.

use std::fmt;

use deltacov_core::{ChangeSet, ClassInfo, Diagnostic, LineRange};
use deltacov_gitstore::Snapshot;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::filter::SkippedFile;

/// Outcome of a diff run.
///
/// An empty `change_set` with empty `diagnostics` means nothing coverable
/// changed; diagnostics mean some files could not be examined.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    #[serde(serialize_with = "serialize_snapshot")]
    pub old: Snapshot,
    #[serde(serialize_with = "serialize_snapshot")]
    pub new: Snapshot,
    pub change_set: ChangeSet,
    pub diagnostics: Vec<Diagnostic>,
    pub skipped: Vec<SkippedFile>,
}

fn serialize_snapshot<S: Serializer>(
    snapshot: &Snapshot,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut state = serializer.serialize_struct("Snapshot", 2)?;
    state.serialize_field("revision", &snapshot.revision)?;
    state.serialize_field("commit", &snapshot.commit.to_string())?;
    state.end()
}

impl DiffReport {
    /// Render as GitHub-flavored Markdown.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Incremental Coverage Scope\n\n");
        out.push_str(&format!("**Old:** `{}`  \n**New:** `{}`\n\n", self.old, self.new));

        if self.change_set.is_empty() {
            out.push_str("No changed classes.\n\n");
        } else {
            out.push_str("| Class | Change | Methods | Added lines |\n");
            out.push_str("|-------|--------|---------|-------------|\n");
            for class in &self.change_set {
                let methods: Vec<String> = class
                    .methods
                    .iter()
                    .map(|m| format!("`{}` ({})", m.signature(), m.change))
                    .collect();
                out.push_str(&format!(
                    "| `{}` | {} | {} | {} |\n",
                    class.qualified_name(),
                    class.change,
                    if methods.is_empty() {
                        "-".to_string()
                    } else {
                        methods.join("<br>")
                    },
                    ranges(&class.added_lines),
                ));
            }
            out.push('\n');
        }

        if !self.diagnostics.is_empty() {
            out.push_str("## Diagnostics\n\n");
            for diag in &self.diagnostics {
                out.push_str(&format!("- `{}`: {}: {}\n", diag.path, diag.kind, diag.message));
            }
            out.push('\n');
        }

        out.push_str(&format!(
            "**Summary:** {} classes, {} methods, {} skipped files, {} diagnostics\n",
            self.change_set.len(),
            self.change_set.method_count(),
            self.skipped.len(),
            self.diagnostics.len(),
        ));
        out
    }
}

impl fmt::Display for DiffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Incremental Coverage Scope")?;
        writeln!(f, "==========================")?;
        writeln!(f, "old: {}", self.old)?;
        writeln!(f, "new: {}\n", self.new)?;

        for class in &self.change_set {
            write_class(f, class)?;
        }

        if !self.diagnostics.is_empty() {
            writeln!(f, "Diagnostics:")?;
            for diag in &self.diagnostics {
                writeln!(f, "  {diag}")?;
            }
            writeln!(f)?;
        }

        writeln!(
            f,
            "{} classes, {} methods ({} files skipped, {} diagnostics)",
            self.change_set.len(),
            self.change_set.method_count(),
            self.skipped.len(),
            self.diagnostics.len(),
        )
    }
}

fn write_class(f: &mut fmt::Formatter<'_>, class: &ClassInfo) -> fmt::Result {
    writeln!(f, "{:<8} {}", class.change.to_string(), class.qualified_name())?;
    for method in &class.methods {
        writeln!(
            f,
            "  {:<8} {} [{}]",
            method.change.to_string(),
            method.signature(),
            method.lines
        )?;
    }
    if !class.added_lines.is_empty() {
        writeln!(f, "  lines    {}", ranges(&class.added_lines))?;
    }
    writeln!(f)
}

fn ranges(ranges: &[LineRange]) -> String {
    if ranges.is_empty() {
        return "all".to_string();
    }
    ranges
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
