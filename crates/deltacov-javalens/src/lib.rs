//! Java source parsing and method fingerprinting for deltacov.
//!
//! Parses a single compilation unit with tree-sitter and extracts what the
//! change classifier needs:
//! - [`parser`]: package name, primary type declaration, and its methods
//! - [`fingerprint`]: whitespace- and comment-insensitive method hashes

pub mod fingerprint;
pub mod parser;

pub use fingerprint::fingerprint;
pub use parser::{parse, MethodDecl, ParsedUnit, TypeDecl, TypeKind};
