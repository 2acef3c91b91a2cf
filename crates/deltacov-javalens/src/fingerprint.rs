use sha2::{Digest, Sha256};

use crate::parser::MethodDecl;

/// SHA-256 hex digest of a method's structural text.
///
/// Reformatting a method or editing its comments leaves the fingerprint
/// unchanged; changing any token of the signature or body changes it.
///
/// # Examples
///
/// ```
/// use deltacov_javalens::{fingerprint, parse};
///
/// let a = parse("class A { int f() { return 1; } }");
/// let b = parse("class A {\n  int f() {\n    // one\n    return 1;\n  }\n}");
/// let fa = fingerprint(&a.primary_type.unwrap().methods[0]);
/// let fb = fingerprint(&b.primary_type.unwrap().methods[0]);
/// assert_eq!(fa, fb);
/// assert_eq!(fa.len(), 64);
/// ```
pub fn fingerprint(method: &MethodDecl) -> String {
    compute_hash(&method.structural_text)
}

fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
