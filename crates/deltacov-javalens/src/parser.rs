//! Compilation-unit parsing using tree-sitter.
//!
//! Only the *primary* type of a file is examined: the first top-level class,
//! record or interface declaration. Members of nested types belong to other
//! JVM classes and are not reported against the primary type.

use deltacov_core::LineRange;
use tree_sitter::{Node, Parser};

/// The shape of a primary type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Record,
    Interface,
}

impl TypeKind {
    /// Whether the type carries coverable method bodies.
    ///
    /// # Examples
    ///
    /// ```
    /// use deltacov_javalens::TypeKind;
    ///
    /// assert!(TypeKind::Record.is_class_like());
    /// assert!(!TypeKind::Interface.is_class_like());
    /// ```
    pub fn is_class_like(self) -> bool {
        matches!(self, TypeKind::Class | TypeKind::Record)
    }
}

/// A method or constructor declared directly in the primary type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    /// Method name; constructors carry the type name.
    pub name: String,
    /// Parameter types in declaration order, e.g. `["Map<String, Integer>", "int..."]`.
    pub parameters: Vec<String>,
    /// Leaf tokens of the whole declaration joined by single spaces, comments
    /// removed. This is the input to [`crate::fingerprint`].
    pub structural_text: String,
    /// Raw text of the body block, if the method has one.
    pub body_text: Option<String>,
    /// 1-based span of the declaration, annotations included.
    pub lines: LineRange,
}

/// The primary type declaration of a compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    pub methods: Vec<MethodDecl>,
}

/// Everything extracted from one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUnit {
    /// Dotted package name; empty for the default package.
    pub package: String,
    /// First top-level class, record or interface, if any.
    pub primary_type: Option<TypeDecl>,
    /// The syntax tree contained error or missing nodes.
    pub has_errors: bool,
}

/// Parse Java source text.
///
/// Never fails: tree-sitter recovers from syntax errors, and input with no
/// recognisable type declaration yields a unit whose `primary_type` is `None`.
/// Enum and annotation-type declarations are skipped when looking for the
/// primary type.
///
/// # Examples
///
/// ```
/// use deltacov_javalens::{parse, TypeKind};
///
/// let unit = parse(
///     "package com.shop;\n\
///      public class Cart {\n\
///          public int total(int base, int... extras) { return base; }\n\
///      }\n",
/// );
/// assert_eq!(unit.package, "com.shop");
/// let cart = unit.primary_type.unwrap();
/// assert_eq!(cart.name, "Cart");
/// assert_eq!(cart.kind, TypeKind::Class);
/// assert_eq!(cart.methods[0].name, "total");
/// assert_eq!(cart.methods[0].parameters, vec!["int", "int..."]);
/// ```
pub fn parse(text: &str) -> ParsedUnit {
    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&tree_sitter_java::LANGUAGE.into()) {
        tracing::error!(error = %e, "failed to load Java grammar");
        return ParsedUnit::default();
    }

    let Some(tree) = parser.parse(text, None) else {
        return ParsedUnit::default();
    };

    let root = tree.root_node();
    let source = text.as_bytes();
    let mut unit = ParsedUnit {
        has_errors: root.has_error(),
        ..ParsedUnit::default()
    };

    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "package_declaration" if unit.package.is_empty() => {
                unit.package = package_name(&child, source);
            }
            "class_declaration" | "record_declaration" | "interface_declaration"
                if unit.primary_type.is_none() =>
            {
                unit.primary_type = type_decl(&child, source);
            }
            _ => {}
        }
    }

    unit
}

fn package_name(node: &Node, source: &[u8]) -> String {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"));
    found
        .map(|n| node_text(&n, source).split_whitespace().collect())
        .unwrap_or_default()
}

fn type_decl(node: &Node, source: &[u8]) -> Option<TypeDecl> {
    let kind = match node.kind() {
        "class_declaration" => TypeKind::Class,
        "record_declaration" => TypeKind::Record,
        "interface_declaration" => TypeKind::Interface,
        _ => return None,
    };
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(&n, source))
        .filter(|n| !n.is_empty())?;

    let mut methods = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            if let Some(method) = method_decl(&member, &name, source) {
                methods.push(method);
            }
        }
    }

    Some(TypeDecl {
        name,
        kind,
        methods,
    })
}

fn method_decl(node: &Node, type_name: &str, source: &[u8]) -> Option<MethodDecl> {
    let name = match node.kind() {
        "method_declaration" | "constructor_declaration" => node
            .child_by_field_name("name")
            .map(|n| node_text(&n, source))?,
        // Compact record constructors have no parameter list of their own.
        "compact_constructor_declaration" => type_name.to_string(),
        _ => return None,
    };

    let parameters = node
        .child_by_field_name("parameters")
        .map(|p| parameter_types(&p, source))
        .unwrap_or_default();

    let mut tokens = Vec::new();
    collect_tokens(node, source, &mut tokens);

    Some(MethodDecl {
        name,
        parameters,
        structural_text: tokens.join(" "),
        body_text: node
            .child_by_field_name("body")
            .map(|b| node_text(&b, source)),
        lines: LineRange::new(
            node.start_position().row as u32 + 1,
            node.end_position().row as u32 + 1,
        ),
    })
}

fn parameter_types(params: &Node, source: &[u8]) -> Vec<String> {
    let mut types = Vec::new();
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        match param.kind() {
            "formal_parameter" => {
                let mut tokens = Vec::new();
                if let Some(ty) = param.child_by_field_name("type") {
                    collect_tokens(&ty, source, &mut tokens);
                }
                // C-style array declarators: `int values[]`
                if let Some(dims) = param.child_by_field_name("dimensions") {
                    collect_tokens(&dims, source, &mut tokens);
                }
                types.push(compact_join(&tokens));
            }
            "spread_parameter" => {
                let mut inner = param.walk();
                let ty = param
                    .named_children(&mut inner)
                    .find(|c| !matches!(c.kind(), "modifiers" | "variable_declarator"));
                let mut tokens = Vec::new();
                if let Some(ty) = ty {
                    collect_tokens(&ty, source, &mut tokens);
                }
                types.push(format!("{}...", compact_join(&tokens)));
            }
            // receiver parameters (`Outer this`) are not part of the JVM signature
            _ => {}
        }
    }
    types
}

/// Collect the non-empty leaf token texts under `node`, skipping comments.
fn collect_tokens(node: &Node, source: &[u8], tokens: &mut Vec<String>) {
    if is_comment(node) {
        return;
    }
    if node.child_count() == 0 {
        let text = node_text(node, source);
        if !text.is_empty() {
            tokens.push(text);
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_tokens(&child, source, tokens);
    }
}

/// Join type tokens the way they are conventionally written: no spaces
/// around punctuation, one space between adjacent words and after commas.
fn compact_join(tokens: &[String]) -> String {
    let mut out = String::new();
    for token in tokens {
        let needs_space = out.ends_with(',')
            || (out.chars().last().is_some_and(is_word_char)
                && token.chars().next().is_some_and(is_word_char));
        if needs_space {
            out.push(' ');
        }
        out.push_str(token);
    }
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '?')
}

fn is_comment(node: &Node) -> bool {
    matches!(node.kind(), "line_comment" | "block_comment")
}

fn node_text(node: &Node, source: &[u8]) -> String {
    let start = node.start_byte();
    let end = node.end_byte();
    if start >= source.len() || end > source.len() {
        return String::new();
    }
    String::from_utf8_lossy(&source[start..end]).to_string()
}
