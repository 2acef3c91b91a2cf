//! Lookups for a coverage engine restricting its report to a change-set.
//!
//! Coverage engines see compiled classes by JVM internal name
//! (`com/shop/Cart`, `com/shop/Cart$Line`). Nested and anonymous classes
//! compile from the same source file as their outer class, so they resolve
//! to the outer class's [`ClassInfo`].

use std::collections::HashMap;

use deltacov_core::{ChangeSet, ClassChange, ClassInfo};

/// Index of a [`ChangeSet`] by internal class name.
///
/// # Examples
///
/// ```
/// use deltacov_core::{ChangeSet, ClassChange, ClassInfo, LineRange};
/// use deltacov_difflens::scope::CoverageScope;
///
/// let set: ChangeSet = std::iter::once(ClassInfo {
///     class_name: "Cart".into(),
///     package: "com.shop".into(),
///     change: ClassChange::Modify,
///     methods: vec![],
///     added_lines: vec![LineRange::new(10, 14)],
///     deleted_lines: vec![LineRange::new(10, 11)],
///     source_path: "src/main/java/com/shop/Cart.java".into(),
/// })
/// .collect();
///
/// let scope = CoverageScope::from_change_set(&set);
/// assert!(scope.contains_line("com/shop/Cart$Line", 12));
/// assert!(!scope.contains_line("com/shop/Cart", 20));
/// assert!(!scope.contains_class("com/shop/Order"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoverageScope<'a> {
    by_name: HashMap<String, &'a ClassInfo>,
}

impl<'a> CoverageScope<'a> {
    /// Index every class in `change_set`.
    pub fn from_change_set(change_set: &'a ChangeSet) -> Self {
        let by_name = change_set
            .iter()
            .map(|class| (class.internal_name(), class))
            .collect();
        Self { by_name }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// The change record for a compiled class, if it is in scope.
    ///
    /// Accepts internal (`a/b/C$D`) or dotted (`a.b.C$D`) names.
    pub fn class_info(&self, class_name: &str) -> Option<&'a ClassInfo> {
        self.by_name.get(&outer_internal_name(class_name)).copied()
    }

    pub fn contains_class(&self, class_name: &str) -> bool {
        self.class_info(class_name).is_some()
    }

    /// Whether `line` of the class's source should be reported: every line
    /// of an added class, or a line inside an added range of a modified one.
    pub fn contains_line(&self, class_name: &str, line: u32) -> bool {
        match self.class_info(class_name) {
            Some(class) => match class.change {
                ClassChange::Add => true,
                ClassChange::Modify => class.added_lines.iter().any(|r| r.contains(line)),
            },
            None => false,
        }
    }

    /// Whether a method with this name and parameter types was added or
    /// modified.
    pub fn contains_method(&self, class_name: &str, method: &str, parameters: &[&str]) -> bool {
        self.class_info(class_name).is_some_and(|class| {
            class.methods.iter().any(|m| {
                m.name == method
                    && m.parameters.len() == parameters.len()
                    && m.parameters.iter().zip(parameters).all(|(a, b)| a == b)
            })
        })
    }
}

/// `com.shop.Cart$Line` -> `com/shop/Cart`.
fn outer_internal_name(class_name: &str) -> String {
    let internal = class_name.replace('.', "/");
    match internal.find('$') {
        Some(idx) => internal[..idx].to_string(),
        None => internal,
    }
}
