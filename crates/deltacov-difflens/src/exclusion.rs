//! Package and class-name denylists.

use deltacov_core::{ChangeSet, ClassInfo, DeltacovError};
use regex::Regex;

/// Removes classes whose package or simple name fully matches a pattern.
///
/// Patterns are regular expressions matched against the whole string:
/// `com\.shop` excludes package `com.shop` but not `com.shop.pay`.
///
/// # Examples
///
/// ```
/// use deltacov_core::{ChangeSet, ClassChange, ClassInfo};
/// use deltacov_difflens::exclusion::ExclusionFilter;
///
/// let class = |package: &str, name: &str| ClassInfo {
///     class_name: name.into(),
///     package: package.into(),
///     change: ClassChange::Add,
///     methods: vec![],
///     added_lines: vec![],
///     deleted_lines: vec![],
///     source_path: format!("{name}.java"),
/// };
/// let set: ChangeSet = vec![class("com.shop.dto", "OrderDto"), class("com.shop", "Cart")]
///     .into_iter()
///     .collect();
///
/// let filter = ExclusionFilter::new(&[], &[".*Dto".to_string()]).unwrap();
/// let kept = filter.filter(set);
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept.classes()[0].class_name, "Cart");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    packages: Vec<Regex>,
    classes: Vec<Regex>,
}

impl ExclusionFilter {
    /// Compile package and class-name patterns.
    ///
    /// # Errors
    ///
    /// Returns [`DeltacovError::PatternCompile`] for the first pattern that
    /// is not a valid regular expression.
    pub fn new(packages: &[String], classes: &[String]) -> Result<Self, DeltacovError> {
        Ok(Self {
            packages: compile_all(packages)?,
            classes: compile_all(classes)?,
        })
    }

    /// Whether no pattern was supplied.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.classes.is_empty()
    }

    /// Whether `class` is excluded.
    pub fn excludes(&self, class: &ClassInfo) -> bool {
        self.packages.iter().any(|re| re.is_match(&class.package))
            || self.classes.iter().any(|re| re.is_match(&class.class_name))
    }

    /// Drop excluded classes, keeping the order of the rest.
    pub fn filter(&self, change_set: ChangeSet) -> ChangeSet {
        if self.is_empty() {
            return change_set;
        }
        let before = change_set.len();
        let kept: ChangeSet = change_set
            .into_classes()
            .into_iter()
            .filter(|class| !self.excludes(class))
            .collect();
        tracing::debug!(excluded = before - kept.len(), "applied exclusion patterns");
        kept
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, DeltacovError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
                DeltacovError::PatternCompile {
                    pattern: pattern.clone(),
                    source,
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltacov_core::ClassChange;

    fn class(package: &str, name: &str) -> ClassInfo {
        ClassInfo {
            class_name: name.into(),
            package: package.into(),
            change: ClassChange::Modify,
            methods: vec![],
            added_lines: vec![],
            deleted_lines: vec![],
            source_path: format!("src/main/java/{}/{name}.java", package.replace('.', "/")),
        }
    }

    fn sample() -> ChangeSet {
        vec![
            class("com.shop", "Cart"),
            class("com.shop.generated", "Stub"),
            class("com.shop.pay", "PaymentConfig"),
            class("com.shopping", "Basket"),
        ]
        .into_iter()
        .collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_patterns_are_identity() {
        let filter = ExclusionFilter::new(&[], &[]).unwrap();
        assert_eq!(filter.filter(sample()), sample());
    }

    #[test]
    fn package_patterns_match_whole_name() {
        let filter = ExclusionFilter::new(&strings(&["com\\.shop"]), &[]).unwrap();
        let kept = filter.filter(sample());
        let names: Vec<&str> = kept.iter().map(|c| c.class_name.as_str()).collect();
        assert_eq!(names, vec!["Stub", "PaymentConfig", "Basket"]);
    }

    #[test]
    fn alternation_is_anchored_as_a_whole() {
        let filter = ExclusionFilter::new(&strings(&["com\\.shop|com\\.shop\\.pay"]), &[]).unwrap();
        let kept = filter.filter(sample());
        assert!(kept
            .iter()
            .all(|c| c.package != "com.shop" && c.package != "com.shop.pay"));
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn no_kept_class_matches_a_package_pattern() {
        let patterns = strings(&["com\\.shop\\..*"]);
        let filter = ExclusionFilter::new(&patterns, &[]).unwrap();
        let kept = filter.filter(sample());
        let re = Regex::new("^(?:com\\.shop\\..*)$").unwrap();
        assert!(kept.iter().all(|c| !re.is_match(&c.package)));
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn class_patterns_match_simple_name() {
        let filter = ExclusionFilter::new(&[], &strings(&[".*Config", "Cart"])).unwrap();
        let kept = filter.filter(sample());
        let names: Vec<&str> = kept.iter().map(|c| c.class_name.as_str()).collect();
        assert_eq!(names, vec!["Stub", "Basket"]);
    }

    #[test]
    fn substring_is_not_a_match() {
        let filter = ExclusionFilter::new(&[], &strings(&["Pay"])).unwrap();
        assert_eq!(filter.filter(sample()).len(), 4);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = ExclusionFilter::new(&strings(&["ok", "(broken"]), &[]).unwrap_err();
        match err {
            DeltacovError::PatternCompile { pattern, .. } => assert_eq!(pattern, "(broken"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
