//! Glob-based path exclusion.
//!
//! Paths are matched exactly as `git diff --numstat` prints them: relative
//! to the repository root and `/`-separated. `*` and `?` stay inside one
//! path component, `**` crosses components, and names starting with a dot
//! are only matched by patterns that spell the dot out.

use glob::{MatchOptions, Pattern};
use nanny_core::NannyError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// An ordered set of exclusion patterns.
///
/// # Examples
///
/// ```
/// use nanny_difflens::filter::ExcludeSet;
///
/// let excludes = ExcludeSet::new(["*.lock", "**/*.snap"]).unwrap();
/// assert!(excludes.is_excluded("yarn.lock"));
/// assert!(excludes.is_excluded("src/__snapshots__/app.snap"));
/// assert!(!excludes.is_excluded("src/main.rs"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    patterns: Vec<Pattern>,
}

impl ExcludeSet {
    /// A set that excludes nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile `patterns`, failing on the first invalid one.
    ///
    /// # Errors
    ///
    /// Returns [`NannyError::InvalidGlob`] naming the offending pattern.
    ///
    /// # Examples
    ///
    /// ```
    /// use nanny_difflens::filter::ExcludeSet;
    ///
    /// assert!(ExcludeSet::new(["[unclosed"]).is_err());
    /// ```
    pub fn new<I, S>(patterns: I) -> Result<Self, NannyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let pat = Pattern::new(pattern).map_err(|e| NannyError::InvalidGlob {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
            compiled.push(pat);
        }
        Ok(Self { patterns: compiled })
    }

    /// Compile `patterns`, skipping invalid ones with a warning.
    ///
    /// Used by the long-running pipeline, where a typo in one pattern must
    /// not stop the status from updating.
    ///
    /// # Examples
    ///
    /// ```
    /// use nanny_difflens::filter::ExcludeSet;
    ///
    /// let excludes = ExcludeSet::lenient(["[unclosed", "*.lock"]);
    /// assert_eq!(excludes.len(), 1);
    /// ```
    pub fn lenient<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            match Pattern::new(pattern) {
                Ok(pat) => compiled.push(pat),
                Err(e) => tracing::warn!(pattern, error = %e, "ignoring invalid exclude pattern"),
            }
        }
        Self { patterns: compiled }
    }

    /// Whether `path` matches at least one pattern.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.matching_pattern(path).is_some()
    }

    /// The first pattern that matches `path`, if any.
    pub fn matching_pattern(&self, path: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|pat| pat.matches_with(path, MATCH_OPTIONS))
            .map(Pattern::as_str)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_excludes_nothing() {
        let excludes = ExcludeSet::empty();
        assert!(excludes.is_empty());
        assert!(!excludes.is_excluded("yarn.lock"));
        assert!(!excludes.is_excluded(""));
    }

    #[test]
    fn literal_pattern_matches_only_itself() {
        let excludes = ExcludeSet::new(["Cargo.lock"]).unwrap();
        assert!(excludes.is_excluded("Cargo.lock"));
        assert!(!excludes.is_excluded("crates/core/Cargo.lock"));
        assert!(!excludes.is_excluded("Cargo.lock.orig"));
        assert!(!excludes.is_excluded("cargo.lock"));
    }

    #[test]
    fn star_stays_within_one_component() {
        let excludes = ExcludeSet::new(["*.lock"]).unwrap();
        assert!(excludes.is_excluded("yarn.lock"));
        assert!(!excludes.is_excluded("src/yarn.lock.bak"));
        assert!(!excludes.is_excluded("src/yarn.lock"));
    }

    #[test]
    fn double_star_crosses_components() {
        let excludes = ExcludeSet::new(["**/*.lock"]).unwrap();
        assert!(excludes.is_excluded("a/b/yarn.lock"));
        assert!(excludes.is_excluded("a/Cargo.lock"));
        assert!(!excludes.is_excluded("a/b/yarn.lock.bak"));
    }

    #[test]
    fn question_mark_and_classes() {
        let excludes = ExcludeSet::new(["v?.json", "build/[ab]*.js"]).unwrap();
        assert!(excludes.is_excluded("v1.json"));
        assert!(!excludes.is_excluded("v10.json"));
        assert!(excludes.is_excluded("build/app.js"));
        assert!(excludes.is_excluded("build/bundle.js"));
        assert!(!excludes.is_excluded("build/chunk.js"));
    }

    #[test]
    fn dotfiles_need_an_explicit_dot() {
        let excludes = ExcludeSet::new(["*.yml"]).unwrap();
        assert!(excludes.is_excluded("ci.yml"));
        assert!(!excludes.is_excluded(".travis.yml"));

        let excludes = ExcludeSet::new([".*.yml"]).unwrap();
        assert!(excludes.is_excluded(".travis.yml"));
    }

    #[test]
    fn first_matching_pattern_reported() {
        let excludes = ExcludeSet::new(["docs/*.md", "*.md"]).unwrap();
        assert_eq!(excludes.matching_pattern("docs/intro.md"), Some("docs/*.md"));
        assert_eq!(excludes.matching_pattern("README.md"), Some("*.md"));
        assert_eq!(excludes.matching_pattern("src/lib.rs"), None);
    }

    #[test]
    fn strict_constructor_reports_bad_pattern() {
        let result = ExcludeSet::new(["*.lock", "[invalid"]);
        match result {
            Err(NannyError::InvalidGlob { pattern, .. }) => assert_eq!(pattern, "[invalid"),
            other => panic!("expected InvalidGlob error, got {other:?}"),
        }
    }

    #[test]
    fn lenient_constructor_keeps_valid_patterns() {
        let excludes = ExcludeSet::lenient(vec!["[invalid".to_string(), "*.lock".to_string()]);
        assert_eq!(excludes.len(), 1);
        assert!(excludes.is_excluded("poetry.lock"));
    }
}
