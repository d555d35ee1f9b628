//! Which module identifiers the hook instruments

use snitch_config::HookConfig;
use std::fmt;
use std::path::PathBuf;

/// Outcome of the filter checks, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Apply,
    /// Contains an exclude token.
    Excluded,
    /// Contains no include token.
    IncludeMismatch,
    /// Packages only, and the module is not inside one.
    PackagingMismatch,
}

impl FilterDecision {
    pub fn applies(&self) -> bool {
        *self == FilterDecision::Apply
    }
}

impl fmt::Display for FilterDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FilterDecision::Apply => "apply",
            FilterDecision::Excluded => "excluded",
            FilterDecision::IncludeMismatch => "include mismatch",
            FilterDecision::PackagingMismatch => "not in a package",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    include: Vec<String>,
    exclude: Vec<String>,
    restrict_to_packages: bool,
}

impl FilterSet {
    pub fn from_config(config: &HookConfig) -> Self {
        Self {
            include: config.include.clone(),
            exclude: config.exclude.clone(),
            restrict_to_packages: config.restrict_to_packages,
        }
    }

    /// Exclusion wins over inclusion; an empty include list matches all.
    pub fn decide(&self, id: &str, search_path: Option<&[PathBuf]>) -> FilterDecision {
        let mentions = |tokens: &[String]| tokens.iter().any(|token| id.contains(token.as_str()));
        if mentions(&self.exclude) {
            return FilterDecision::Excluded;
        }
        if !self.include.is_empty() && !mentions(&self.include) {
            return FilterDecision::IncludeMismatch;
        }
        if self.restrict_to_packages && search_path.map_or(true, <[PathBuf]>::is_empty) {
            return FilterDecision::PackagingMismatch;
        }
        FilterDecision::Apply
    }
}
