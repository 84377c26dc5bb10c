use std::fmt;
use std::path::Path;
use regex::Regex;

use error::*;

pub trait PathRule: fmt::Debug {
    fn path_matches_rule(&self, path: &Path) -> bool;
}

/// Matches paths whose full string form ends with the suffix.
///
/// This is a raw string comparison, not an extension check: `.go` matches
/// `x.pb.go` but not `foo.cgo`, while `go` matches both.
#[derive(Debug, Clone)]
pub struct SuffixRule {
    suffix: String,
}

impl SuffixRule {
    pub fn new(suffix: &str) -> SuffixRule {
        SuffixRule { suffix: suffix.to_string() }
    }

    /// An empty suffix means "no filter".
    pub fn from_optional(suffix: Option<&str>) -> Option<SuffixRule> {
        match suffix {
            Some(suffix) if !suffix.is_empty() => Some(SuffixRule::new(suffix)),
            _ => None
        }
    }
}

impl PathRule for SuffixRule {
    fn path_matches_rule(&self, path: &Path) -> bool {
        path.to_string_lossy().ends_with(&self.suffix)
    }
}

/// Matches paths where the regex is found anywhere in the full path.
#[derive(Debug, Clone)]
pub struct SkipRule {
    rule: Regex,
}

impl SkipRule {
    pub fn new(regex: Regex) -> SkipRule {
        SkipRule { rule: regex }
    }

    pub fn parse(pattern: &str) -> Result<SkipRule> {
        let regex = Regex::new(pattern)
            .chain_err(|| format!("Unable to parse skip pattern {}", pattern))?;
        Ok(SkipRule::new(regex))
    }
}

impl PathRule for SkipRule {
    fn path_matches_rule(&self, path: &Path) -> bool {
        self.rule.is_match(&path.to_string_lossy())
    }
}
