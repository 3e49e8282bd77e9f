/// Orthography filtering for generated name fragments.
///
/// Concatenated fragments do not always read like real place names. A
/// filter either repairs a candidate or rejects it outright.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::fragment::{combine, Fragment};
use crate::core::grammar::GrammarError;

/// Repair or reject a candidate string. `None` means rejected.
pub trait Orthography {
    fn repair(&self, candidate: &str) -> Option<String>;
}

/// Accepts everything unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl Orthography for AcceptAll {
    fn repair(&self, candidate: &str) -> Option<String> {
        Some(candidate.to_string())
    }
}

/// One filter rule as written in a project file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    pub pattern: String,
    /// Replacement in `regex` syntax (`$1`, `${name}`); `None` rejects.
    #[serde(default)]
    pub replace: Option<String>,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    regex: Regex,
    replace: Option<String>,
}

/// Ordered list of regex rules. Each rule sees the output of the rules
/// before it; the first matching reject rule discards the candidate.
#[derive(Debug, Clone, Default)]
pub struct PatternFilter {
    rules: Vec<CompiledRule>,
}

impl PatternFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: &[PatternRule]) -> Result<Self, GrammarError> {
        let mut filter = Self::new();
        for rule in rules {
            filter = match &rule.replace {
                Some(replacement) => filter.rewrite(&rule.pattern, replacement)?,
                None => filter.reject(&rule.pattern)?,
            };
        }
        Ok(filter)
    }

    pub fn rewrite(mut self, pattern: &str, replacement: &str) -> Result<Self, GrammarError> {
        self.rules.push(CompiledRule {
            regex: Regex::new(pattern)?,
            replace: Some(replacement.to_string()),
        });
        Ok(self)
    }

    pub fn reject(mut self, pattern: &str) -> Result<Self, GrammarError> {
        self.rules.push(CompiledRule {
            regex: Regex::new(pattern)?,
            replace: None,
        });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Orthography for PatternFilter {
    fn repair(&self, candidate: &str) -> Option<String> {
        let mut name = candidate.to_string();
        for rule in &self.rules {
            if !rule.regex.is_match(&name) {
                continue;
            }
            match &rule.replace {
                Some(replacement) => {
                    name = rule.regex.replace_all(&name, replacement.as_str()).into_owned();
                }
                None => {
                    log::trace!("rejected '{}' by /{}/", candidate, rule.regex);
                    return None;
                }
            }
        }
        Some(name)
    }
}

/// Every concatenation of one fragment from each list, in order, passed
/// through `filter`. Rejected candidates are dropped.
pub fn product<F: Orthography + ?Sized>(lists: &[Vec<String>], filter: &F) -> Vec<String> {
    let fragments: Vec<Vec<Fragment>> = lists
        .iter()
        .map(|list| list.iter().map(|s| Fragment::plain(s.clone())).collect())
        .collect();
    combine(&fragments, filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_filter() -> PatternFilter {
        PatternFilter::new()
            .rewrite("([^Gg])ea([bcdfgjklmnpqrstvwxyz])", "${1}a${2}")
            .unwrap()
            .rewrite("ncc", "nc")
            .unwrap()
            .reject("dv")
            .unwrap()
            .reject("nch")
            .unwrap()
    }

    #[test]
    fn rewrite_rules_apply() {
        let f = sample_filter();
        assert_eq!(f.repair("Vigneac").as_deref(), Some("Vignac"));
        assert_eq!(f.repair("Geac").as_deref(), Some("Geac"));
        assert_eq!(f.repair("Lancce").as_deref(), Some("Lance"));
    }

    #[test]
    fn reject_rules_discard() {
        let f = sample_filter();
        assert!(f.repair("Adve").is_none());
        assert_eq!(f.repair("Ardes").as_deref(), Some("Ardes"));
    }

    #[test]
    fn rules_see_earlier_rewrites() {
        // "nccha" becomes "ncha" and is then rejected by /nch/
        let f = sample_filter();
        assert!(f.repair("Bnccha").is_none());
    }

    #[test]
    fn from_rules_builds_in_order() {
        let rules = vec![
            PatternRule {
                pattern: "tn".to_string(),
                replace: Some("ten".to_string()),
            },
            PatternRule {
                pattern: "ten$".to_string(),
                replace: None,
            },
        ];
        let f = PatternFilter::from_rules(&rules).unwrap();
        assert_eq!(f.len(), 2);
        assert!(f.repair("Artn").is_none());
        assert_eq!(f.repair("Artne").as_deref(), Some("Artene"));
    }

    #[test]
    fn bad_pattern_is_an_error() {
        assert!(PatternFilter::new().reject("(unclosed").is_err());
    }

    #[test]
    fn product_concatenates_and_filters() {
        let lists = vec![
            vec!["Ad".to_string(), "Ill".to_string()],
            vec!["ne".to_string(), "ve".to_string()],
        ];
        let all = product(&lists, &AcceptAll);
        assert_eq!(all, vec!["Adne", "Adve", "Illne", "Illve"]);

        let filtered = product(&lists, &sample_filter());
        assert_eq!(filtered, vec!["Adne", "Illne", "Illve"]);
    }

    #[test]
    fn product_of_nothing_is_empty() {
        assert!(product(&[], &AcceptAll).is_empty());
    }
}
