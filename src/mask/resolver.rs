//! Mask resolution: which rules apply to a method and path

use crate::config::MaskRule;
use crate::matcher;
use http::Method;

/// Select the rules that apply to `method` on `path`
///
/// Declaration order is preserved and nothing is deduplicated; a field named
/// by several rules is masked by each of them in turn.
pub fn resolve<'a>(rules: &'a [MaskRule], method: &Method, path: &str) -> Vec<&'a MaskRule> {
    rules
        .iter()
        .filter(|rule| rule.method.as_ref().is_none_or(|m| m == method))
        .filter(|rule| matcher::matches(&rule.path_matcher, path))
        .collect()
}
