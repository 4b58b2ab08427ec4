//! Specifier comparison.
//!
//! Specifiers are compared as text with a small numeric heuristic. This is not semantic-version
//! range resolution: `^4.1.0` and `4.1.0` are different specifiers, and pre-release or build
//! metadata gets no special treatment. Swap in another [`SpecifierScheme`] to change that without
//! touching the rest of the engine.

use std::cmp::Ordering;

/// How specifiers are grouped into majors and ordered.
pub trait SpecifierScheme {
    /// Token used to decide whether two specifiers disagree on the major version.
    fn major_token(&self, specifier: &str) -> String;

    /// Total order over specifiers; `Greater` means "newer".
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

/// Strip leading range operators, then compare dot-segments numerically where possible.
///
/// - `major_token("^4.17.21") == "4"`, `major_token(">= 10.0") == "10"`
/// - `compare("10.0.0", "9.0.0") == Greater`
/// - A specifier with no digits (`*`, `latest`) has an empty major token and sorts lowest.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScheme;

impl HeuristicScheme {
    pub fn strip_range_prefix(specifier: &str) -> &str {
        specifier.trim_start_matches(|c: char| !c.is_ascii_digit())
    }
}

impl SpecifierScheme for HeuristicScheme {
    fn major_token(&self, specifier: &str) -> String {
        let stripped = Self::strip_range_prefix(specifier);
        match stripped.find('.') {
            Some(dot) => stripped[..dot].to_string(),
            None => stripped.to_string(),
        }
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        let mut left = Self::strip_range_prefix(a).split('.');
        let mut right = Self::strip_range_prefix(b).split('.');
        loop {
            match (left.next(), right.next()) {
                (None, None) => return Ordering::Equal,
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                (Some(l), Some(r)) => {
                    let ord = compare_segment(l, r);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
            }
        }
    }
}

/// Leading digit run compared as an integer of arbitrary width, remainder as plain text.
fn compare_segment(a: &str, b: &str) -> Ordering {
    let (a_num, a_rest) = split_digits(a);
    let (b_num, b_rest) = split_digits(b);

    let num = match (a_num.is_empty(), b_num.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => {
            let a_num = a_num.trim_start_matches('0');
            let b_num = b_num.trim_start_matches('0');
            a_num.len().cmp(&b_num.len()).then_with(|| a_num.cmp(b_num))
        }
    };
    num.then_with(|| a_rest.cmp(b_rest))
}

fn split_digits(segment: &str) -> (&str, &str) {
    let end = segment
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(segment.len());
    segment.split_at(end)
}
