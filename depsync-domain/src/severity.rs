use crate::specifier::SpecifierScheme;
use depsync_types::conflict::Severity;
use std::collections::BTreeSet;

/// Classify a disagreement between `specifiers` (distinct, two or more).
///
/// - `High`: the specifiers span more than one major token.
/// - `Medium`: one major token, more than two specifiers.
/// - `Low`: one major token, exactly two specifiers.
pub fn classify<'a>(
    specifiers: impl IntoIterator<Item = &'a str>,
    scheme: &dyn SpecifierScheme,
) -> Severity {
    let mut count = 0usize;
    let mut majors = BTreeSet::new();
    for spec in specifiers {
        count += 1;
        majors.insert(scheme.major_token(spec));
    }

    if majors.len() > 1 {
        Severity::High
    } else if count > 2 {
        Severity::Medium
    } else {
        Severity::Low
    }
}
