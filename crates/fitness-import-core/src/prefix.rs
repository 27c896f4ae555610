//! Segment-aware dotted-name prefix matching.

/// Returns `true` if `name` equals `prefix` or extends it at a `.` boundary.
///
/// `"pkg.sub"` matches `"pkg"`; `"pkgfoo"` does not.
#[must_use]
pub fn matches_prefix(name: &str, prefix: &str) -> bool {
    match name.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

/// Returns the first entry of `prefixes` that `name` matches.
#[must_use]
pub fn first_match<'a, I>(name: &str, prefixes: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    prefixes
        .into_iter()
        .map(String::as_str)
        .find(|p| matches_prefix(name, p))
}
