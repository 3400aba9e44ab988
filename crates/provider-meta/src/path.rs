//! Canonical namespace paths.
//!
//! Every namespace that reaches the client cache goes through [`build_path`], so
//! `"/foo/"` and `"foo"` always land on the same cache key.

use crate::consts::PATH_DELIM;

/// Joins a root namespace and a requested namespace into one canonical path.
///
/// Leading and trailing separators are trimmed from each segment independently.
/// An empty root yields the trimmed requested namespace; an empty requested
/// namespace yields the trimmed root.
///
/// ```
/// use provider_meta::path::build_path;
///
/// assert_eq!(build_path("bar", "/foo/"), "bar/foo");
/// assert_eq!(build_path("", "foo"), "foo");
/// assert_eq!(build_path("/bar/", ""), "bar");
/// ```
pub fn build_path(root: &str, requested: &str) -> String {
    let root = root.trim_matches(PATH_DELIM);
    let requested = requested.trim_matches(PATH_DELIM);

    match (root.is_empty(), requested.is_empty()) {
        (true, _) => requested.to_string(),
        (false, true) => root.to_string(),
        (false, false) => format!("{root}{PATH_DELIM}{requested}"),
    }
}
