use std::collections::{BTreeSet, HashSet};

/// Substring that marks a nightly/unstable build.
pub const UNSTABLE_MARKER: &str = "unstable";

/// Names in `remote` that are not in `local`, in `remote` order.
///
/// With `include_unstable == false` every name containing `"unstable"` is
/// dropped as well. Repeated remote names only appear once.
pub fn compute_missing(
    remote: &[String],
    local: &BTreeSet<String>,
    include_unstable: bool,
) -> Vec<String> {
    let mut seen = HashSet::new();
    remote
        .iter()
        .filter(|name| !local.contains(*name))
        .filter(|name| include_unstable || !name.contains(UNSTABLE_MARKER))
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}
