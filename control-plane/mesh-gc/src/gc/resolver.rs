use std::collections::BTreeSet;

use super::catalog::ResourceDescriptor;

/// Whether no active release still requires `desc`. Entries required by no
/// release at all are always unused.
pub fn is_unused(desc: &ResourceDescriptor, active: &BTreeSet<String>) -> bool {
    !desc
        .required_by
        .iter()
        .any(|v| active.contains(v.as_str()))
}

pub fn deletion_candidates<'a>(
    catalog: &'a [ResourceDescriptor],
    active: &BTreeSet<String>,
) -> impl Iterator<Item = &'a ResourceDescriptor> {
    catalog.iter().filter(move |d| is_unused(d, active))
}
