//! Deterministic package ordering.
//!
//! Result maps and provider groups are sorted with [`compare_packages`]:
//! name descending; for equal names an alias sorts immediately before its
//! non-alias counterpart; otherwise version descending. Cycle tie-breaking
//! downstream depends on this exact order.
//!
//! Distinct packages that compare equal (same name, version and variant) are
//! finally ordered by handle, so sorting never depends on input order.

use crate::package::{Package, PackageId, PackagePool};
use std::cmp::Ordering;

/// Total order over packages used for every planner map.
pub fn compare_packages(a: &Package, b: &Package) -> Ordering {
    if a.name == b.name {
        if a.is_alias() != b.is_alias() {
            return if a.is_alias() {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        return b.version.cmp(&a.version);
    }
    b.name.cmp(&a.name)
}

/// Sort handles in place with [`compare_packages`], then by handle.
///
/// Handles must belong to `pool`.
pub fn sort_handles(pool: &PackagePool, handles: &mut [PackageId]) {
    handles.sort_by(|&a, &b| compare_packages(&pool[a], &pool[b]).then_with(|| a.cmp(&b)));
}
