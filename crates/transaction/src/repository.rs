//! Package sources consumed by the planner.
//!
//! The planner never enumerates installed or locked packages itself. A
//! repository only has to hand over its package handles.

use crate::package::PackageId;

/// A read-only collection of packages.
pub trait Repository {
    /// Handles of every package in this repository.
    fn packages(&self) -> &[PackageId];
}

/// Repository backed by a plain list of handles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayRepository {
    packages: Vec<PackageId>,
}

impl ArrayRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package handle.
    pub fn add(&mut self, id: PackageId) {
        self.packages.push(id);
    }

    /// Check if the repository holds no packages
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Number of package handles
    pub fn len(&self) -> usize {
        self.packages.len()
    }
}

impl Repository for ArrayRepository {
    fn packages(&self) -> &[PackageId] {
        &self.packages
    }
}

impl From<Vec<PackageId>> for ArrayRepository {
    fn from(packages: Vec<PackageId>) -> Self {
        Self { packages }
    }
}

impl FromIterator<PackageId> for ArrayRepository {
    fn from_iter<I: IntoIterator<Item = PackageId>>(iter: I) -> Self {
        Self {
            packages: iter.into_iter().collect(),
        }
    }
}
