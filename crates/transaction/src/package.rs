//! Package records and the arena that owns them.
//!
//! Packages are identified by their [`PackageId`] handle, never by value:
//! two packages with the same name and version are still distinct if they
//! were added to the pool separately. Once added, a package is only ever
//! handed out by shared reference.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle to a package stored in a [`PackagePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageId(usize);

impl PackageId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of the package in its pool.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named dependency edge.
///
/// Resolving a link against a package set yields every package exposing
/// `target` among its names. The constraint is carried for display only;
/// version satisfaction was settled before planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Name the package depends on
    pub target: String,
    /// Original version constraint, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
}

impl Link {
    /// Create a link to `target` with no recorded constraint.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            constraint: None,
        }
    }

    /// Attach the constraint text.
    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Some(c) => write!(f, "{} {}", self.target, c),
            None => write!(f, "{}", self.target),
        }
    }
}

/// Whether a package is a real package or an alias of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageVariant {
    /// An installable package
    Concrete,
    /// A different name/version pair pointing at a concrete package
    Alias {
        /// The aliased package
        target: PackageId,
    },
}

/// Type tag given to ordinary packages.
pub const DEFAULT_PACKAGE_TYPE: &str = "library";

/// A package as seen by the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Primary name
    pub name: String,
    /// Normalized version string
    pub version: String,
    /// Type tag (e.g. "library", "composer-plugin", "composer-installer")
    pub package_type: String,
    /// Reference of the distribution archive, if any
    pub dist_reference: Option<String>,
    /// Reference of the source checkout, if any
    pub source_reference: Option<String>,
    /// Dependencies, in declaration order
    pub requires: Vec<Link>,
    /// Additional names this package replaces
    pub replaces: Vec<String>,
    /// Additional names this package provides
    pub provides: Vec<String>,
    /// Set for plugins that change how later packages are downloaded.
    /// Only honored for the refiner's download plugin types.
    pub modifies_downloads: bool,
    variant: PackageVariant,
}

impl Package {
    /// Create a concrete package of the default type.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            package_type: DEFAULT_PACKAGE_TYPE.to_string(),
            dist_reference: None,
            source_reference: None,
            requires: Vec::new(),
            replaces: Vec::new(),
            provides: Vec::new(),
            modifies_downloads: false,
            variant: PackageVariant::Concrete,
        }
    }

    /// Set the type tag.
    pub fn with_type(mut self, package_type: impl Into<String>) -> Self {
        self.package_type = package_type.into();
        self
    }

    /// Add a dependency on `target`.
    pub fn with_require(mut self, target: impl Into<String>) -> Self {
        self.requires.push(Link::new(target));
        self
    }

    /// Add a dependency link.
    pub fn with_link(mut self, link: Link) -> Self {
        self.requires.push(link);
        self
    }

    /// Set the distribution reference.
    pub fn with_dist_reference(mut self, reference: impl Into<String>) -> Self {
        self.dist_reference = Some(reference.into());
        self
    }

    /// Set the source reference.
    pub fn with_source_reference(mut self, reference: impl Into<String>) -> Self {
        self.source_reference = Some(reference.into());
        self
    }

    /// Add a replaced name.
    pub fn with_replace(mut self, name: impl Into<String>) -> Self {
        self.replaces.push(name.into());
        self
    }

    /// Add a provided name.
    pub fn with_provide(mut self, name: impl Into<String>) -> Self {
        self.provides.push(name.into());
        self
    }

    /// Mark the package as a download-modifying plugin.
    pub fn with_modifies_downloads(mut self, modifies: bool) -> Self {
        self.modifies_downloads = modifies;
        self
    }

    /// Concrete or alias.
    pub const fn variant(&self) -> PackageVariant {
        self.variant
    }

    /// The aliased package, if this is an alias.
    pub const fn alias_of(&self) -> Option<PackageId> {
        match self.variant {
            PackageVariant::Alias { target } => Some(target),
            PackageVariant::Concrete => None,
        }
    }

    /// Check if this package is an alias
    pub const fn is_alias(&self) -> bool {
        matches!(self.variant, PackageVariant::Alias { .. })
    }

    /// Every name this package answers to: its own, then replaced, then provided.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.replaces.iter().map(String::as_str))
            .chain(self.provides.iter().map(String::as_str))
    }

    /// Version for display; dev versions carry a short reference.
    pub fn pretty_version(&self) -> String {
        let reference = self
            .source_reference
            .as_deref()
            .or(self.dist_reference.as_deref());

        match reference {
            Some(r) if self.version.starts_with("dev-") && !r.is_empty() => {
                let short: String = r.chars().take(7).collect();
                format!("{} {}", self.version, short)
            }
            _ => self.version.clone(),
        }
    }

    /// `name (version)` for messages.
    pub fn pretty_string(&self) -> String {
        format!("{} ({})", self.name, self.pretty_version())
    }
}

/// Append-only arena of packages.
///
/// All planner maps key off the handles returned here.
#[derive(Debug, Clone, Default)]
pub struct PackagePool {
    packages: Vec<Package>,
}

impl PackagePool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a concrete package and return its handle.
    pub fn add(&mut self, package: Package) -> Result<PackageId> {
        if package.name.is_empty() {
            return Err(Error::EmptyName);
        }
        Ok(self.push(Package {
            variant: PackageVariant::Concrete,
            ..package
        }))
    }

    /// Alias `target` under its own name with a different version.
    pub fn add_alias(&mut self, target: PackageId, version: impl Into<String>) -> Result<PackageId> {
        let name = self.get(target).ok_or(Error::UnknownPackage(target))?.name.clone();
        self.add_alias_named(target, name, version)
    }

    /// Alias `target` under an explicit name and version.
    ///
    /// The alias inherits the target's type, references, requires, replaces
    /// and provides.
    pub fn add_alias_named(
        &mut self,
        target: PackageId,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<PackageId> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }

        let aliased = self.get(target).ok_or(Error::UnknownPackage(target))?;
        if aliased.is_alias() {
            return Err(Error::NestedAlias {
                alias: name,
                target: aliased.name.clone(),
            });
        }

        let alias = Package {
            name,
            version: version.into(),
            variant: PackageVariant::Alias { target },
            ..aliased.clone()
        };
        Ok(self.push(alias))
    }

    fn push(&mut self, package: Package) -> PackageId {
        let id = PackageId::new(self.packages.len());
        log::trace!("pool: {} = {}", id, package.pretty_string());
        self.packages.push(package);
        id
    }

    /// Look up a package by handle
    pub fn get(&self, id: PackageId) -> Option<&Package> {
        self.packages.get(id.index())
    }

    /// Whether `id` was issued by this pool
    pub fn contains(&self, id: PackageId) -> bool {
        id.index() < self.packages.len()
    }

    /// Number of packages in the pool
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Check if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Iterate over all handles and packages in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (PackageId, &Package)> {
        self.packages
            .iter()
            .enumerate()
            .map(|(i, p)| (PackageId::new(i), p))
    }
}

impl std::ops::Index<PackageId> for PackagePool {
    type Output = Package;

    /// # Panics
    ///
    /// Panics if `id` was not issued by this pool. Callers inside the crate
    /// only index with handles already checked by [`PackagePool::contains`].
    fn index(&self, id: PackageId) -> &Package {
        &self.packages[id.index()]
    }
}
