//! Operations emitted by the planner.

use crate::package::{Package, PackageId, PackagePool};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// One step of a transaction.
///
/// Operations carry package handles only; resolve them through the
/// [`PackagePool`] the transaction was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Install a package that is not present
    Install(PackageId),
    /// Replace a present package with a different build of the same name
    Update {
        /// Package currently present
        from: PackageId,
        /// Package replacing it
        to: PackageId,
    },
    /// Remove a present package
    Uninstall(PackageId),
    /// Record an alias as installed
    MarkAliasInstalled(PackageId),
    /// Record an alias as no longer installed
    MarkAliasUninstalled(PackageId),
}

/// The tag of an [`Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    Install,
    Update,
    Uninstall,
    MarkAliasInstalled,
    MarkAliasUninstalled,
}

impl OperationKind {
    /// Stable identifier of the operation type.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Update => "update",
            Self::Uninstall => "uninstall",
            Self::MarkAliasInstalled => "markAliasInstalled",
            Self::MarkAliasUninstalled => "markAliasUninstalled",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Operation {
    /// The operation's tag
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Install(_) => OperationKind::Install,
            Self::Update { .. } => OperationKind::Update,
            Self::Uninstall(_) => OperationKind::Uninstall,
            Self::MarkAliasInstalled(_) => OperationKind::MarkAliasInstalled,
            Self::MarkAliasUninstalled(_) => OperationKind::MarkAliasUninstalled,
        }
    }

    /// The package the operation acts on. For updates, the new package.
    pub const fn package(&self) -> PackageId {
        match *self {
            Self::Install(id)
            | Self::Uninstall(id)
            | Self::MarkAliasInstalled(id)
            | Self::MarkAliasUninstalled(id) => id,
            Self::Update { to, .. } => to,
        }
    }

    /// The package being installed or updated to, if any.
    pub const fn installed_package(&self) -> Option<PackageId> {
        match *self {
            Self::Install(id) | Self::Update { to: id, .. } => Some(id),
            _ => None,
        }
    }

    /// Whether this operation takes something away from the environment.
    pub const fn is_removal(&self) -> bool {
        matches!(self, Self::Uninstall(_) | Self::MarkAliasUninstalled(_))
    }

    /// Human readable description, e.g. `Installing a (1.0.0)`.
    ///
    /// With `lock` set, installs read as `Locking` since nothing is written
    /// to disk for lock-only transactions.
    pub fn show(&self, pool: &PackagePool, lock: bool) -> String {
        match *self {
            Self::Install(id) => {
                let verb = if lock { "Locking" } else { "Installing" };
                format!("{} {}", verb, pool[id].pretty_string())
            }
            Self::Update { from, to } => show_update(&pool[from], &pool[to]),
            Self::Uninstall(id) => format!("Removing {}", pool[id].pretty_string()),
            Self::MarkAliasInstalled(id) => show_alias(pool, id, "installed"),
            Self::MarkAliasUninstalled(id) => show_alias(pool, id, "uninstalled"),
        }
    }
}

fn show_alias(pool: &PackagePool, id: PackageId, state: &str) -> String {
    let alias = &pool[id];
    match alias.alias_of() {
        Some(target) => format!(
            "Marking {} as {}, alias of {}",
            alias.pretty_string(),
            state,
            pool[target].pretty_string()
        ),
        None => format!("Marking {} as {}", alias.pretty_string(), state),
    }
}

fn show_update(from: &Package, to: &Package) -> String {
    let mut from_version = from.pretty_version();
    let mut to_version = to.pretty_version();

    // Same version string: the references are what changed
    if from_version == to_version {
        let refs = if from.source_reference != to.source_reference {
            (from.source_reference.as_deref(), to.source_reference.as_deref())
        } else {
            (from.dist_reference.as_deref(), to.dist_reference.as_deref())
        };
        if let (Some(a), Some(b)) = refs {
            from_version = format!("{} {}", from.version, short_reference(a));
            to_version = format!("{} {}", to.version, short_reference(b));
        }
    }

    format!(
        "{} {} ({} => {})",
        update_verb(&from.version, &to.version),
        to.name,
        from_version,
        to_version
    )
}

fn short_reference(reference: &str) -> String {
    reference.chars().take(7).collect()
}

fn update_verb(from: &str, to: &str) -> &'static str {
    match (parse_version(from), parse_version(to)) {
        (Some(a), Some(b)) => match b.cmp(&a) {
            Ordering::Less => "Downgrading",
            Ordering::Equal | Ordering::Greater => "Upgrading",
        },
        _ => "Updating",
    }
}

fn parse_version(version: &str) -> Option<semver::Version> {
    let trimmed = version.strip_prefix('v').unwrap_or(version);
    semver::Version::parse(trimmed).ok()
}

/// Counts of operations by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    /// Number of packages to install
    pub installs: usize,
    /// Number of packages to update
    pub updates: usize,
    /// Number of packages to remove
    pub removals: usize,
    /// Number of alias markers to add or drop
    pub alias_marks: usize,
}

impl PlanSummary {
    /// Create a summary from a list of operations
    pub fn from_operations(operations: &[Operation]) -> Self {
        let mut summary = Self::default();
        for op in operations {
            match op.kind() {
                OperationKind::Install => summary.installs += 1,
                OperationKind::Update => summary.updates += 1,
                OperationKind::Uninstall => summary.removals += 1,
                OperationKind::MarkAliasInstalled | OperationKind::MarkAliasUninstalled => {
                    summary.alias_marks += 1;
                }
            }
        }
        summary
    }

    /// Total number of operations
    pub const fn total(&self) -> usize {
        self.installs + self.updates + self.removals + self.alias_marks
    }

    /// Check if there are any changes
    pub const fn has_changes(&self) -> bool {
        self.total() > 0
    }
}
