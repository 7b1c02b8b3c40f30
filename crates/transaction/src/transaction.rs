//! Transaction objects caching their computed operations.

use crate::error::Result;
use crate::operation::{Operation, PlanSummary};
use crate::package::{PackageId, PackagePool};
use crate::planner::TransactionPlanner;
use crate::refiner::{LocalOrderRefiner, RefinerConfig};
use crate::repository::Repository;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the transaction is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Packages are really installed into a local environment
    Local,
    /// Only the lock file is updated
    Lock,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Lock => write!(f, "lock"),
        }
    }
}

/// The ordered operations between two package sets.
///
/// Operations are computed once when the transaction is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    kind: TransactionKind,
    operations: Vec<Operation>,
}

impl Transaction {
    /// Plan a lock transaction: the planner's order, unrefined.
    pub fn new(pool: &PackagePool, present: &[PackageId], result: &[PackageId]) -> Self {
        let operations = TransactionPlanner::new(pool, present, result).compute();
        Self {
            kind: TransactionKind::Lock,
            operations,
        }
    }

    /// Plan installing `locked` over the `installed` repository.
    ///
    /// Fails only if the refiner configuration is invalid.
    pub fn local<L, I>(
        pool: &PackagePool,
        locked: &L,
        installed: &I,
        config: &RefinerConfig,
    ) -> Result<Self>
    where
        L: Repository + ?Sized,
        I: Repository + ?Sized,
    {
        let refiner = LocalOrderRefiner::new(config)?;
        Ok(Self::local_with(pool, locked, installed, &refiner))
    }

    /// Like [`Transaction::local`] with an already built refiner.
    pub fn local_with<L, I>(
        pool: &PackagePool,
        locked: &L,
        installed: &I,
        refiner: &LocalOrderRefiner,
    ) -> Self
    where
        L: Repository + ?Sized,
        I: Repository + ?Sized,
    {
        let planned =
            TransactionPlanner::new(pool, installed.packages(), locked.packages()).compute();
        let operations = refiner.refine(pool, planned);
        Self {
            kind: TransactionKind::Local,
            operations,
        }
    }

    /// Local or lock
    pub const fn kind(&self) -> TransactionKind {
        self.kind
    }

    /// The ordered operations
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Check if nothing needs to change
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Counts by operation kind
    pub fn summary(&self) -> PlanSummary {
        PlanSummary::from_operations(&self.operations)
    }

    /// One human readable line per operation.
    pub fn describe(&self, pool: &PackagePool) -> Vec<String> {
        let lock = self.kind == TransactionKind::Lock;
        self.operations
            .iter()
            .map(|op| op.show(pool, lock))
            .collect()
    }
}

impl IntoIterator for Transaction {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}
