//! # transaction
//!
//! Computes the ordered install, update and uninstall operations that turn
//! one package set into another.
//!
//! A solver has already decided which packages should exist. This crate
//! only answers *in what order* to get there:
//!
//! - [`TransactionPlanner`] diffs the present set against the result set and
//!   walks the result's dependency graph so dependencies come first, even
//!   when the graph has cycles.
//! - [`LocalOrderRefiner`] reorders that output for installs into a local
//!   environment: installer plugins (and what they need) first, removals
//!   before everything.
//!
//! ## Example
//!
//! ```
//! use transaction::{ArrayRepository, Operation, Package, PackagePool, RefinerConfig, Transaction};
//!
//! let mut pool = PackagePool::new();
//! let installed_a = pool.add(Package::new("a", "1.0.0")).unwrap();
//! let locked_a = pool.add(Package::new("a", "2.0.0").with_require("b")).unwrap();
//! let locked_b = pool.add(Package::new("b", "1.0.0")).unwrap();
//!
//! let installed = ArrayRepository::from(vec![installed_a]);
//! let locked = ArrayRepository::from(vec![locked_a, locked_b]);
//! let tx = Transaction::local(&pool, &locked, &installed, &RefinerConfig::default()).unwrap();
//!
//! assert_eq!(
//!     tx.operations(),
//!     &[
//!         Operation::Install(locked_b),
//!         Operation::Update { from: installed_a, to: locked_a },
//!     ]
//! );
//! assert_eq!(tx.describe(&pool)[1], "Upgrading a (1.0.0 => 2.0.0)");
//! ```
//!
//! ## Identity
//!
//! Packages live in a [`PackagePool`] and are referred to by [`PackageId`]
//! handles. Two packages with equal fields are still different packages,
//! which is what lets an update carry both the old and the new build of a
//! name.

pub mod error;
pub mod operation;
pub mod ordering;
pub mod package;
pub mod planner;
pub mod platform;
pub mod refiner;
pub mod repository;
pub mod transaction;

// Re-export main types at crate root
pub use error::{Error, Result};
pub use operation::{Operation, OperationKind, PlanSummary};
pub use ordering::{compare_packages, sort_handles};
pub use package::{DEFAULT_PACKAGE_TYPE, Link, Package, PackageId, PackagePool, PackageVariant};
pub use planner::{TransactionPlanner, compute};
pub use platform::{DEFAULT_PLATFORM_PATTERN, PlatformMatcher};
pub use refiner::{LocalOrderRefiner, RefinerConfig, move_removals_to_front};
pub use repository::{ArrayRepository, Repository};
pub use transaction::{Transaction, TransactionKind};
