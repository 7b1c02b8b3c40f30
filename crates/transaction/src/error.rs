//! Error types for transaction construction.
//!
//! Planning and refining are total: once a [`PackagePool`](crate::PackagePool)
//! and its package sets exist, computing operations cannot fail. Errors only
//! surface while building the pool or loading configuration.

use crate::package::PackageId;
use thiserror::Error;

/// Errors that can occur while assembling packages or configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// A handle does not refer to a package in the pool
    #[error("unknown package handle: {0}")]
    UnknownPackage(PackageId),

    /// An alias was asked to wrap another alias
    #[error("cannot alias {alias} to {target}: target is itself an alias")]
    NestedAlias {
        /// Name of the alias being created
        alias: String,
        /// Name of the alias it tried to wrap
        target: String,
    },

    /// A package was built with an empty name
    #[error("package name must not be empty")]
    EmptyName,

    /// The platform name pattern in configuration is not a valid regex
    #[error("invalid platform pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },
}

/// Result type alias for transaction operations.
pub type Result<T> = std::result::Result<T, Error>;
