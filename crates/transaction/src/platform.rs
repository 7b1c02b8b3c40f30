//! Platform package names.
//!
//! Some dependency names stand for capabilities of the host runtime rather
//! than installable packages (`php`, `ext-json`, `composer-plugin-api`, ...).
//! They never need ordering, so the refiner drops them when following
//! plugin dependencies.

use crate::error::{Error, Result};
use regex::Regex;

/// Default convention for platform names, matched case-insensitively.
pub const DEFAULT_PLATFORM_PATTERN: &str = r"(?i)^(?:php(?:-64bit|-ipv6|-zts|-debug)?|hhvm|(?:ext|lib)-[a-z0-9](?:[_.-]?[a-z0-9]+)*|composer(?:-(?:plugin|runtime)-api)?)$";

/// Compiled platform name pattern.
#[derive(Debug, Clone)]
pub struct PlatformMatcher {
    pattern: Regex,
}

impl PlatformMatcher {
    /// Compile a platform name pattern.
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { pattern })
    }

    /// Check if `name` refers to the platform rather than a package.
    pub fn is_platform(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    /// The pattern source
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}
