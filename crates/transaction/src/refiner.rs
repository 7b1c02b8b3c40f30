//! Reordering of planner output for installs into a local environment.
//!
//! The planner's dependency order is correct for a lock file but not quite
//! enough when packages are really installed: plugins that hook into the
//! installer must be in place before the packages they act on, and removals
//! must run before anything reuses their install paths.

use crate::error::Result;
use crate::operation::Operation;
use crate::package::{Package, PackagePool};
use crate::platform::{DEFAULT_PLATFORM_PATTERN, PlatformMatcher};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Settings for [`LocalOrderRefiner`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RefinerConfig {
    /// Package types treated as installer plugins
    pub plugin_types: Vec<String>,
    /// Package types whose `modifies_downloads` flag is honored
    pub download_plugin_types: Vec<String>,
    /// Regex matching dependency names provided by the platform
    pub platform_pattern: String,
}

impl Default for RefinerConfig {
    fn default() -> Self {
        Self {
            plugin_types: vec![
                "composer-plugin".to_string(),
                "composer-installer".to_string(),
            ],
            download_plugin_types: vec!["composer-plugin".to_string()],
            platform_pattern: DEFAULT_PLATFORM_PATTERN.to_string(),
        }
    }
}

/// Post-processes planner output for local installs.
#[derive(Debug, Clone)]
pub struct LocalOrderRefiner {
    plugin_types: Vec<String>,
    download_plugin_types: Vec<String>,
    platform: PlatformMatcher,
}

impl LocalOrderRefiner {
    /// Build a refiner, compiling the configured platform pattern.
    pub fn new(config: &RefinerConfig) -> Result<Self> {
        Ok(Self {
            plugin_types: config.plugin_types.clone(),
            download_plugin_types: config.download_plugin_types.clone(),
            platform: PlatformMatcher::new(&config.platform_pattern)?,
        })
    }

    /// Apply plugin bootstrap ordering, then removal-first ordering.
    pub fn refine(&self, pool: &PackagePool, operations: Vec<Operation>) -> Vec<Operation> {
        let operations = self.move_plugins_to_front(pool, operations);
        move_removals_to_front(operations)
    }

    /// Whether the package's type marks it as an installer plugin.
    pub fn is_plugin(&self, package: &Package) -> bool {
        self.plugin_types.iter().any(|t| *t == package.package_type)
    }

    /// Whether the package is a plugin that changes how packages are
    /// downloaded. Only `download_plugin_types` honor the flag.
    pub fn is_download_plugin(&self, package: &Package) -> bool {
        package.modifies_downloads
            && self
                .download_plugin_types
                .iter()
                .any(|t| *t == package.package_type)
    }

    /// Move plugins and everything they need ahead of other operations.
    ///
    /// The result is download-modifying plugins (those without dependencies
    /// first, then those with dependencies and their dependencies), then
    /// the remaining plugins grouped the same way, then everything else in
    /// its original order.
    pub fn move_plugins_to_front(
        &self,
        pool: &PackagePool,
        operations: Vec<Operation>,
    ) -> Vec<Operation> {
        let (mut front, rest) =
            self.bootstrap_pass(pool, operations, |pkg| self.is_download_plugin(pkg));
        let (plugins, rest) = self.bootstrap_pass(pool, rest, |pkg| self.is_plugin(pkg));
        front.extend(plugins);
        front.extend(rest);
        front
    }

    /// Split `operations` into the bootstrap group and the untouched rest.
    fn bootstrap_pass<F>(
        &self,
        pool: &PackagePool,
        operations: Vec<Operation>,
        is_bootstrap: F,
    ) -> (Vec<Operation>, Vec<Operation>)
    where
        F: Fn(&Package) -> bool,
    {
        let mut no_deps: VecDeque<Operation> = VecDeque::new();
        let mut with_deps: VecDeque<Operation> = VecDeque::new();
        let mut required: HashSet<&str> = HashSet::new();
        let mut moved = vec![false; operations.len()];

        // Walking backwards, a plugin is seen before its dependencies, so
        // their names are known by the time we reach them.
        for (idx, op) in operations.iter().enumerate().rev() {
            let Some(package) = op.installed_package().and_then(|id| pool.get(id)) else {
                continue;
            };

            let bootstrap = is_bootstrap(package);
            if !bootstrap && !package.names().any(|name| required.contains(name)) {
                continue;
            }

            let requires: Vec<&str> = package
                .requires
                .iter()
                .map(|link| link.target.as_str())
                .filter(|name| !self.platform.is_platform(name))
                .collect();

            if bootstrap && requires.is_empty() {
                no_deps.push_front(*op);
            } else {
                required.extend(requires);
                with_deps.push_front(*op);
            }
            moved[idx] = true;
            log::debug!("bootstrap: moving {} to front", package.pretty_string());
        }

        let front = no_deps.into_iter().chain(with_deps).collect();
        let rest = operations
            .into_iter()
            .zip(moved)
            .filter(|(_, moved)| !moved)
            .map(|(op, _)| op)
            .collect();
        (front, rest)
    }
}

/// Move every uninstall and alias-uninstall ahead of all other operations.
///
/// Both groups keep their relative order. Removing first avoids collisions
/// when a new package reuses a custom install path.
pub fn move_removals_to_front(operations: Vec<Operation>) -> Vec<Operation> {
    let (mut removals, rest): (Vec<Operation>, Vec<Operation>) =
        operations.into_iter().partition(Operation::is_removal);
    removals.extend(rest);
    removals
}
