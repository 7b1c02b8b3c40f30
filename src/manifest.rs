//! Package set files
//!
//! A package set file lists the packages currently present and the packages
//! the solver decided on. TOML and JSON are both accepted, chosen by file
//! extension:
//!
//! ```toml
//! [[present]]
//! name = "acme/log"
//! version = "1.0.0"
//!
//! [[result]]
//! name = "acme/log"
//! version = "2.0.0"
//! require = ["acme/fmt ^1.0"]
//! aliases = ["2.0.x-dev"]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use transaction::{ArrayRepository, DEFAULT_PACKAGE_TYPE, Link, Package, PackagePool};

/// Format of a package set file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetFormat {
    Toml,
    Json,
}

impl SetFormat {
    /// Pick the format from the file extension. Anything but `.json` is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// One package entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageSpec {
    pub name: String,
    pub version: String,

    #[serde(rename = "type", default = "default_type")]
    pub package_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist_reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_reference: Option<String>,

    /// Dependencies as `"name"` or `"name constraint"`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub require: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replace: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provide: Vec<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub modifies_downloads: bool,

    /// Versions under which this package is also aliased
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

fn default_type() -> String {
    DEFAULT_PACKAGE_TYPE.to_string()
}

impl PackageSpec {
    fn to_package(&self) -> Package {
        let mut package = Package::new(&self.name, &self.version)
            .with_type(&self.package_type)
            .with_modifies_downloads(self.modifies_downloads);

        if let Some(reference) = &self.dist_reference {
            package = package.with_dist_reference(reference);
        }
        if let Some(reference) = &self.source_reference {
            package = package.with_source_reference(reference);
        }
        for require in &self.require {
            package = package.with_link(parse_link(require));
        }
        for name in &self.replace {
            package = package.with_replace(name);
        }
        for name in &self.provide {
            package = package.with_provide(name);
        }
        package
    }
}

/// Split `"name constraint"` into a link.
fn parse_link(spec: &str) -> Link {
    let spec = spec.trim();
    match spec.split_once(char::is_whitespace) {
        Some((target, constraint)) if !constraint.trim().is_empty() => {
            Link::new(target).with_constraint(constraint.trim())
        }
        _ => Link::new(spec),
    }
}

/// The file's contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageSetFile {
    pub present: Vec<PackageSpec>,
    pub result: Vec<PackageSpec>,
}

/// Both sets loaded into one pool
#[derive(Debug)]
pub struct PackageSets {
    pub pool: PackagePool,
    pub present: ArrayRepository,
    pub result: ArrayRepository,
}

impl PackageSetFile {
    /// Read and parse a package set file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::parse(&content, SetFormat::from_path(path))
            .with_context(|| format!("Invalid package set in {}", path.display()))
    }

    /// Parse from a string in the given format
    pub fn parse(content: &str, format: SetFormat) -> Result<Self> {
        let file = match format {
            SetFormat::Toml => toml::from_str(content)?,
            SetFormat::Json => serde_json::from_str(content)?,
        };
        Ok(file)
    }

    /// Build the package pool and both repositories.
    ///
    /// Each entry becomes one package, followed by one alias per listed
    /// alias version.
    pub fn into_sets(self) -> Result<PackageSets> {
        let mut pool = PackagePool::new();
        let present = add_all(&mut pool, &self.present, "present")?;
        let result = add_all(&mut pool, &self.result, "result")?;
        log::debug!(
            "Loaded {} present and {} result packages",
            present.len(),
            result.len()
        );
        Ok(PackageSets {
            pool,
            present,
            result,
        })
    }
}

fn add_all(pool: &mut PackagePool, specs: &[PackageSpec], set: &str) -> Result<ArrayRepository> {
    let mut repo = ArrayRepository::new();
    for (idx, spec) in specs.iter().enumerate() {
        let id = pool
            .add(spec.to_package())
            .with_context(|| format!("{set}[{idx}]: invalid package"))?;
        repo.add(id);
        for version in &spec.aliases {
            let alias = pool
                .add_alias(id, version)
                .with_context(|| format!("{set}[{idx}]: invalid alias {version}"))?;
            repo.add(alias);
        }
    }
    Ok(repo)
}

// ============================================================================
// Tests
// ============================================================================
