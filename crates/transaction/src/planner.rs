//! Transaction planner - diffs present and result package sets
//!
//! The planner walks the result set's dependency graph depth-first and
//! emits operations in postorder, so dependencies are installed or updated
//! before the packages requiring them. Cycles are expected: every package is
//! visited once and processed once, and members of a cycle are emitted in
//! traversal order.

use crate::operation::Operation;
use crate::ordering::sort_handles;
use crate::package::{Link, Package, PackageId, PackagePool};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Computes the operations turning `present` into `result`.
///
/// Shorthand for [`TransactionPlanner::new`] followed by
/// [`TransactionPlanner::compute`].
pub fn compute(pool: &PackagePool, present: &[PackageId], result: &[PackageId]) -> Vec<Operation> {
    TransactionPlanner::new(pool, present, result).compute()
}

/// Builds the ordered operation list for one transaction.
///
/// The derived maps are built once at construction; the input slices are
/// never modified.
#[derive(Debug)]
pub struct TransactionPlanner<'a> {
    pool: &'a PackagePool,
    /// Present packages, deduplicated, in handle order
    present: Vec<PackageId>,
    /// Result packages, deduplicated, in [`sort_handles`] order
    result: Vec<PackageId>,
    /// Result packages grouped by every name they expose
    result_by_name: HashMap<&'a str, Vec<PackageId>>,
}

impl<'a> TransactionPlanner<'a> {
    /// Create a planner for the given present and result sets.
    ///
    /// Handles that do not belong to `pool` are ignored.
    pub fn new(pool: &'a PackagePool, present: &[PackageId], result: &[PackageId]) -> Self {
        let mut present = unique_handles(pool, present);
        present.sort_unstable();

        let mut result = unique_handles(pool, result);
        sort_handles(pool, &mut result);

        let mut result_by_name: HashMap<&'a str, Vec<PackageId>> = HashMap::new();
        for &id in &result {
            for name in pool[id].names() {
                let group = result_by_name.entry(name).or_default();
                if !group.contains(&id) {
                    group.push(id);
                }
            }
        }

        Self {
            pool,
            present,
            result,
            result_by_name,
        }
    }

    /// Result packages in deterministic order
    pub fn result_packages(&self) -> &[PackageId] {
        &self.result
    }

    /// Result packages exposing the link's target name.
    pub fn providers(&self, link: &Link) -> &[PackageId] {
        self.result_by_name
            .get(link.target.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Packages no other result package depends on.
    ///
    /// If every package is required by another one (the top level is a
    /// cycle), the package with the lowest name is returned as the sole
    /// root so traversal always has an entry point.
    pub fn root_packages(&self) -> Vec<PackageId> {
        let mut required: HashSet<PackageId> = HashSet::new();
        for &id in &self.result {
            for link in &self.pool[id].requires {
                required.extend(self.providers(link).iter().filter(|&&p| p != id));
            }
        }

        let roots: Vec<PackageId> = self
            .result
            .iter()
            .copied()
            .filter(|id| !required.contains(id))
            .collect();

        if roots.is_empty()
            && let Some(id) = self.lowest_named(|_| true)
        {
            log::debug!(
                "planner: no root packages, starting at {}",
                self.pool[id].pretty_string()
            );
            return vec![id];
        }
        roots
    }

    /// Compute the ordered operation list.
    pub fn compute(&self) -> Vec<Operation> {
        let mut diff = PresentDiff::new(self.pool, &self.present);
        let mut visited = vec![false; self.pool.len()];
        let mut processed = vec![false; self.pool.len()];

        let mut stack = self.root_packages();
        log::debug!(
            "planner: {} result packages, {} roots",
            self.result.len(),
            stack.len()
        );

        loop {
            while let Some(id) = stack.pop() {
                if processed[id.index()] {
                    continue;
                }

                if visited[id.index()] {
                    processed[id.index()] = true;
                    diff.process(id);
                    continue;
                }

                // Revisit after the dependencies pushed below
                visited[id.index()] = true;
                stack.push(id);
                self.push_dependencies(id, &mut stack);
            }

            // Cycles unreachable from any root still have to be planned
            match self.lowest_named(|id| !visited[id.index()]) {
                Some(id) => {
                    log::debug!(
                        "planner: {} unreachable from roots, continuing there",
                        self.pool[id].pretty_string()
                    );
                    stack.push(id);
                }
                None => break,
            }
        }

        diff.finish()
    }

    fn push_dependencies(&self, id: PackageId, stack: &mut Vec<PackageId>) {
        let package = &self.pool[id];
        if let Some(target) = package.alias_of() {
            stack.push(target);
            return;
        }

        for link in &package.requires {
            stack.extend(self.providers(link).iter().filter(|&&p| p != id));
        }
    }

    /// First result package (in sort order) with the lowest name among those
    /// accepted by `filter`.
    fn lowest_named<F>(&self, filter: F) -> Option<PackageId>
    where
        F: Fn(PackageId) -> bool,
    {
        self.result
            .iter()
            .copied()
            .filter(|&id| filter(id))
            .min_by(|&a, &b| self.pool[a].name.cmp(&self.pool[b].name))
    }
}

fn unique_handles(pool: &PackagePool, handles: &[PackageId]) -> Vec<PackageId> {
    let mut seen = vec![false; pool.len()];
    let mut unique = Vec::with_capacity(handles.len());
    for &id in handles {
        if !pool.contains(id) {
            log::warn!("planner: ignoring package handle {id} not in pool");
            continue;
        }
        if !seen[id.index()] {
            seen[id.index()] = true;
            unique.push(id);
        }
    }
    unique
}

/// Present packages still waiting to be matched against the result set.
struct PresentDiff<'a> {
    pool: &'a PackagePool,
    by_name: BTreeMap<&'a str, PackageId>,
    aliases: BTreeMap<(&'a str, &'a str), PackageId>,
    remove: BTreeMap<&'a str, PackageId>,
    remove_aliases: BTreeMap<(&'a str, &'a str), PackageId>,
    operations: Vec<Operation>,
}

impl<'a> PresentDiff<'a> {
    fn new(pool: &'a PackagePool, present: &[PackageId]) -> Self {
        let mut by_name = BTreeMap::new();
        let mut aliases = BTreeMap::new();
        for &id in present {
            let package = &pool[id];
            if package.is_alias() {
                aliases.insert((package.name.as_str(), package.version.as_str()), id);
            } else {
                by_name.insert(package.name.as_str(), id);
            }
        }

        Self {
            pool,
            remove: by_name.clone(),
            remove_aliases: aliases.clone(),
            by_name,
            aliases,
            operations: Vec::new(),
        }
    }

    fn process(&mut self, id: PackageId) {
        let pool = self.pool;
        let package = &pool[id];

        if package.is_alias() {
            let key = (package.name.as_str(), package.version.as_str());
            if self.aliases.contains_key(&key) {
                self.remove_aliases.remove(&key);
                log::trace!("planner: alias {} kept", package.pretty_string());
            } else {
                self.operations.push(Operation::MarkAliasInstalled(id));
            }
            return;
        }

        let name = package.name.as_str();
        match self.by_name.get(name) {
            Some(&present) if needs_update(&pool[present], package) => {
                self.operations.push(Operation::Update { from: present, to: id });
            }
            Some(_) => log::trace!("planner: {} already satisfied", package.pretty_string()),
            None => self.operations.push(Operation::Install(id)),
        }
        self.remove.remove(name);
    }

    fn finish(self) -> Vec<Operation> {
        let mut operations: Vec<Operation> =
            self.remove.into_values().map(Operation::Uninstall).collect();
        operations.extend(self.operations);
        operations.extend(
            self.remove_aliases
                .into_values()
                .map(Operation::MarkAliasUninstalled),
        );
        operations
    }
}

fn needs_update(present: &Package, result: &Package) -> bool {
    present.version != result.version
        || present.dist_reference != result.dist_reference
        || present.source_reference != result.source_reference
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(pool: &mut PackagePool, name: &str, version: &str, requires: &[&str]) -> PackageId {
        let package = requires
            .iter()
            .fold(Package::new(name, version), |pkg, req| pkg.with_require(*req));
        pool.add(package).unwrap()
    }

    fn position(ops: &[Operation], id: PackageId) -> usize {
        ops.iter().position(|op| op.package() == id).unwrap()
    }

    #[test]
    fn test_empty_sets() {
        let pool = PackagePool::new();
        assert!(compute(&pool, &[], &[]).is_empty());
    }

    #[test]
    fn test_dependency_installed_before_update() {
        let mut pool = PackagePool::new();
        let a1 = add(&mut pool, "a", "1.0", &[]);
        let a2 = add(&mut pool, "a", "2.0", &["b"]);
        let b = add(&mut pool, "b", "1.0", &[]);

        let ops = compute(&pool, &[a1], &[a2, b]);
        assert_eq!(
            ops,
            vec![Operation::Install(b), Operation::Update { from: a1, to: a2 }]
        );
    }

    #[test]
    fn test_uninstall_only() {
        let mut pool = PackagePool::new();
        let a_present = add(&mut pool, "a", "1.0", &[]);
        let c = add(&mut pool, "c", "1.0", &[]);
        let a_result = add(&mut pool, "a", "1.0", &[]);

        let ops = compute(&pool, &[a_present, c], &[a_result]);
        assert_eq!(ops, vec![Operation::Uninstall(c)]);
    }

    #[test]
    fn test_uninstalls_before_other_operations() {
        let mut pool = PackagePool::new();
        let old = add(&mut pool, "old", "1.0", &[]);
        let also_old = add(&mut pool, "also-old", "1.0", &[]);
        let new = add(&mut pool, "new", "1.0", &[]);

        let ops = compute(&pool, &[old, also_old], &[new]);
        assert_eq!(ops.len(), 3);
        assert!(ops[0].is_removal());
        assert!(ops[1].is_removal());
        assert_eq!(ops[2], Operation::Install(new));
    }

    #[test]
    fn test_identical_sets_are_noop() {
        let mut pool = PackagePool::new();
        let mut present = Vec::new();
        let mut result = Vec::new();
        for name in ["a", "b", "c"] {
            let make = || {
                Package::new(name, "1.0")
                    .with_dist_reference("dist")
                    .with_source_reference("src")
                    .with_require("a")
            };
            present.push(pool.add(make()).unwrap());
            result.push(pool.add(make()).unwrap());
        }

        assert!(compute(&pool, &present, &result).is_empty());
    }

    #[test]
    fn test_reference_change_is_update() {
        let mut pool = PackagePool::new();
        let old = pool
            .add(Package::new("a", "dev-main").with_source_reference("aaa"))
            .unwrap();
        let new = pool
            .add(Package::new("a", "dev-main").with_source_reference("bbb"))
            .unwrap();
        let dist_old = pool
            .add(Package::new("b", "1.0").with_dist_reference("x"))
            .unwrap();
        let dist_new = pool.add(Package::new("b", "1.0")).unwrap();

        let ops = compute(&pool, &[old, dist_old], &[new, dist_new]);
        assert!(ops.contains(&Operation::Update { from: old, to: new }));
        assert!(ops.contains(&Operation::Update {
            from: dist_old,
            to: dist_new
        }));
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn test_chain_order() {
        let mut pool = PackagePool::new();
        let a = add(&mut pool, "a", "1.0", &["b"]);
        let b = add(&mut pool, "b", "1.0", &["c"]);
        let c = add(&mut pool, "c", "1.0", &[]);

        let ops = compute(&pool, &[], &[a, b, c]);
        assert_eq!(
            ops,
            vec![
                Operation::Install(c),
                Operation::Install(b),
                Operation::Install(a),
            ]
        );
    }

    #[test]
    fn test_diamond_order() {
        let mut pool = PackagePool::new();
        let root = add(&mut pool, "root", "1.0", &["left", "right"]);
        let left = add(&mut pool, "left", "1.0", &["bottom"]);
        let right = add(&mut pool, "right", "1.0", &["bottom"]);
        let bottom = add(&mut pool, "bottom", "1.0", &[]);

        let ops = compute(&pool, &[], &[root, left, right, bottom]);
        assert_eq!(ops.len(), 4);
        assert!(position(&ops, bottom) < position(&ops, left));
        assert!(position(&ops, bottom) < position(&ops, right));
        assert!(position(&ops, left) < position(&ops, root));
        assert!(position(&ops, right) < position(&ops, root));
    }

    #[test]
    fn test_roots_in_name_order() {
        let mut pool = PackagePool::new();
        let b = add(&mut pool, "b", "1.0", &[]);
        let a = add(&mut pool, "a", "1.0", &[]);
        let c = add(&mut pool, "c", "1.0", &[]);

        let planner = TransactionPlanner::new(&pool, &[], &[a, b, c]);
        assert_eq!(planner.root_packages(), vec![c, b, a]);
        // The stack pops the lowest name first
        assert_eq!(
            planner.compute(),
            vec![
                Operation::Install(a),
                Operation::Install(b),
                Operation::Install(c),
            ]
        );
    }

    #[test]
    fn test_cycle_terminates_each_once() {
        let mut pool = PackagePool::new();
        let a = add(&mut pool, "a", "1.0", &["b"]);
        let b = add(&mut pool, "b", "1.0", &["c"]);
        let c = add(&mut pool, "c", "1.0", &["a"]);

        let planner = TransactionPlanner::new(&pool, &[], &[b, c, a]);
        assert_eq!(planner.root_packages(), vec![a]);

        let ops = planner.compute();
        assert_eq!(ops.len(), 3);
        for id in [a, b, c] {
            assert_eq!(ops.iter().filter(|op| op.package() == id).count(), 1);
        }
    }

    #[test]
    fn test_cycle_below_root() {
        let mut pool = PackagePool::new();
        let app = add(&mut pool, "app", "1.0", &["x"]);
        let x = add(&mut pool, "x", "1.0", &["y"]);
        let y = add(&mut pool, "y", "1.0", &["x"]);

        let ops = compute(&pool, &[], &[app, x, y]);
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[2], Operation::Install(app));
    }

    #[test]
    fn test_unreachable_cycle_is_planned() {
        let mut pool = PackagePool::new();
        let app = add(&mut pool, "app", "1.0", &[]);
        let x = add(&mut pool, "x", "1.0", &["y"]);
        let y = add(&mut pool, "y", "1.0", &["x"]);

        let ops = compute(&pool, &[], &[app, x, y]);
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0], Operation::Install(app));
        assert!(ops.contains(&Operation::Install(x)));
        assert!(ops.contains(&Operation::Install(y)));
    }

    #[test]
    fn test_self_requirement_ignored() {
        let mut pool = PackagePool::new();
        let a = pool
            .add(
                Package::new("a", "1.0")
                    .with_provide("a-api")
                    .with_require("a-api")
                    .with_require("b"),
            )
            .unwrap();
        let b = add(&mut pool, "b", "1.0", &[]);

        let planner = TransactionPlanner::new(&pool, &[], &[a, b]);
        assert_eq!(planner.root_packages(), vec![a]);
        assert_eq!(
            planner.compute(),
            vec![Operation::Install(b), Operation::Install(a)]
        );
    }

    #[test]
    fn test_missing_provider_is_ignored() {
        let mut pool = PackagePool::new();
        let a = add(&mut pool, "a", "1.0", &["not-in-result", "php"]);

        assert_eq!(compute(&pool, &[], &[a]), vec![Operation::Install(a)]);
    }

    #[test]
    fn test_provided_name_orders_provider_first() {
        let mut pool = PackagePool::new();
        let consumer = add(&mut pool, "consumer", "1.0", &["psr/log-implementation"]);
        let logger = pool
            .add(Package::new("monolog", "2.0").with_provide("psr/log-implementation"))
            .unwrap();

        let planner = TransactionPlanner::new(&pool, &[], &[consumer, logger]);
        assert_eq!(
            planner.providers(&Link::new("psr/log-implementation")),
            &[logger]
        );
        assert_eq!(
            planner.compute(),
            vec![Operation::Install(logger), Operation::Install(consumer)]
        );
    }

    #[test]
    fn test_multiple_providers_sorted() {
        let mut pool = PackagePool::new();
        let a = pool.add(Package::new("impl-a", "1.0").with_provide("api")).unwrap();
        let b = pool.add(Package::new("impl-b", "1.0").with_provide("api")).unwrap();

        let planner = TransactionPlanner::new(&pool, &[], &[a, b]);
        assert_eq!(planner.providers(&Link::new("api")), &[b, a]);
        assert!(planner.providers(&Link::new("nothing")).is_empty());
    }

    #[test]
    fn test_replaced_name_keeps_present_replaced_package() {
        let mut pool = PackagePool::new();
        let old = add(&mut pool, "old-name", "1.0", &[]);
        let new = pool
            .add(Package::new("new-name", "2.0").with_replace("old-name"))
            .unwrap();

        // Replacing does not rename; the old package is still removed
        let ops = compute(&pool, &[old], &[new]);
        assert_eq!(ops, vec![Operation::Uninstall(old), Operation::Install(new)]);
    }

    #[test]
    fn test_duplicate_result_handles() {
        let mut pool = PackagePool::new();
        let a = add(&mut pool, "a", "1.0", &[]);

        assert_eq!(compute(&pool, &[], &[a, a, a]), vec![Operation::Install(a)]);
    }

    #[test]
    fn test_foreign_handles_ignored() {
        let mut pool = PackagePool::new();
        let a = add(&mut pool, "a", "1.0", &[]);
        let mut other = PackagePool::new();
        add(&mut other, "x", "1.0", &[]);
        let foreign = add(&mut other, "y", "1.0", &[]);

        assert_eq!(compute(&pool, &[foreign], &[a, foreign]), vec![Operation::Install(a)]);
    }

    #[test]
    fn test_alias_adjacent_to_target() {
        let mut pool = PackagePool::new();
        let z = add(&mut pool, "z", "1.0", &["m"]);
        let target = add(&mut pool, "m", "dev-main", &[]);
        let alias = pool.add_alias(target, "1.0.x-dev").unwrap();
        let a = add(&mut pool, "a", "1.0", &[]);

        let planner = TransactionPlanner::new(&pool, &[], &[target, a, z, alias]);
        assert_eq!(planner.result_packages(), &[z, alias, target, a]);

        let ops = planner.compute();
        assert_eq!(ops.len(), 4);
        let target_pos = position(&ops, target);
        assert_eq!(ops[target_pos], Operation::Install(target));
        assert!(ops.contains(&Operation::MarkAliasInstalled(alias)));
        let alias_pos = position(&ops, alias);
        assert_eq!(target_pos.abs_diff(alias_pos), 1);
        assert!(alias_pos < position(&ops, z));
    }

    #[test]
    fn test_present_alias_kept() {
        let mut pool = PackagePool::new();
        let old_target = add(&mut pool, "m", "dev-main", &[]);
        let old_alias = pool.add_alias(old_target, "1.0.x-dev").unwrap();
        let new_target = add(&mut pool, "m", "dev-main", &[]);
        let new_alias = pool.add_alias(new_target, "1.0.x-dev").unwrap();

        let ops = compute(&pool, &[old_target, old_alias], &[new_target, new_alias]);
        assert!(ops.is_empty());
    }

    #[test]
    fn test_stale_alias_uninstalled_last() {
        let mut pool = PackagePool::new();
        let old_target = add(&mut pool, "m", "dev-main", &[]);
        let old_alias = pool.add_alias(old_target, "1.0.x-dev").unwrap();
        let gone = add(&mut pool, "gone", "1.0", &[]);
        let new_target = add(&mut pool, "m", "dev-main", &[]);
        let fresh = add(&mut pool, "fresh", "1.0", &[]);

        let ops = compute(
            &pool,
            &[old_target, old_alias, gone],
            &[new_target, fresh],
        );
        assert_eq!(
            ops,
            vec![
                Operation::Uninstall(gone),
                Operation::Install(fresh),
                Operation::MarkAliasUninstalled(old_alias),
            ]
        );
    }

    #[test]
    fn test_alias_target_outside_result_is_processed() {
        let mut pool = PackagePool::new();
        let target = add(&mut pool, "m", "dev-main", &[]);
        let alias = pool.add_alias(target, "1.0.x-dev").unwrap();

        let ops = compute(&pool, &[], &[alias]);
        assert_eq!(
            ops,
            vec![Operation::Install(target), Operation::MarkAliasInstalled(alias)]
        );
    }

    #[test]
    fn test_deterministic_over_input_order() {
        let mut pool = PackagePool::new();
        let present = vec![
            add(&mut pool, "a", "1.0", &[]),
            add(&mut pool, "gone", "1.0", &[]),
            add(&mut pool, "zz", "0.1", &[]),
        ];
        let mut result = vec![
            add(&mut pool, "a", "2.0", &["b", "c"]),
            add(&mut pool, "b", "1.0", &["c", "d"]),
            add(&mut pool, "c", "1.0", &["b"]),
            add(&mut pool, "d", "1.0", &[]),
            add(&mut pool, "e", "1.0", &["a", "d"]),
            add(&mut pool, "zz", "0.1", &[]),
        ];
        let target = add(&mut pool, "f", "dev-main", &["e"]);
        result.push(target);
        result.push(pool.add_alias(target, "1.0.x-dev").unwrap());

        let expected = compute(&pool, &present, &result);
        assert_eq!(expected.len(), 8);

        for shift in 1..result.len() {
            let mut rotated = result.clone();
            rotated.rotate_left(shift);
            let mut reversed_present = present.clone();
            reversed_present.reverse();
            assert_eq!(compute(&pool, &reversed_present, &rotated), expected);
        }

        let mut reversed = result.clone();
        reversed.reverse();
        assert_eq!(compute(&pool, &present, &reversed), expected);
    }
}
