use anyhow::{Context as _, Result};
use colored::Colorize;
use serde::Serialize;

use crate::Context;
use crate::cli::PlanArgs;
use crate::config::{Config, OutputFormat};
use crate::manifest::PackageSetFile;
use crate::ui;
use transaction::{
    Operation, OperationKind, PackagePool, PlanSummary, Repository, Transaction, TransactionKind,
};

pub fn run(ctx: &Context, args: &PlanArgs) -> Result<()> {
    let (config, _) = Config::load(args.config.as_deref())?;
    let sets = PackageSetFile::load(&args.file)?.into_sets()?;

    let tx = if args.lock {
        Transaction::new(&sets.pool, sets.present.packages(), sets.result.packages())
    } else {
        Transaction::local(&sets.pool, &sets.result, &sets.present, &config.refiner)
            .context("Invalid refiner configuration")?
    };
    log::info!(
        "Planned {} operations ({} transaction)",
        tx.operations().len(),
        tx.kind()
    );

    match args.format.unwrap_or(config.output.format) {
        OutputFormat::Text => print_text(ctx, &sets.pool, &tx),
        OutputFormat::Json => {
            let view = PlanView::new(&sets.pool, &tx);
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }
    Ok(())
}

fn print_text(ctx: &Context, pool: &PackagePool, tx: &Transaction) {
    if !ctx.quiet {
        ui::header(&format!("Transaction plan ({})", tx.kind()));
    }

    if tx.is_empty() {
        ui::success("Nothing to do");
        return;
    }

    let total = tx.operations().len();
    for (idx, (op, line)) in tx.operations().iter().zip(tx.describe(pool)).enumerate() {
        if ctx.verbose > 0 {
            ui::step(idx + 1, total, &line);
        } else {
            println!("{} {}", ui::operation_symbol(op.kind()), line);
        }
    }

    if !ctx.quiet {
        println!();
        println!("{}", summary_line(&tx.summary()).bold());
    }
}

fn summary_line(summary: &PlanSummary) -> String {
    let mut parts = vec![
        ui::count(summary.installs, "install"),
        ui::count(summary.updates, "update"),
        ui::count(summary.removals, "removal"),
    ];
    if summary.alias_marks > 0 {
        parts.push(ui::count(summary.alias_marks, "alias change"));
    }
    parts.join(", ")
}

// ============================================================================
// JSON Output
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanView {
    kind: TransactionKind,
    operations: Vec<OperationView>,
    summary: PlanSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OperationView {
    #[serde(rename = "type")]
    kind: OperationKind,
    package: String,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alias_of: Option<String>,
    description: String,
}

impl PlanView {
    fn new(pool: &PackagePool, tx: &Transaction) -> Self {
        let lock = tx.kind() == TransactionKind::Lock;
        Self {
            kind: tx.kind(),
            operations: tx
                .operations()
                .iter()
                .map(|op| OperationView::new(pool, op, lock))
                .collect(),
            summary: tx.summary(),
        }
    }
}

impl OperationView {
    fn new(pool: &PackagePool, op: &Operation, lock: bool) -> Self {
        let package = &pool[op.package()];
        Self {
            kind: op.kind(),
            package: package.name.clone(),
            version: package.pretty_version(),
            from_version: match *op {
                Operation::Update { from, .. } => Some(pool[from].pretty_version()),
                _ => None,
            },
            alias_of: package.alias_of().map(|id| pool[id].pretty_string()),
            description: op.show(pool, lock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::SetFormat;

    const SET: &str = r#"
[[present]]
name = "a"
version = "1.0.0"

[[present]]
name = "old"
version = "1.0.0"

[[result]]
name = "a"
version = "2.0.0"
require = ["b"]

[[result]]
name = "b"
version = "1.0.0"
"#;

    #[test]
    fn test_plan_view_local() {
        let sets = PackageSetFile::parse(SET, SetFormat::Toml)
            .unwrap()
            .into_sets()
            .unwrap();
        let tx = Transaction::local(
            &sets.pool,
            &sets.result,
            &sets.present,
            &Config::default().refiner,
        )
        .unwrap();

        let view = PlanView::new(&sets.pool, &tx);
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["kind"], "local");

        let ops = value["operations"].as_array().unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0]["type"], "uninstall");
        assert_eq!(ops[0]["package"], "old");
        assert_eq!(ops[1]["type"], "install");
        assert_eq!(ops[1]["package"], "b");
        assert_eq!(ops[2]["type"], "update");
        assert_eq!(ops[2]["fromVersion"], "1.0.0");
        assert_eq!(ops[2]["version"], "2.0.0");
        assert_eq!(ops[2]["description"], "Upgrading a (1.0.0 => 2.0.0)");
        assert!(ops[1].get("fromVersion").is_none());

        assert_eq!(value["summary"]["installs"], 1);
        assert_eq!(value["summary"]["updates"], 1);
        assert_eq!(value["summary"]["removals"], 1);
    }

    #[test]
    fn test_plan_view_lock_wording() {
        let sets = PackageSetFile::parse(
            "[[result]]\nname = \"a\"\nversion = \"1.0.0\"\naliases = [\"1.0.x-dev\"]\n",
            SetFormat::Toml,
        )
        .unwrap()
        .into_sets()
        .unwrap();
        let tx = Transaction::new(&sets.pool, sets.present.packages(), sets.result.packages());

        let view = PlanView::new(&sets.pool, &tx);
        assert_eq!(view.kind, TransactionKind::Lock);
        assert_eq!(view.operations.len(), 2);
        assert_eq!(view.operations[0].description, "Locking a (1.0.0)");
        assert_eq!(view.operations[1].kind, OperationKind::MarkAliasInstalled);
        assert_eq!(view.operations[1].alias_of.as_deref(), Some("a (1.0.0)"));
    }

    #[test]
    fn test_summary_line() {
        let summary = PlanSummary {
            installs: 1,
            updates: 2,
            removals: 0,
            alias_marks: 0,
        };
        assert_eq!(summary_line(&summary), "1 install, 2 updates, 0 removals");

        let with_aliases = PlanSummary {
            alias_marks: 1,
            ..summary
        };
        assert!(summary_line(&with_aliases).ends_with("1 alias change"));
    }
}
