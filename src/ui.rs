use colored::{ColoredString, Colorize};
use transaction::OperationKind;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a step indicator
pub fn step(num: usize, total: usize, msg: &str) {
    println!("{} {}", format!("[{num}/{total}]").blue().bold(), msg);
}

/// Marker shown in front of an operation line
pub const fn operation_marker(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Install => "+",
        OperationKind::Update => "~",
        OperationKind::Uninstall => "-",
        OperationKind::MarkAliasInstalled | OperationKind::MarkAliasUninstalled => "=",
    }
}

/// Colored operation marker
pub fn operation_symbol(kind: OperationKind) -> ColoredString {
    let marker = operation_marker(kind);
    match kind {
        OperationKind::Install => marker.green(),
        OperationKind::Update => marker.yellow(),
        OperationKind::Uninstall => marker.red(),
        OperationKind::MarkAliasInstalled | OperationKind::MarkAliasUninstalled => marker.dimmed(),
    }
}

/// Pluralize a count, e.g. `1 install`, `2 installs`
pub fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

// ============================================================================
// Tests
// ============================================================================
