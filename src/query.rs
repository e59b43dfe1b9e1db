//! jq query construction.
//!
//! Two queries drive the viewer: one lists the distinct values of the
//! grouping field, the other selects and formats the records of one group.

/// Name of the sentinel group that matches every record.
pub const ALL_GROUP: &str = "all";

/// Legacy spelling of [`ALL_GROUP`] accepted from the command line.
pub const ALL_GROUP_ALIAS: &str = "*";

/// The identity filter, used whenever a selector or format is left empty.
const IDENTITY: &str = ".";

/// Returns true if `group` names the "no filtering" sentinel.
pub fn is_all_group(group: &str) -> bool {
    group == ALL_GROUP || group == ALL_GROUP_ALIAS
}

/// Build the query that emits the grouping field of every record that has it.
///
/// An empty selector emits every record unchanged. Records are JSON objects,
/// so the groups pipeline rejects that output as malformed and the viewer
/// falls back to the single `all` group.
pub fn build_groups_query(selector: &str) -> String {
    if selector.is_empty() {
        return IDENTITY.to_string();
    }
    format!(".|select({selector})|{selector}")
}

/// Build the query that selects the records of `group` and formats them.
///
/// The group value is compared as a string with exact, case-sensitive
/// equality. It is embedded as a JSON string literal, which is also a valid
/// jq string literal, so quotes and backslashes survive intact.
pub fn build_content_query(selector: &str, group: &str, format: &str) -> String {
    let selector = or_identity(selector);
    let format = or_identity(format);
    if is_all_group(group) {
        return format!(".|select({selector})|{format}");
    }
    format!(
        ".|select({selector}=={})|{format}",
        string_literal(group)
    )
}

/// A selector still being typed: a path ending in a dangling `.`.
///
/// The bare identity `.` is complete.
pub fn is_incomplete_selector(selector: &str) -> bool {
    selector != IDENTITY && selector.ends_with('.')
}

/// Render the shell-equivalent command line for a query, for display.
pub fn command_line(tool: &str, query: &str, path: &str) -> String {
    format!("{tool} -r '{query}' '{path}'")
}

fn or_identity(expr: &str) -> &str {
    if expr.is_empty() {
        IDENTITY
    } else {
        expr
    }
}

fn string_literal(value: &str) -> String {
    // Serializing a &str cannot fail.
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}
