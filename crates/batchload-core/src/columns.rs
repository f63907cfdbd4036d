//! Column-name normalization
//!
//! Source files arrive with spreadsheet-style headers such as
//! `Total Sales (%)`. Before staging or loading they are rewritten into names
//! that work as unquoted SQL identifiers: spaces become underscores,
//! parentheses and colons are dropped, `%` becomes `percent`.
//!
//! The mapping is one-to-one and order preserving. Two headers that collapse
//! to the same name (`"A B"` and `"A_B"`) are passed through as duplicates;
//! see [`duplicate_names`].

/// Sanitize a single column name.
pub fn normalize_column(name: &str) -> String {
    name.replace(' ', "_")
        .replace(['(', ')'], "")
        .replace('%', "percent")
        .replace(':', "")
}

/// Sanitize every column name, keeping order and count.
pub fn normalize_columns<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    names.iter().map(|n| normalize_column(n.as_ref())).collect()
}

/// Names that occur more than once, in first-seen order.
pub fn duplicate_names(names: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut dupes = Vec::new();
    for name in names {
        if !seen.insert(name.as_str()) && !dupes.contains(name) {
            dupes.push(name.clone());
        }
    }
    dupes
}
