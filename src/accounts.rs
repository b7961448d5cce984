//! Account list loading

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

/// Parse newline-delimited account IDs, trimming whitespace and skipping blank lines
pub fn parse_accounts(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read account IDs from a file
pub fn load_accounts(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Error reading accounts file {}", path.display()))?;
    Ok(parse_accounts(&content))
}

/// Append `extra` to `accounts`, keeping first-seen order and dropping duplicates
pub fn merge_accounts(accounts: Vec<String>, extra: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    accounts
        .into_iter()
        .chain(extra)
        .filter(|a| seen.insert(a.clone()))
        .collect()
}
