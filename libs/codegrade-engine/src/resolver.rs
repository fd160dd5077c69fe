// Entry-point resolution
// A single pattern match over the source text; submissions are one-routine
// snippets, so no parsing is needed.
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref FUNCTION_DECLARATION: Regex =
        Regex::new(r"\bfunction\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*\(").expect("declaration pattern is valid");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no function declaration found in submission")]
pub struct EntryPointNotFound;

/// Name of the first declared routine in `source`.
pub fn resolve_entry_point(source: &str) -> Result<String, EntryPointNotFound> {
    FUNCTION_DECLARATION
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|name| name.as_str().to_string())
        .ok_or(EntryPointNotFound)
}
