//! SQL extraction from raw model output

use once_cell::sync::Lazy;
use regex::Regex;

/// First fenced block, optionally tagged `sql` in any casing, matched lazily.
static SQL_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```(?:sql)?\s*(.*?)\s*```").expect("valid fence regex"));

/// Strip markdown code fences from model output so the query can be executed.
///
/// Returns the trimmed contents of the first fenced block when one exists,
/// otherwise the whole input trimmed. Never fails.
pub fn extract_sql(raw: &str) -> String {
    match SQL_FENCE_RE.captures(raw).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str().trim().to_string(),
        None => raw.trim().to_string(),
    }
}
