//! Addressing expression text handling.
//!
//! Expressions are opaque to this crate; the orchestrator evaluates them.
//! They are often authored as indented multi-line blocks, so on the way in
//! they lose their common indentation and surrounding whitespace. Nothing
//! else about them changes.

use serde::{Deserialize, Deserializer};

/// Remove common indentation and trim surrounding whitespace.
///
/// Idempotent: normalizing an already normalized expression returns it
/// unchanged.
pub fn normalize_expression(text: &str) -> String {
  dedent(text).trim().to_string()
}

/// Strip the longest run of leading spaces/tabs shared by every non-blank
/// line. Blank lines are emptied and do not take part in the margin.
fn dedent(text: &str) -> String {
  let margin = text
    .split('\n')
    .filter(|line| !line.trim().is_empty())
    .map(leading_whitespace)
    .reduce(common_prefix)
    .unwrap_or("");

  text
    .split('\n')
    .map(|line| {
      if line.trim().is_empty() {
        ""
      } else {
        line.strip_prefix(margin).unwrap_or(line)
      }
    })
    .collect::<Vec<_>>()
    .join("\n")
}

fn leading_whitespace(line: &str) -> &str {
  let end = line
    .find(|c: char| c != ' ' && c != '\t')
    .unwrap_or(line.len());
  &line[..end]
}

fn common_prefix<'a>(a: &'a str, b: &'a str) -> &'a str {
  let shared = a
    .bytes()
    .zip(b.bytes())
    .take_while(|(x, y)| x == y)
    .count();
  &a[..shared]
}

/// Serde helper for optional expression fields read from definition files.
pub(crate) fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Option::<String>::deserialize(deserializer)?;
  Ok(raw.map(|text| normalize_expression(&text)))
}
