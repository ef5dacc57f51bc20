//! Canonical text encoder.
//!
//! Renders a normalized [`Value`] as block-style YAML under a fixed set of
//! rules the orchestrator and human readers rely on:
//!
//! - strings are double-quoted, or folded (`>`) when they contain a line break
//! - booleans and numbers are bare literals
//! - mapping keys are never quoted
//! - absent values never appear, there is no null token
//! - block layout with two-space indentation; only empty collections use
//!   the inline `{}` / `[]` form
//! - folded text wraps at the configured width, quoted text never wraps
//!
//! ```text
//! input: "Dolomiti"
//! _workflow:
//!   steps:
//!   - function: "wikipedia/it"
//!     xin: >-
//!       {
//!         title: start.input.page
//!       }
//!   - id: "chunking"
//!     function: "chunker/chunk"
//! ```

use gpipe_definition::Pipeline;
use gpipe_value::{EncodingError, Mapping, Value, normalize};

/// Default column at which folded scalars wrap.
pub const DEFAULT_WIDTH: usize = 120;

const INDENT: usize = 2;

/// Normalize a pipeline and render it as canonical text.
pub fn encode_text(pipeline: &Pipeline) -> Result<String, EncodingError> {
  let document = normalize(pipeline)?;
  Ok(CanonicalWriter::new().write(&document))
}

/// Writes a [`Value`] as canonical text.
///
/// Pure: the same value always produces the same text. Null entries are
/// skipped wherever they appear, so passing a value that was not normalized
/// still never yields a null token.
#[derive(Debug, Clone, Copy)]
pub struct CanonicalWriter {
  width: usize,
}

impl Default for CanonicalWriter {
  fn default() -> Self {
    Self {
      width: DEFAULT_WIDTH,
    }
  }
}

impl CanonicalWriter {
  pub fn new() -> Self {
    Self::default()
  }

  /// Column after which folded scalars may wrap.
  pub fn with_width(mut self, width: usize) -> Self {
    self.width = width;
    self
  }

  pub fn width(&self) -> usize {
    self.width
  }

  /// Render a complete document. A top-level null renders as nothing.
  pub fn write(&self, value: &Value) -> String {
    let mut out = String::new();
    match value {
      Value::Null => {}
      Value::Mapping(map) if has_entries(map) => self.write_mapping(&mut out, map, 0, false),
      Value::Sequence(items) if has_items(items) => self.write_sequence(&mut out, items, 0, false),
      other => {
        self.write_inline(&mut out, other, INDENT);
        out.push('\n');
      }
    }
    out
  }

  fn write_mapping(&self, out: &mut String, map: &Mapping, indent: usize, inline_first: bool) {
    let entries = map.iter().filter(|(_, v)| !v.is_null());
    for (i, (key, value)) in entries.enumerate() {
      if i > 0 || !inline_first {
        push_indent(out, indent);
      }
      out.push_str(key);
      out.push(':');

      match value {
        Value::Mapping(inner) if has_entries(inner) => {
          out.push('\n');
          self.write_mapping(out, inner, indent + INDENT, false);
        }
        // Sequences under a key sit at the key's own indentation.
        Value::Sequence(items) if has_items(items) => {
          out.push('\n');
          self.write_sequence(out, items, indent, false);
        }
        other => {
          out.push(' ');
          self.write_inline(out, other, indent + INDENT);
          out.push('\n');
        }
      }
    }
  }

  fn write_sequence(&self, out: &mut String, items: &[Value], indent: usize, inline_first: bool) {
    let items = items.iter().filter(|v| !v.is_null());
    for (i, item) in items.enumerate() {
      if i > 0 || !inline_first {
        push_indent(out, indent);
      }
      out.push_str("- ");

      match item {
        Value::Mapping(inner) if has_entries(inner) => {
          self.write_mapping(out, inner, indent + INDENT, true);
        }
        Value::Sequence(inner) if has_items(inner) => {
          self.write_sequence(out, inner, indent + INDENT, true);
        }
        other => {
          self.write_inline(out, other, indent + INDENT);
          out.push('\n');
        }
      }
    }
  }

  /// Scalars and empty collections. Folded strings continue on the
  /// following lines at `block_indent`; the caller adds the final newline.
  fn write_inline(&self, out: &mut String, value: &Value, block_indent: usize) {
    match value {
      Value::Null => {}
      Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
      Value::Number(n) => out.push_str(&n.to_string()),
      Value::String(s) => {
        if s.contains('\n') && can_fold(s) {
          self.write_folded(out, s, block_indent);
        } else {
          write_double_quoted(out, s);
        }
      }
      Value::Sequence(_) => out.push_str("[]"),
      Value::Mapping(_) => out.push_str("{}"),
    }
  }

  /// Folded block scalar. Every body line is preceded by its break, so the
  /// last line is left open like any other scalar.
  fn write_folded(&self, out: &mut String, text: &str, indent: usize) {
    out.push('>');
    if text.starts_with([' ', '\t', '\n']) {
      out.push_str(&INDENT.to_string());
    }

    // Chomping: strip when there is no final break, keep when there are
    // several, clip (no indicator) for exactly one.
    let body = match text.strip_suffix('\n') {
      None => {
        out.push('-');
        text
      }
      Some(rest) => {
        if rest.is_empty() || rest.ends_with('\n') {
          out.push('+');
        }
        rest
      }
    };

    let mut prev_was_text = false;
    for line in body.split('\n') {
      out.push('\n');
      if line.is_empty() {
        continue;
      }
      let spaced = line.starts_with([' ', '\t']);
      // A single break between two unindented lines would fold to a space;
      // an extra blank line keeps it a break.
      if prev_was_text && !spaced {
        out.push('\n');
      }
      push_indent(out, indent);
      if spaced {
        out.push_str(line);
      } else {
        self.write_wrapped(out, line, indent);
      }
      prev_was_text = !spaced;
    }
  }

  /// Write one unindented line of folded text, replacing a single space with
  /// a line break once the column passes the width. Breaks only fall between
  /// two non-blank characters, which the fold turns back into one space.
  fn write_wrapped(&self, out: &mut String, line: &str, indent: usize) {
    let chars: Vec<char> = line.chars().collect();
    let mut column = indent;
    for (i, &ch) in chars.iter().enumerate() {
      let single_space = ch == ' '
        && i > 0
        && !is_blank(chars[i - 1])
        && chars.get(i + 1).is_some_and(|next| !is_blank(*next));
      if single_space && column > self.width {
        out.push('\n');
        push_indent(out, indent);
        column = indent;
        continue;
      }
      out.push(ch);
      column += 1;
    }
  }
}

fn has_entries(map: &Mapping) -> bool {
  map.values().any(|v| !v.is_null())
}

fn has_items(items: &[Value]) -> bool {
  items.iter().any(|v| !v.is_null())
}

fn push_indent(out: &mut String, indent: usize) {
  out.extend(std::iter::repeat_n(' ', indent));
}

/// Whether a folded scalar reproduces `text` exactly. Tabs and spaces
/// anywhere are block content; only other control characters and the
/// characters a reader treats as line breaks are not.
fn can_fold(text: &str) -> bool {
  text
    .chars()
    .all(|ch| ch == '\n' || ch == '\t' || is_printable(ch))
}

fn is_blank(ch: char) -> bool {
  ch == ' ' || ch == '\t'
}

fn is_printable(ch: char) -> bool {
  matches!(ch,
    '\u{20}'..='\u{7E}'
    | '\u{A0}'..='\u{D7FF}'
    | '\u{E000}'..='\u{FFFD}'
    | '\u{10000}'..='\u{10FFFF}')
    && !matches!(ch, '\u{2028}' | '\u{2029}' | '\u{FEFF}')
}

fn write_double_quoted(out: &mut String, text: &str) {
  out.push('"');
  for ch in text.chars() {
    match ch {
      '"' => out.push_str("\\\""),
      '\\' => out.push_str("\\\\"),
      '\0' => out.push_str("\\0"),
      '\u{07}' => out.push_str("\\a"),
      '\u{08}' => out.push_str("\\b"),
      '\t' => out.push_str("\\t"),
      '\n' => out.push_str("\\n"),
      '\u{0B}' => out.push_str("\\v"),
      '\u{0C}' => out.push_str("\\f"),
      '\r' => out.push_str("\\r"),
      '\u{1B}' => out.push_str("\\e"),
      '\u{85}' => out.push_str("\\N"),
      '\u{2028}' => out.push_str("\\L"),
      '\u{2029}' => out.push_str("\\P"),
      c if is_printable(c) => out.push(c),
      c if (c as u32) <= 0xFF => out.push_str(&format!("\\x{:02X}", c as u32)),
      c => out.push_str(&format!("\\u{:04X}", c as u32)),
    }
  }
  out.push('"');
}
