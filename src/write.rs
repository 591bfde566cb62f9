//! CIF 2.0 text writer, driven by the traversal engine.

use tracing::debug;

use crate::config::WriteOptions;
use crate::dom::{Block, Document, Frame, Loop, PacketRef};
use crate::status::{CifError, Result};
use crate::value::{Number, Quoting, Value};
use crate::visit::{HandlerResult, Traverse, Visitor};

/// Render `doc` as CIF 2.0 text with default options.
pub fn write(doc: &Document) -> Result<String> {
    write_with(doc, &WriteOptions::default())
}

/// Render `doc` as CIF 2.0 text.
///
/// Loops without packets are omitted, since CIF syntax cannot express them.
/// A string no CIF 2.0 delimiter can hold fails with
/// [`CifError::DisallowedValue`].
pub fn write_with(doc: &Document, options: &WriteOptions) -> Result<String> {
    let mut writer = Writer {
        options,
        out: String::new(),
        line_len: 0,
        scalars: false,
        error: None,
    };
    doc.walk(&mut writer)?;
    if let Some(err) = writer.error {
        return Err(err);
    }
    writer.end_line();
    debug!(bytes = writer.out.len(), "wrote document");
    Ok(writer.out)
}

struct Writer<'a> {
    options: &'a WriteOptions,
    out: String,
    /// Characters on the current output line.
    line_len: usize,
    /// Whether the loop being written holds the container's scalar items.
    scalars: bool,
    /// Set when a value cannot be written; the walk ends there.
    error: Option<CifError>,
}

impl Writer<'_> {
    fn end_line(&mut self) {
        if self.line_len > 0 {
            self.out.push('\n');
            self.line_len = 0;
        }
    }

    fn line(&mut self, text: &str) {
        self.end_line();
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Append a whitespace-separated token, wrapping before the line limit.
    fn token(&mut self, token: &str) {
        if self.line_len > 0 && !token.starts_with('\n') {
            if self.line_len + 1 + token.chars().count() > self.options.max_line_length {
                self.end_line();
            } else {
                self.out.push(' ');
                self.line_len += 1;
            }
        }
        self.out.push_str(token);
        self.line_len = match token.rfind('\n') {
            Some(i) => token[i + 1..].chars().count(),
            None => self.line_len + token.chars().count(),
        };
    }
}

impl Visitor for Writer<'_> {
    fn document_start(&mut self, _: &Document) -> HandlerResult {
        if self.options.header {
            self.line("#\\#CIF_2.0");
        }
        Ok(Traverse::Persist)
    }

    fn block_start(&mut self, block: &Block) -> HandlerResult {
        self.end_line();
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.line(&format!("data_{}", block.code()));
        Ok(Traverse::Persist)
    }

    fn frame_start(&mut self, frame: &Frame) -> HandlerResult {
        self.line("");
        self.line(&format!("save_{}", frame.code()));
        Ok(Traverse::Persist)
    }

    fn frame_end(&mut self, _: &Frame) -> HandlerResult {
        self.line("save_");
        Ok(Traverse::Persist)
    }

    fn loop_start(&mut self, lp: &Loop) -> HandlerResult {
        self.scalars = lp.is_reserved();
        if self.scalars {
            return Ok(Traverse::Persist);
        }
        if lp.is_empty() {
            return Ok(Traverse::Skip);
        }
        self.line("");
        self.line("loop_");
        for name in lp.names() {
            self.line(name);
        }
        Ok(Traverse::Persist)
    }

    fn packet_end(&mut self, _: PacketRef<'_>) -> HandlerResult {
        self.end_line();
        Ok(Traverse::Persist)
    }

    fn item_start(&mut self, name: Option<&str>, value: &Value) -> HandlerResult {
        let text = match format_value(value) {
            Ok(text) => text,
            Err(err) => {
                self.error = Some(err);
                return Ok(Traverse::End);
            }
        };
        if self.scalars {
            self.end_line();
            self.token(name.unwrap_or_default());
            self.token(&text);
            self.end_line();
        } else {
            self.token(&text);
        }
        // aggregates are rendered whole
        Ok(Traverse::Skip)
    }
}

fn format_value(value: &Value) -> Result<String> {
    let text = match value {
        Value::Inapplicable => ".".to_string(),
        Value::Unknown => "?".to_string(),
        Value::Number(n) => n.text().to_string(),
        Value::Str(s, Quoting::Unquoted) if is_bare(s) => s.clone(),
        Value::Str(s, _) => quote(s, true)?,
        Value::List(list) => {
            let parts = list.iter().map(format_value).collect::<Result<Vec<_>>>()?;
            format!("[{}]", parts.join(" "))
        }
        Value::Table(table) => {
            let parts = table
                .iter()
                .map(|(k, v)| -> Result<String> {
                    Ok(format!("{}:{}", quote(k, false)?, format_value(v)?))
                })
                .collect::<Result<Vec<_>>>()?;
            format!("{{{}}}", parts.join(" "))
        }
    };
    Ok(text)
}

/// `true` if `s` reads back as the same unquoted string.
fn is_bare(s: &str) -> bool {
    let Some(first) = s.chars().next() else {
        return false;
    };
    if matches!(first, '_' | '#' | '$' | '\'' | '"' | ';') {
        return false;
    }
    if s
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '[' | ']' | '{' | '}'))
    {
        return false;
    }
    let lower = s.to_ascii_lowercase();
    if lower.starts_with("data_")
        || lower.starts_with("save_")
        || lower == "loop_"
        || lower == "global_"
        || lower == "stop_"
    {
        return false;
    }
    s != "." && s != "?" && s.parse::<Number>().is_err()
}

/// The lightest delimited form that reads back as `s`.
///
/// Text fields are preferred for multi-line strings and are the last resort
/// for single-line ones. Table keys cannot be text fields.
fn quote(s: &str, allow_text_field: bool) -> Result<String> {
    let multiline = s.contains(|c: char| c == '\n' || c == '\r');
    if !multiline && !s.contains('\'') {
        return Ok(format!("'{s}'"));
    }
    if !multiline && !s.contains('"') {
        return Ok(format!("\"{s}\""));
    }
    let text_field = allow_text_field && !s.contains("\n;") && !s.ends_with('\r');
    if multiline && text_field {
        return Ok(format!("\n;{s}\n;"));
    }
    for delimiter in ["'''", "\"\"\""] {
        if !s.contains(delimiter) && !s.ends_with(&delimiter[..1]) {
            return Ok(format!("{delimiter}{s}{delimiter}"));
        }
    }
    if text_field {
        return Ok(format!("\n;{s}\n;"));
    }
    Err(CifError::DisallowedValue(format!(
        "{s:?} has no CIF 2.0 delimited form"
    )))
}
