//! Diagnostic log records for commands.

use std::fmt;

/// A label/value rendering of one command, with its encapsulated children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Command name.
    pub name: &'static str,
    /// Field labels and rendered values, in display order.
    pub fields: Vec<(&'static str, String)>,
    /// Entries of encapsulated commands.
    pub encapsulated: Vec<LogEntry>,
}

impl LogEntry {
    /// Entry without fields.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
            encapsulated: Vec::new(),
        }
    }

    /// Look up a field by label.
    pub fn field(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v.as_str())
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        writeln!(f, "{}{}", pad, self.name)?;
        for (label, value) in &self.fields {
            writeln!(f, "{}  {}: {}", pad, label, value)?;
        }
        for child in &self.encapsulated {
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

/// Renders the fields of a command for [`LogEntry`].
pub trait LogFields {
    /// Field labels and rendered values. Encapsulated commands are not
    /// included; they get their own entries.
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Render an optional field, or `"-"` when it is absent.
pub(crate) fn opt<T: fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}
