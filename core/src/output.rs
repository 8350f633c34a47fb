//! JSON rendering of port records.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::domain::PortRecord;
use crate::error::{Error, Result};

/// Indent width of the default output.
pub const DEFAULT_INDENT: usize = 4;

/// How records are written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed with the given indent width.
    Pretty { indent: usize },
    /// Single line.
    Compact,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Pretty {
            indent: DEFAULT_INDENT,
        }
    }
}

impl OutputFormat {
    pub fn render(&self, records: &[PortRecord]) -> Result<String> {
        match self {
            OutputFormat::Pretty { indent } => render_json(records, *indent),
            OutputFormat::Compact => render_compact(records),
        }
    }
}

/// Render records as a pretty-printed JSON array indented by `indent` spaces.
pub fn render_json(records: &[PortRecord], indent: usize) -> Result<String> {
    let indent = " ".repeat(indent);
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut serializer)?;
    String::from_utf8(buf)
        .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in JSON output: {}", e)))
}

/// Render records as a single-line JSON array.
pub fn render_compact(records: &[PortRecord]) -> Result<String> {
    Ok(serde_json::to_string(records)?)
}
