use crate::cli::args::OutputFormat;
use crate::core::snapshot::Snapshot;
use serde_json::Value;
use std::io::{self, Write};
use tabled::{Table, Tabled};

/// Output writer trait for different formats
pub trait OutputWriter {
    fn write_snapshot(&self, snapshot: &Snapshot) -> Result<(), OutputError>;
}

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl From<OutputError> for crate::domain::error::HuberError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

/// Render a snapshot in the given format
pub fn render_snapshot(format: OutputFormat, snapshot: &Snapshot) -> Result<String, OutputError> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(snapshot)?,
        OutputFormat::Text => snapshot
            .flatten()
            .into_iter()
            .map(|(path, value)| format!("{}: {}", path, display_value(&value)))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Table => {
            let rows: Vec<SnapshotTableRow> = snapshot
                .flatten()
                .into_iter()
                .map(|(field, value)| SnapshotTableRow {
                    field,
                    value: display_value(&value),
                })
                .collect();
            Table::new(rows).to_string()
        }
    };
    Ok(rendered)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "unknown".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Console output writer
pub struct ConsoleWriter {
    format: OutputFormat,
}

impl ConsoleWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl OutputWriter for ConsoleWriter {
    fn write_snapshot(&self, snapshot: &Snapshot) -> Result<(), OutputError> {
        let rendered = render_snapshot(self.format, snapshot)?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", rendered)?;
        Ok(())
    }
}

/// Table row for one snapshot field
#[derive(Tabled)]
struct SnapshotTableRow {
    field: String,
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_snapshot() -> Snapshot {
        let mut snapshot = Snapshot::new();
        snapshot.insert("temperature.setpoint", 50.0).unwrap();
        snapshot.insert("on", true).unwrap();
        snapshot.insert("fill", Option::<f64>::None).unwrap();
        snapshot
    }

    #[test]
    fn test_json_output_sorted() {
        let rendered = render_snapshot(OutputFormat::Json, &create_test_snapshot()).unwrap();
        let parsed: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["temperature"]["setpoint"], 50.0);
        assert!(rendered.find("\"fill\"").unwrap() < rendered.find("\"on\"").unwrap());
    }

    #[test]
    fn test_text_output() {
        let rendered = render_snapshot(OutputFormat::Text, &create_test_snapshot()).unwrap();
        assert_eq!(rendered, "fill: unknown\non: true\ntemperature.setpoint: 50.0");
    }

    #[test]
    fn test_table_output() {
        let rendered = render_snapshot(OutputFormat::Table, &create_test_snapshot()).unwrap();
        assert!(rendered.contains("temperature.setpoint"));
        assert!(rendered.contains("field"));
        assert!(rendered.contains("unknown"));
    }
}
