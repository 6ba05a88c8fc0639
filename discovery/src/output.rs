//! Output formatting for metadata, discrepancies and reports.

use entity_schema_core::{Discrepancy, Metadata};
use serde::Serialize;

use crate::report::ReconcileReport;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
}

fn serialize<T: Serialize + ?Sized>(
    value: &T,
    format: OutputFormat,
) -> Option<Result<String, String>> {
    match format {
        OutputFormat::Json => Some(
            serde_json::to_string_pretty(value)
                .map_err(|e| format!("JSON serialization failed: {e}")),
        ),
        OutputFormat::Yaml => Some(
            serde_yaml::to_string(value).map_err(|e| format!("YAML serialization failed: {e}")),
        ),
        OutputFormat::Table => None,
    }
}

/// Formats command metadata in the requested output format.
pub fn format_metadata(metadata: &Metadata, format: OutputFormat) -> Result<String, String> {
    serialize(metadata, format).unwrap_or_else(|| Ok(metadata_to_table(metadata)))
}

/// Formats compatibility discrepancies in the requested output format.
pub fn format_discrepancies(
    discrepancies: &[Discrepancy],
    format: OutputFormat,
) -> Result<String, String> {
    serialize(discrepancies, format).unwrap_or_else(|| {
        let mut out = String::new();
        for d in discrepancies {
            out.push_str(&format!("{d}\n"));
        }
        Ok(out)
    })
}

/// Formats a reconciliation report in the requested output format.
pub fn format_report(report: &ReconcileReport, format: OutputFormat) -> Result<String, String> {
    serialize(report, format).unwrap_or_else(|| Ok(report_to_table(report)))
}

/// Formats a list of stored procedure names.
pub fn format_procedures(names: &[String], format: OutputFormat) -> Result<String, String> {
    serialize(names, format).unwrap_or_else(|| {
        let mut out = String::new();
        for name in names {
            out.push_str(name);
            out.push('\n');
        }
        Ok(out)
    })
}

fn metadata_to_table(metadata: &Metadata) -> String {
    let mut out = String::new();

    if !metadata.parameters.is_empty() {
        out.push_str("Parameters:\n");
        let width = metadata
            .parameters
            .iter()
            .map(|p| p.name.len())
            .max()
            .unwrap_or(4);
        for param in &metadata.parameters {
            let direction = if param.is_output { "  output" } else { "" };
            out.push_str(&format!(
                "  {:<width$}  {:<10}  {}{direction}\n",
                param.name, param.sys_type, param.db_type
            ));
        }
    }

    if !metadata.columns.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("Columns:\n");
        let width = metadata
            .columns
            .iter()
            .map(|c| c.name.len())
            .max()
            .unwrap_or(4);
        for column in &metadata.columns {
            out.push_str(&format!(
                "  {:<width$}  {:<10}  {}\n",
                column.name, column.sys_type, column.db_type
            ));
        }
    }

    if out.is_empty() {
        out.push_str("(no parameters, no columns)\n");
    }
    out
}

fn report_to_table(report: &ReconcileReport) -> String {
    let mut out = String::new();
    let status = if !report.accepted {
        "CANCELLED"
    } else if report.has_problems() {
        "FAIL"
    } else {
        "OK"
    };
    out.push_str(&format!("{:<20} {status}", report.entity));
    if report.columns_changed {
        out.push_str("  [columns changed]");
    }
    out.push('\n');

    for d in &report.discrepancies {
        out.push_str(&format!("  ~ {d}\n"));
    }
    for query in &report.ok {
        out.push_str(&format!("  ok     {query}\n"));
    }
    for query in &report.errored {
        out.push_str(&format!("  error  {query}\n"));
    }
    for failure in &report.failures {
        out.push_str(&format!("  failed {}: {}\n", failure.query, failure.message));
    }
    if let Some(summary) = report.summary() {
        out.push('\n');
        out.push_str(&summary);
        out.push('\n');
    }
    out
}
