use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::model::InfoReport;

const TITLE: &str = "File Information";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Bordered table, coloured on terminals
    #[default]
    Table,
    /// Aligned `key : value` lines
    Plain,
    /// Pretty-printed JSON
    Json,
}

pub fn render(report: &InfoReport, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Table => Ok(render_table(report)),
        OutputFormat::Plain => Ok(render_plain(report)),
        OutputFormat::Json => render_json(report),
    }
}

/// Title, underline, blank line, then one `key : value` line per entry with
/// keys padded to the widest one.
pub fn render_plain(report: &InfoReport) -> String {
    let width = report.max_key_width();
    let mut out = format!("{TITLE}\n{}\n\n", "=".repeat(TITLE.len()));
    for entry in report.entries() {
        out.push_str(&format!("{:<width$} : {}\n", entry.key, entry.value));
    }
    out
}

pub fn render_table(report: &InfoReport) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Property").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

    for entry in report.entries() {
        table.add_row(vec![
            Cell::new(&entry.key).fg(Color::Cyan),
            Cell::new(&entry.value),
        ]);
    }

    format!("{TITLE}: {}\n{table}\n", report.path.display())
}

pub fn render_json(report: &InfoReport) -> Result<String, serde_json::Error> {
    let mut out = serde_json::to_string_pretty(report)?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InfoReport {
        let mut report = InfoReport::new("/tmp/notes.txt");
        report.add("Size", "24.00 B");
        report.add("Last modified", "Mon Jan  1 10:00:00 2024");
        report.add("Lines", "2");
        report
    }

    #[test]
    fn test_plain_layout() {
        let expected = "\
File Information
================

Size          : 24.00 B
Last modified : Mon Jan  1 10:00:00 2024
Lines         : 2
";
        assert_eq!(render_plain(&sample()), expected);
    }

    #[test]
    fn test_plain_empty_report() {
        let report = InfoReport::new("/tmp/x");
        assert_eq!(render_plain(&report), "File Information\n================\n\n");
    }

    #[test]
    fn test_table_contains_entries() {
        let table = render_table(&sample());

        assert!(table.starts_with("File Information: /tmp/notes.txt\n"));
        assert!(table.contains("Property"));
        assert!(table.contains("Last modified"));
        assert!(table.contains("10:00:00 2024"));
        assert!(table.contains('╭'));
    }

    #[test]
    fn test_json_output() {
        let json = render(&sample(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["path"], "/tmp/notes.txt");
        assert_eq!(value["entries"][0]["key"], "Size");
        assert_eq!(value["entries"][2]["value"], "2");
    }
}
