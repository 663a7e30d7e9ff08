//! CSV / JSON export of a list page

use std::io::Write;
use std::str::FromStr;

use anyhow::{Context, Result};
use unicode_width::UnicodeWidthStr;

use crate::models::Record;
use crate::table::{DataTable, RenderedRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Table,
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" | "text" => Ok(ExportFormat::Table),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(anyhow::anyhow!(
                "Unsupported format: {}. Supported formats: table, csv, json",
                other
            )),
        }
    }
}

/// Columns worth exporting; the synthetic actions column is left out
fn exported_columns(table: &DataTable<Record>) -> Vec<usize> {
    table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.accessor != "actions")
        .map(|(i, _)| i)
        .collect()
}

/// Write rendered cells (the same text the table shows) as CSV
pub fn write_csv<W: Write>(table: &DataTable<Record>, rows: &[Record], writer: W) -> Result<()> {
    let keep = exported_columns(table);
    let mut csv = csv::Writer::from_writer(writer);

    let headers = table.headers();
    csv.write_record(keep.iter().map(|&i| headers[i].as_str()))
        .context("Failed to write CSV header")?;

    for row in table.render(rows, false).rows {
        if let RenderedRow::Cells(cells) = row {
            csv.write_record(keep.iter().map(|&i| cells[i].as_str()))
                .context("Failed to write CSV row")?;
        }
    }

    csv.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Raw records as pretty JSON
pub fn write_json<W: Write>(rows: &[Record], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, rows).context("Failed to write JSON")?;
    writeln!(writer)?;
    Ok(())
}

/// Widest a text column may grow before cells are cut
const MAX_COLUMN_WIDTH: usize = 30;

fn fit(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    if text.width() > width {
        for c in text.chars() {
            let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
            if used + w + 1 > width {
                break;
            }
            out.push(c);
            used += w;
        }
        out.push('…');
        used += 1;
    } else {
        out.push_str(text);
        used = text.width();
    }
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

/// Aligned plain-text table for the terminal
pub fn write_table<W: Write>(table: &DataTable<Record>, rows: &[Record], mut writer: W) -> Result<()> {
    let keep = exported_columns(table);
    let headers = table.headers();
    let rendered = table.render(rows, false);

    let cells: Vec<&Vec<String>> = rendered
        .rows
        .iter()
        .filter_map(|row| match row {
            RenderedRow::Cells(cells) => Some(cells),
            RenderedRow::Message(_) => None,
        })
        .collect();

    let widths: Vec<usize> = keep
        .iter()
        .map(|&i| {
            cells
                .iter()
                .filter_map(|c| c.get(i))
                .map(|c| c.width())
                .chain(std::iter::once(headers[i].width()))
                .max()
                .unwrap_or(0)
                .clamp(3, MAX_COLUMN_WIDTH)
        })
        .collect();

    let line = |values: Vec<&str>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, &w)| fit(v, w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    writeln!(writer, "{}", line(keep.iter().map(|&i| headers[i].as_str()).collect()))?;
    let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    writeln!(writer, "{}", "-".repeat(total))?;

    for row in &rendered.rows {
        match row {
            RenderedRow::Cells(c) => {
                writeln!(writer, "{}", line(keep.iter().map(|&i| c[i].as_str()).collect()))?
            }
            RenderedRow::Message(message) => writeln!(writer, "{}", message)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::Resource;
    use serde_json::json;

    #[test]
    fn test_csv_uses_rendered_cells_without_actions() {
        let rows = vec![Record(json!({
            "name": "1 Hour, city", "duration_minutes": 60, "price": "50",
            "package_type": "hourly", "payment_model": "prepaid", "is_active": true
        }))];
        let mut out = Vec::new();
        write_csv(&Resource::Packages.table(), &rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Name,Duration,Price,Type,Payment,Active"));
        assert_eq!(
            lines.next(),
            Some("\"1 Hour, city\",60 min,50.00,Hourly,Prepaid,Yes")
        );
    }

    #[test]
    fn test_empty_csv_has_only_header() {
        let mut out = Vec::new();
        write_csv(&Resource::Amenities.table(), &[], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_json_export() {
        let mut out = Vec::new();
        write_json(&[Record(json!({ "id": 1 }))], &mut out).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, json!([{ "id": 1 }]));
    }

    #[test]
    fn test_table_aligns_and_truncates() {
        let rows = vec![
            Record(json!({ "name": "WiFi", "description": "Free wireless", "is_active": true })),
            Record(json!({
                "name": "Charging lockers with very long descriptive name",
                "description": null, "is_active": false
            })),
        ];
        let mut out = Vec::new();
        write_table(&Resource::Amenities.table(), &rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Name"));
        assert!(lines[1].chars().all(|c| c == '-'));
        assert!(lines[2].starts_with("WiFi "));
        assert!(lines[3].contains('…'));
        assert!(!text.contains("Actions"));
    }

    #[test]
    fn test_empty_table_prints_message() {
        let mut out = Vec::new();
        write_table(&Resource::Amenities.table(), &[], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("No amenities found"));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
