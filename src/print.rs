//! Fixed-width text tables
//!
//! Pure rendering functions; [`crate::DatabaseWorker::print`] writes the
//! result to standard output.

use crate::config::WorkerConfig;
use crate::db::types::QueryResults;
use unicode_truncate::{Alignment, UnicodeTruncateStr};
use unicode_width::UnicodeWidthStr;

const SEPARATOR: &str = " |";

/// Width of every result column.
///
/// The configured width for the column's type name (default 10), widened
/// to fit the column name.
pub fn column_widths(results: &QueryResults, config: &WorkerConfig) -> Vec<usize> {
    results
        .columns
        .iter()
        .map(|col| config.field_width(&col.type_name).max(col.name.width()))
        .collect()
}

/// Render results as a left-aligned, `|`-separated table.
///
/// One header line with the column names, then one line per row. Values
/// wider than their column are cut off; nothing is escaped. A result without
/// rows renders as nothing at all.
pub fn render_table(results: &QueryResults, config: &WorkerConfig) -> String {
    if results.is_empty() {
        return String::new();
    }
    let widths = column_widths(results, config);
    let mut out = String::new();

    render_line(&mut out, results.columns.iter().map(|c| c.name.clone()), &widths);
    for row in &results.rows {
        render_line(&mut out, row.values.iter().map(|v| v.display_text()), &widths);
    }
    out
}

fn render_line(out: &mut String, fields: impl Iterator<Item = String>, widths: &[usize]) {
    for (field, &width) in fields.zip(widths) {
        out.push_str(&field.unicode_pad(width, Alignment::Left, true));
        out.push_str(SEPARATOR);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::{CellValue, ColumnDef, DataType, Row};
    use std::time::Duration;

    fn column(name: &str, type_name: &str, data_type: DataType) -> ColumnDef {
        ColumnDef {
            name: name.to_string(),
            type_name: type_name.to_string(),
            data_type,
        }
    }

    fn sample_results() -> QueryResults {
        QueryResults::new(
            vec![
                column("id", "int4", DataType::Integer),
                column("description", "text", DataType::Text),
            ],
            vec![
                Row {
                    values: vec![
                        CellValue::Integer(1),
                        CellValue::Text("short".to_string()),
                    ],
                },
                Row {
                    values: vec![
                        CellValue::Integer(123456),
                        CellValue::Text("a considerably longer value".to_string()),
                    ],
                },
            ],
            Duration::from_millis(1),
            2,
        )
    }

    fn config(yaml: &str) -> WorkerConfig {
        WorkerConfig::from_yaml(yaml).unwrap()
    }

    #[test]
    fn test_column_widths() {
        let widths = column_widths(&sample_results(), &config("field_length_mapping:\n  int4: 4\n"));
        // int4 configured to 4; text defaults to 10 but the header needs 11
        assert_eq!(widths, vec![4, 11]);
    }

    #[test]
    fn test_render_two_rows() {
        let table = render_table(&sample_results(), &config("field_length_mapping:\n  int4: 4\n"));
        let expected = "\
id   |description |
1    |short       |
1234 |a considera |
";
        assert_eq!(table, expected);
    }

    #[test]
    fn test_render_default_widths() {
        let table = render_table(&sample_results(), &config(""));
        let first = table.lines().nth(1).unwrap();
        assert_eq!(first, "1          |short       |");
    }

    #[test]
    fn test_render_empty_result_prints_nothing() {
        let mut results = sample_results();
        results.rows.clear();
        assert_eq!(render_table(&results, &config("")), "");
    }

    #[test]
    fn test_render_null_and_wide_chars() {
        let results = QueryResults::new(
            vec![column("name", "text", DataType::Text)],
            vec![
                Row {
                    values: vec![CellValue::Null],
                },
                Row {
                    values: vec![CellValue::Text("日本語のテキスト".to_string())],
                },
            ],
            Duration::from_millis(1),
            2,
        );
        let table = render_table(&results, &config(""));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[1], "NULL       |");
        // five double-width characters fill the ten columns
        assert_eq!(lines[2], "日本語のテ |");
    }
}
