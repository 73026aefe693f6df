use std::io;

use serde_json::Value;

use super::format::{self, Column};
use super::upload_shared::{array_of, file_of, get_str, render_file_summary, render_mapped_errors};

pub fn render_preview(data: &Value) -> io::Result<String> {
    let file = file_of(data)?;
    let template = get_str(data, "template").unwrap_or("unknown");
    let headers = array_of(data, "headers")
        .iter()
        .map(|header| header.as_str().unwrap_or("").to_string())
        .collect::<Vec<String>>();
    let total_rows = data.get("total_rows").and_then(Value::as_u64).unwrap_or(0);
    let start = data.get("window_start").and_then(Value::as_u64).unwrap_or(0);
    let end = data.get("window_end").and_then(Value::as_u64).unwrap_or(0);
    let width = format::terminal_width();

    let mut lines = vec!["Preview:".to_string()];
    lines.extend(render_file_summary(template, file));
    lines.extend(format::key_value_rows(
        &[(
            "Showing:",
            format!("data rows {start}..{end} of {total_rows}"),
        )],
        2,
    ));

    if let Some(advisory) = data.get("advisory").and_then(|value| get_str(value, "message")) {
        lines.push(String::new());
        lines.push(format!("Note: {advisory}"));
    }

    lines.push(String::new());
    if headers.is_empty() {
        lines.push("The file has no rows to show.".to_string());
    } else {
        let mut columns = vec![Column::right("#")];
        columns.extend(headers.iter().map(|header| Column::left(header)));
        let rows = array_of(data, "rows")
            .iter()
            .map(|row| {
                let index = row.get("index").and_then(Value::as_u64).unwrap_or(0);
                let mut cells = vec![index.to_string()];
                cells.extend(
                    array_of(row, "cells")
                        .iter()
                        .map(|cell| cell.as_str().unwrap_or("").to_string()),
                );
                cells
            })
            .collect::<Vec<Vec<String>>>();
        lines.extend(format::render_grid(&columns, &rows, width, "Data row"));
    }

    lines.push(String::new());
    lines.extend(render_mapped_errors(array_of(data, "validation_errors"), width));
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::render_preview;

    #[test]
    fn shows_window_rows_advisory_and_errors() {
        let data = json!({
            "template": "debtor",
            "file": {"name": "big.csv", "status": "error", "row_count": 40, "column_count": 2},
            "headers": ["vendor_name", "currency"],
            "total_rows": 40,
            "virtualized": true,
            "window_start": 5,
            "window_end": 7,
            "rows": [
                {"index": 5, "cells": ["Acme", "USD"]},
                {"index": 6, "cells": ["", "EUR"]}
            ],
            "advisory": {"data_rows": 40, "threshold": 20, "message": "Large file: 40 data rows."},
            "validation_errors": [
                {"description": "Missing required field: vendor_name", "data_row": 6, "column_name": "vendor_name", "current_value": ""}
            ]
        });

        let rendered = render_preview(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("data rows 5..7 of 40"));
            assert!(text.contains("Note: Large file: 40 data rows."));
            assert!(text.contains("Acme"));
            assert!(text.contains("Problems (1):"));
        }
    }

    #[test]
    fn empty_grids_render_a_placeholder() {
        let data = json!({
            "template": "debtor",
            "file": {"name": "empty.csv", "status": "error"},
            "headers": [],
            "rows": [],
            "validation_errors": []
        });
        let rendered = render_preview(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("The file has no rows to show."));
        }
    }
}
