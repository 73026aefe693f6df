use std::io;

use serde_json::Value;

use super::format;
use super::upload_shared::{array_of, file_of, get_count, get_str, render_file_summary, render_mapped_errors};

pub fn render_correct(data: &Value) -> io::Result<String> {
    let file = file_of(data)?;
    let template = get_str(data, "template").unwrap_or("unknown");
    let summary = data
        .get("summary")
        .ok_or_else(|| io::Error::other("correct output requires summary"))?;

    let mut lines = vec!["Corrections applied:".to_string()];
    lines.extend(render_file_summary(template, file));
    lines.extend(format::key_value_rows(
        &[
            ("Rows removed:", get_count(summary, "rows_removed")),
            ("Cells updated:", get_count(summary, "cells_updated")),
            (
                "Problems:",
                format!(
                    "{} before, {} after",
                    get_count(summary, "errors_before"),
                    get_count(summary, "errors_after")
                ),
            ),
        ],
        2,
    ));
    match get_str(data, "output_path") {
        Some(path) => lines.push(format!("  Wrote corrected file to {path}")),
        None => lines.push("  No output written. Pass --output <path> to save the result.".to_string()),
    }

    lines.push(String::new());
    lines.extend(render_mapped_errors(
        array_of(data, "validation_errors"),
        format::terminal_width(),
    ));
    Ok(lines.join("\n"))
}
