use std::io;

use serde_json::Value;

use super::format::{self, Column};

pub(super) fn get_str<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str)
}

pub(super) fn get_count(data: &Value, key: &str) -> String {
    data.get(key)
        .and_then(Value::as_u64)
        .map(|value| value.to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub(super) fn file_of(data: &Value) -> io::Result<&Value> {
    data.get("file")
        .filter(|file| file.is_object())
        .ok_or_else(|| io::Error::other("output requires a file summary"))
}

/// Key facts about an uploaded file, in the order a reviewer scans them.
pub(super) fn render_file_summary(template: &str, file: &Value) -> Vec<String> {
    let mut entries = vec![
        ("File:", get_str(file, "name").unwrap_or("unknown").to_string()),
        ("Template:", template.to_string()),
        ("Status:", get_str(file, "status").unwrap_or("unknown").to_string()),
        ("Data rows:", get_count(file, "row_count")),
        ("Columns:", get_count(file, "column_count")),
    ];
    if file.get("preview_edited").and_then(Value::as_bool) == Some(true) {
        entries.push(("Edited:", "yes".to_string()));
    }
    format::key_value_rows(&entries, 2)
}

/// Renders errors keyed by data row and column name.
pub(super) fn render_mapped_errors(errors: &[Value], max_width: usize) -> Vec<String> {
    if errors.is_empty() {
        return vec!["No problems found.".to_string()];
    }

    let columns = [
        Column::right("Row"),
        Column::left("Column"),
        Column::left("Problem"),
        Column::left("Value"),
    ];
    let rows = errors
        .iter()
        .map(|error| {
            vec![
                error
                    .get("data_row")
                    .and_then(Value::as_u64)
                    .map(|row| row.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                get_str(error, "column_name").unwrap_or("-").to_string(),
                get_str(error, "description").unwrap_or("").to_string(),
                get_str(error, "current_value").unwrap_or("").to_string(),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    let mut lines = vec![format!("Problems ({}):", errors.len())];
    lines.extend(format::render_grid(&columns, &rows, max_width, "Problem"));
    lines
}

pub(super) fn array_of<'a>(data: &'a Value, key: &str) -> &'a [Value] {
    data.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
