use std::io;

use serde_json::Value;

use super::format::{self, Column};
use super::upload_shared::{array_of, get_count, get_str};

pub fn render_template_list(data: &Value) -> io::Result<String> {
    let templates = data
        .get("templates")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("template list requires templates"))?;

    let columns = [
        Column::left("Template"),
        Column::left("Title"),
        Column::right("Columns"),
    ];
    let rows = templates
        .iter()
        .map(|template| {
            vec![
                get_str(template, "id").unwrap_or("").to_string(),
                get_str(template, "title").unwrap_or("").to_string(),
                get_count(template, "column_count"),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    let mut lines = vec!["Upload Templates:".to_string()];
    lines.extend(format::render_grid(
        &columns,
        &rows,
        format::terminal_width(),
        "Template",
    ));
    lines.push(String::new());
    lines.push("Run `fxdesk template show <id>` for columns and rules.".to_string());
    Ok(lines.join("\n"))
}

pub fn render_template_show(data: &Value) -> io::Result<String> {
    let id = get_str(data, "id").ok_or_else(|| io::Error::other("template show requires id"))?;
    let title = get_str(data, "title").unwrap_or(id);

    let mut lines = vec![format!("Template: {title} ({id})")];
    lines.extend(format::key_value_rows(
        &[
            ("Columns:", joined(data, "columns")),
            ("Required headers:", joined(data, "required_headers")),
            ("Required fields:", joined(data, "required_fields")),
            ("Numeric fields:", joined(data, "numeric_fields")),
        ],
        2,
    ));
    lines.push(String::new());
    lines.push("Dates are day-first (DD/MM/YYYY) unless the second part is above 12.".to_string());
    lines.push(format!("Run `fxdesk template sample {id}` for a starter CSV."));
    Ok(lines.join("\n"))
}

pub fn render_template_sample(data: &Value) -> io::Result<String> {
    let csv = get_str(data, "csv")
        .ok_or_else(|| io::Error::other("template sample requires csv"))?;
    Ok(csv.trim_end_matches(['\r', '\n']).to_string())
}

fn joined(data: &Value, key: &str) -> String {
    let values = array_of(data, key)
        .iter()
        .filter_map(Value::as_str)
        .collect::<Vec<&str>>();
    if values.is_empty() {
        "none".to_string()
    } else {
        values.join(", ")
    }
}
