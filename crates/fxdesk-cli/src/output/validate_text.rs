use std::io;

use serde_json::Value;

use super::format::{self, Column};
use super::upload_shared::{array_of, file_of, get_str, render_file_summary};

pub fn render_validate(data: &Value) -> io::Result<String> {
    let file = file_of(data)?;
    let template = get_str(data, "template").unwrap_or("unknown");
    let errors = array_of(data, "validation_errors");

    let mut lines = vec!["Validation result:".to_string()];
    lines.extend(render_file_summary(template, file));
    if let Some(detail) = get_str(file, "error") {
        lines.extend(format::key_value_rows(&[("Error:", detail.to_string())], 2));
    }
    lines.push(String::new());

    if errors.is_empty() {
        lines.push("No problems found.".to_string());
        return Ok(lines.join("\n"));
    }

    // Positions here count the header as row 1.
    let columns = [
        Column::right("Row"),
        Column::right("Col"),
        Column::left("Problem"),
        Column::left("Value"),
    ];
    let rows = errors
        .iter()
        .map(|error| {
            vec![
                position(error, "row"),
                position(error, "column"),
                get_str(error, "description").unwrap_or("").to_string(),
                get_str(error, "current_value").unwrap_or("").to_string(),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    lines.push(format!("Problems ({}):", errors.len()));
    lines.extend(format::render_grid(
        &columns,
        &rows,
        format::terminal_width(),
        "Problem",
    ));
    lines.push(String::new());
    lines.push(format!(
        "Fix rows with `fxdesk correct <path> --template {template} --set ROW:COLUMN=VALUE`."
    ));
    Ok(lines.join("\n"))
}

fn position(error: &Value, key: &str) -> String {
    error
        .get(key)
        .and_then(Value::as_u64)
        .map(|value| value.to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::render_validate;

    #[test]
    fn lists_problems_with_grid_positions() {
        let data = json!({
            "template": "debtor",
            "file": {"name": "a.csv", "status": "error", "row_count": 2, "column_count": 6},
            "validation_errors": [
                {"description": "Invalid date format", "row": 3, "column": 3, "current_value": "31-02-2025"},
                {"description": "Missing required header: currency"}
            ]
        });

        let rendered = render_validate(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("Status:"));
            assert!(text.contains("Problems (2):"));
            assert!(text.contains("31-02-2025"));
            assert!(text.contains("--template debtor"));
        }
    }

    #[test]
    fn clean_files_say_so() {
        let data = json!({
            "template": "debtor",
            "file": {"name": "a.csv", "status": "success"},
            "validation_errors": []
        });
        let rendered = render_validate(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.ends_with("No problems found."));
        }
    }

    #[test]
    fn missing_file_summary_is_an_error() {
        assert!(render_validate(&json!({"template": "debtor"})).is_err());
    }
}
