use std::path::Path;

use serde_json::{Value, json};
use thiserror::Error;

use crate::contracts::types::ValidationError;

pub(crate) const TEMPLATE_HELP_COMMAND: &str = "fxdesk template list";
pub(crate) const TEMPLATE_HELP_SECTION_TITLE: &str = "Upload Templates";

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
    pub data: Option<Value>,
}

impl ClientError {
    pub fn new(code: &str, message: &str, recovery_steps: Vec<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            recovery_steps,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_template_help_data(self, data: Value) -> Self {
        self.with_data(merge_template_help_data(data))
    }

    pub fn invalid_argument_for_command(message: &str, command: Option<&str>) -> Self {
        let help_hint = match command {
            Some(cmd) => format!("Run `fxdesk {cmd} --help` for usage."),
            None => "Run `fxdesk --help` for usage.".to_string(),
        };
        let error = Self::new("invalid_argument", message, vec![help_hint]);
        if let Some(cmd) = command {
            return error.with_data(json!({
                "command_hint": cmd,
            }));
        }
        error
    }

    pub fn invalid_argument_with_recovery(message: &str, recovery_steps: Vec<String>) -> Self {
        Self::new("invalid_argument", message, recovery_steps)
    }

    pub fn unsupported_file_type(file_name: &str) -> Self {
        Self::new(
            "unsupported_file_type",
            &format!("Unsupported file type for `{file_name}`. Upload a .csv, .xlsx, or .xls file."),
            vec![
                "Export the sheet as CSV or Excel and upload it again.".to_string(),
                "Run `fxdesk template sample <template>` for a ready-made layout.".to_string(),
            ],
        )
        .with_template_help_data(json!({
            "file_name": file_name,
            "supported_extensions": ["csv", "xlsx", "xls"],
        }))
    }

    pub fn workbook_unreadable(file_name: &str, detail: &str) -> Self {
        Self::new(
            "workbook_unreadable",
            &format!("Could not open workbook `{file_name}`: {detail}"),
            vec![
                "Check that the file is a valid, unencrypted Excel workbook.".to_string(),
                "Re-save the workbook from Excel or export it as CSV, then upload again."
                    .to_string(),
            ],
        )
    }

    pub fn file_read_failed(location: &Path, detail: &str) -> Self {
        let location = location.display().to_string();
        Self::new(
            "file_read_failed",
            &format!("Could not read `{location}`: {detail}"),
            vec![
                "Verify the path exists and is readable.".to_string(),
                "Select the file again to retry.".to_string(),
            ],
        )
    }

    pub fn output_write_failed(location: &Path, detail: &str) -> Self {
        let location = location.display().to_string();
        Self::new(
            "output_write_failed",
            &format!("Could not write corrected file `{location}`: {detail}"),
            vec!["Choose a writable output path and run the command again.".to_string()],
        )
    }

    pub fn file_not_found(file_id: &str) -> Self {
        Self::new(
            "file_not_found",
            &format!("Uploaded file `{file_id}` is not in the working set."),
            vec!["Select the file again before previewing or editing it.".to_string()],
        )
        .with_data(json!({
            "file_id": file_id,
        }))
    }

    pub fn preview_not_open(file_id: &str) -> Self {
        Self::new(
            "preview_not_open",
            &format!("No preview is loaded for file `{file_id}`."),
            vec!["Open the preview before editing rows.".to_string()],
        )
    }

    pub fn row_out_of_range(row_index: usize, row_count: usize) -> Self {
        Self::new(
            "row_out_of_range",
            &format!("Row index {row_index} is outside the preview ({row_count} data rows)."),
            vec!["Use a 0-based data row index smaller than the row count.".to_string()],
        )
        .with_data(json!({
            "row_index": row_index,
            "row_count": row_count,
        }))
    }

    pub fn column_not_found(column: &str, headers: &[String]) -> Self {
        Self::new(
            "column_not_found",
            &format!("Column `{column}` does not exist in the preview headers."),
            vec!["Use one of the header names shown in the preview.".to_string()],
        )
        .with_data(json!({
            "column": column,
            "headers": headers,
        }))
    }

    pub fn read_in_flight(file_id: &str) -> Self {
        Self::new(
            "read_in_flight",
            &format!("A preview read for file `{file_id}` is already in progress."),
            vec!["Wait for the current read to finish or cancel it.".to_string()],
        )
    }

    pub fn read_cancelled(file_id: &str) -> Self {
        Self::new(
            "read_cancelled",
            &format!("The preview read for file `{file_id}` was cancelled."),
            vec!["Open the preview again to retry.".to_string()],
        )
    }

    pub fn unknown_template(slug: &str) -> Self {
        Self::new(
            "unknown_template",
            &format!("Template `{slug}` is not a known upload template."),
            vec!["Run `fxdesk template list` to see the available templates.".to_string()],
        )
        .with_template_help_data(json!({
            "template": slug,
        }))
    }

    pub fn invalid_template(template: &str, detail: &str) -> Self {
        Self::new(
            "invalid_template",
            &format!("Template `{template}` is misconfigured: {detail}"),
            Vec::new(),
        )
    }

    pub fn internal_serialization(message: &str) -> Self {
        Self::new("internal_serialization_error", message, Vec::new())
    }

    pub fn internal_runtime(message: &str) -> Self {
        Self::new("internal_runtime_error", message, Vec::new())
    }

    /// The single coordinate-less entry a failed read contributes to a file's error list.
    pub fn to_validation_error(&self) -> ValidationError {
        ValidationError::file_level(&self.message)
    }
}

fn merge_template_help_data(mut data: Value) -> Value {
    if !data.is_object() {
        data = json!({});
    }

    if let Some(object) = data.as_object_mut() {
        object.insert(
            "help_command".to_string(),
            Value::String(TEMPLATE_HELP_COMMAND.to_string()),
        );
        object.insert(
            "help_section_title".to_string(),
            Value::String(TEMPLATE_HELP_SECTION_TITLE.to_string()),
        );
    }

    data
}

pub type ClientResult<T> = Result<T, ClientError>;
