use serde::Serialize;

/// One finding from a validation pass or a failed read.
///
/// `row` and `column` are 1-based over the logical grid (the header row is row 1).
/// Structural and schema errors leave them empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,
}

impl ValidationError {
    pub fn file_level(description: &str) -> Self {
        Self {
            description: description.to_string(),
            row: None,
            column: None,
            current_value: None,
        }
    }

    pub fn at_row(description: &str, row: usize) -> Self {
        Self {
            description: description.to_string(),
            row: Some(row),
            column: None,
            current_value: None,
        }
    }

    pub fn at_cell(description: &str, row: usize, column: Option<usize>, value: &str) -> Self {
        Self {
            description: description.to_string(),
            row: Some(row),
            column,
            current_value: Some(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub upload_date: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub row_count: Option<usize>,
    pub column_count: Option<usize>,
    pub has_headers: Option<bool>,
    pub has_missing_values: Option<bool>,
    pub preview_edited: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidateData {
    pub template: String,
    pub file: FileSummary,
    pub validation_errors: Vec<ValidationError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MappedErrorRow {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LargeGridNotice {
    pub data_rows: usize,
    pub threshold: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewWindowRow {
    pub index: usize,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewData {
    pub template: String,
    pub file: FileSummary,
    pub headers: Vec<String>,
    pub total_rows: usize,
    pub virtualized: bool,
    pub window_start: usize,
    pub window_end: usize,
    pub rows: Vec<PreviewWindowRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<LargeGridNotice>,
    pub validation_errors: Vec<MappedErrorRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrectSummary {
    pub rows_removed: usize,
    pub cells_updated: usize,
    pub errors_before: usize,
    pub errors_after: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrectData {
    pub template: String,
    pub file: FileSummary,
    pub summary: CorrectSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    pub validation_errors: Vec<MappedErrorRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateListItem {
    pub id: String,
    pub title: String,
    pub column_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateListData {
    pub templates: Vec<TemplateListItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateData {
    pub id: String,
    pub title: String,
    pub columns: Vec<String>,
    pub required_headers: Vec<String>,
    pub required_fields: Vec<String>,
    pub numeric_fields: Vec<String>,
    pub sample_rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateSampleData {
    pub id: String,
    pub file_name: String,
    pub csv: String,
}
