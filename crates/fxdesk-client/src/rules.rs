use std::collections::HashMap;

use crate::contracts::types::ValidationError;

/// Declarative rule-set for one upload template.
///
/// Header matching is case-insensitive; messages echo the configured casing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationConfig {
    pub required_headers: Vec<String>,
    pub required_fields: Vec<String>,
    pub numeric_fields: Vec<String>,
}

impl ValidationConfig {
    pub fn new(required_headers: &[&str], required_fields: &[&str], numeric_fields: &[&str]) -> Self {
        Self {
            required_headers: to_owned(required_headers),
            required_fields: to_owned(required_fields),
            numeric_fields: to_owned(numeric_fields),
        }
    }
}

/// What one data row contributed to a validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RowFinding {
    /// Cell count differs from the header; field checks were not attempted.
    Malformed(ValidationError),
    Fields(Vec<ValidationError>),
}

impl RowFinding {
    fn into_errors(self) -> Vec<ValidationError> {
        match self {
            Self::Malformed(error) => vec![error],
            Self::Fields(errors) => errors,
        }
    }
}

struct HeaderIndex {
    width: usize,
    by_name: HashMap<String, usize>,
}

impl HeaderIndex {
    fn new(normalized: &[String]) -> Self {
        let mut by_name = HashMap::new();
        for (index, name) in normalized.iter().enumerate() {
            by_name.entry(name.clone()).or_insert(index);
        }
        Self {
            width: normalized.len(),
            by_name,
        }
    }

    fn position(&self, configured: &str) -> Option<usize> {
        self.by_name.get(&normalize_header(configured)).copied()
    }
}

/// Checks a grid (row 0 = headers) against `config`.
///
/// Errors accumulate in order: empty file, missing headers, duplicate headers,
/// then per-row findings. An empty result means the grid is valid.
pub fn validate(grid: &[Vec<String>], config: &ValidationConfig) -> Vec<ValidationError> {
    match grid.split_first() {
        Some((header_row, data_rows)) => validate_with_header(header_row, data_rows, config),
        None => vec![ValidationError::file_level(
            "The file appears to be empty. Add a header row and at least one data row.",
        )],
    }
}

/// Same as [`validate`] for a grid held as a header plus data rows.
///
/// Data row `i` is reported as grid row `i + 2`.
pub fn validate_with_header(
    header_row: &[String],
    data_rows: &[Vec<String>],
    config: &ValidationConfig,
) -> Vec<ValidationError> {
    let normalized = header_row
        .iter()
        .map(|value| normalize_header(value))
        .collect::<Vec<String>>();
    let headers = HeaderIndex::new(&normalized);

    let mut errors = Vec::new();
    errors.extend(missing_header_errors(&headers, config));
    errors.extend(duplicate_header_error(&normalized));

    for (index, row) in data_rows.iter().enumerate() {
        errors.extend(check_row(index + 2, row, &headers, config).into_errors());
    }

    errors
}

/// Strips thousands separators and parses what is left as a finite number.
pub fn parse_numeric(value: &str) -> Option<f64> {
    let stripped = value.replace(',', "");
    let parsed = stripped.trim().parse::<f64>().ok()?;
    parsed.is_finite().then_some(parsed)
}

pub fn normalize_header(value: &str) -> String {
    value.trim().to_lowercase()
}

fn missing_header_errors(headers: &HeaderIndex, config: &ValidationConfig) -> Vec<ValidationError> {
    config
        .required_headers
        .iter()
        .filter(|header| headers.position(header).is_none())
        .map(|header| {
            ValidationError::file_level(&format!("Missing required header: {header}"))
        })
        .collect()
}

fn duplicate_header_error(normalized: &[String]) -> Option<ValidationError> {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut duplicates: Vec<&str> = Vec::new();

    for (index, name) in normalized.iter().enumerate() {
        if name.is_empty() {
            continue;
        }
        let first = *first_seen.entry(name.as_str()).or_insert(index);
        if first != index && !duplicates.contains(&name.as_str()) {
            duplicates.push(name.as_str());
        }
    }

    if duplicates.is_empty() {
        return None;
    }
    Some(ValidationError::file_level(&format!(
        "Duplicate headers found: {}",
        duplicates.join(", ")
    )))
}

fn check_row(
    row_number: usize,
    row: &[String],
    headers: &HeaderIndex,
    config: &ValidationConfig,
) -> RowFinding {
    if row.len() != headers.width {
        return RowFinding::Malformed(ValidationError::at_row(
            &format!(
                "Row {row_number} has {} columns but the header has {}.",
                row.len(),
                headers.width
            ),
            row_number,
        ));
    }

    let value_of = |field: &str| -> (Option<usize>, String) {
        let position = headers.position(field);
        let value = position
            .and_then(|index| row.get(index))
            .map(|cell| cell.trim().to_string())
            .unwrap_or_default();
        (position, value)
    };

    let mut findings = Vec::new();

    for field in &config.required_fields {
        let (position, value) = value_of(field.as_str());
        if value.is_empty() {
            findings.push(ValidationError::at_cell(
                &format!("Missing required field: {field}"),
                row_number,
                position.map(|index| index + 1),
                &value,
            ));
        }
    }

    for field in &config.numeric_fields {
        let (position, value) = value_of(field.as_str());
        if !value.is_empty() && parse_numeric(&value).is_none() {
            findings.push(ValidationError::at_cell(
                &format!("Invalid number in {field}: \"{value}\""),
                row_number,
                position.map(|index| index + 1),
                &value,
            ));
        }
    }

    RowFinding::Fields(findings)
}

fn to_owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
