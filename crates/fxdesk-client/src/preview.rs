use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::sync::Arc;

use crate::contracts::types::{LargeGridNotice, MappedErrorRow, PreviewWindowRow, ValidationError};
use crate::ingest::FileId;
use crate::rules::{ValidationConfig, normalize_header, validate, validate_with_header};
use crate::settings::Settings;
use crate::tokenize::Grid;
use crate::{ClientError, ClientResult};

/// Editable working copy of one file's grid plus its current findings.
///
/// Row indices are 0-based over the data rows; the header is held apart.
#[derive(Debug, Clone)]
pub struct PreviewState {
    pub show: bool,
    headers: Vec<String>,
    data: Vec<Vec<String>>,
    validation_errors: Vec<ValidationError>,
    config: Arc<ValidationConfig>,
}

impl PreviewState {
    pub fn from_grid(grid: Grid, config: Arc<ValidationConfig>) -> Self {
        let mut rows = grid.into_iter();
        let headers = rows.next().unwrap_or_default();
        let mut state = Self {
            show: true,
            headers,
            data: rows.collect(),
            validation_errors: Vec::new(),
            config,
        };
        state.revalidate();
        state
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn data(&self) -> &[Vec<String>] {
        &self.data
    }

    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.data.get(index).map(Vec::as_slice)
    }

    /// The slice of data rows a window asks to materialize.
    pub fn rows(&self, window: &RowWindow) -> &[Vec<String>] {
        let end = window.end.min(self.data.len());
        let start = window.start.min(end);
        &self.data[start..end]
    }

    pub fn window_rows(&self, window: &RowWindow) -> Vec<PreviewWindowRow> {
        self.rows(window)
            .iter()
            .enumerate()
            .map(|(offset, cells)| PreviewWindowRow {
                index: window.start + offset,
                cells: cells.clone(),
            })
            .collect()
    }

    pub fn validation_errors(&self) -> &[ValidationError] {
        &self.validation_errors
    }

    pub fn mapped_errors(&self) -> Vec<MappedValidationError> {
        self.validation_errors
            .iter()
            .map(|error| MappedValidationError::map(error, &self.headers))
            .collect()
    }

    pub fn is_virtualized(&self, settings: &Settings) -> bool {
        self.data.len() > settings.virtualization_threshold
    }

    /// The grid (header first) as it would be submitted.
    pub fn to_grid(&self) -> Grid {
        let mut grid = Vec::with_capacity(self.data.len() + 1);
        if !self.headers.is_empty() || !self.data.is_empty() {
            grid.push(self.headers.clone());
        }
        grid.extend(self.data.iter().cloned());
        grid
    }

    /// Returns the remaining error count.
    pub fn remove_row(&mut self, index: usize) -> ClientResult<usize> {
        self.check_index(index)?;
        self.data.remove(index);
        self.revalidate();
        Ok(self.validation_errors.len())
    }

    /// Returns the remaining error count. Nothing changes if any column is unknown.
    pub fn update_row(&mut self, index: usize, patch: &RowPatch) -> ClientResult<usize> {
        self.check_index(index)?;
        let resolved = patch.resolve(&self.headers)?;

        let row = &mut self.data[index];
        for (position, value) in resolved {
            if row.len() <= position {
                row.resize(position + 1, String::new());
            }
            row[position] = value;
        }

        self.revalidate();
        Ok(self.validation_errors.len())
    }

    pub fn revalidate(&mut self) {
        self.validation_errors = if self.headers.is_empty() && self.data.is_empty() {
            validate(&[], &self.config)
        } else {
            validate_with_header(&self.headers, &self.data, &self.config)
        };
    }

    fn check_index(&self, index: usize) -> ClientResult<()> {
        if index >= self.data.len() {
            return Err(ClientError::row_out_of_range(index, self.data.len()));
        }
        Ok(())
    }
}

/// Sparse column → value update for a single row, keyed by header text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowPatch {
    values: BTreeMap<String, String>,
}

impl RowPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: &str, value: &str) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: &str) {
        self.values.insert(column.to_string(), value.to_string());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Exact header text wins; otherwise the first case-insensitive match.
    fn resolve(&self, headers: &[String]) -> ClientResult<Vec<(usize, String)>> {
        self.values
            .iter()
            .map(|(column, value)| {
                let exact = headers.iter().position(|header| header == column);
                let position = exact.or_else(|| {
                    let wanted = normalize_header(column);
                    headers
                        .iter()
                        .position(|header| normalize_header(header) == wanted)
                });
                position
                    .map(|index| (index, value.clone()))
                    .ok_or_else(|| ClientError::column_not_found(column, headers))
            })
            .collect()
    }
}

/// A finding translated onto the preview's coordinates for inline highlighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedValidationError {
    pub error: ValidationError,
    pub data_row: Option<usize>,
    pub column_name: Option<String>,
}

impl MappedValidationError {
    pub fn map(error: &ValidationError, headers: &[String]) -> Self {
        Self {
            error: error.clone(),
            data_row: error.row.and_then(|row| row.checked_sub(2)),
            column_name: error
                .column
                .and_then(|column| column.checked_sub(1))
                .and_then(|index| headers.get(index))
                .cloned(),
        }
    }

    pub fn to_contract(&self) -> MappedErrorRow {
        MappedErrorRow {
            description: self.error.description.clone(),
            data_row: self.data_row,
            column_name: self.column_name.clone(),
            current_value: self.error.current_value.clone(),
        }
    }
}

/// Half-open range of data-row indices to materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowWindow {
    pub start: usize,
    pub end: usize,
}

impl RowWindow {
    pub fn compute(total_rows: usize, scroll_offset_px: u64, settings: &Settings) -> Self {
        if total_rows <= settings.virtualization_threshold {
            return Self {
                start: 0,
                end: total_rows,
            };
        }

        let row_height = u64::from(settings.row_height_px.max(1));
        let first_visible = usize::try_from(scroll_offset_px / row_height).unwrap_or(usize::MAX);
        let visible = usize::try_from(u64::from(settings.viewport_height_px).div_ceil(row_height))
            .unwrap_or(usize::MAX);

        let start = first_visible
            .saturating_sub(settings.overscan_rows)
            .min(total_rows);
        let end = first_visible
            .saturating_add(visible)
            .saturating_add(settings.overscan_rows)
            .min(total_rows);
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LargeGridAdvisory {
    pub data_rows: usize,
    pub threshold: usize,
}

impl LargeGridAdvisory {
    pub fn check(state: &PreviewState, settings: &Settings) -> Option<Self> {
        state.is_virtualized(settings).then_some(Self {
            data_rows: state.row_count(),
            threshold: settings.virtualization_threshold,
        })
    }

    pub fn message(&self) -> String {
        format!(
            "This file has {} data rows, more than {}. Only the rows in view are rendered; \
             validation and edits still cover every row.",
            self.data_rows, self.threshold
        )
    }

    pub fn to_notice(&self) -> LargeGridNotice {
        LargeGridNotice {
            data_rows: self.data_rows,
            threshold: self.threshold,
            message: self.message(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenOutcome {
    pub state: Arc<PreviewState>,
    pub advisory: Option<LargeGridAdvisory>,
}

#[derive(Debug, Clone)]
pub enum ToggleOutcome {
    /// First open: the file was read and parsed afresh.
    Opened(OpenOutcome),
    /// Re-shown from the retained working grid.
    Reshown(Arc<PreviewState>),
    Closed,
}

/// Per-file preview states, replaced whole on every mutation.
///
/// Snapshots handed out by [`PreviewTable::get`] never observe later edits.
#[derive(Debug, Default)]
pub struct PreviewTable {
    states: HashMap<FileId, Arc<PreviewState>>,
    revision: u64,
}

impl PreviewTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_id: &FileId) -> Option<Arc<PreviewState>> {
        self.states.get(file_id).cloned()
    }

    pub fn contains(&self, file_id: &FileId) -> bool {
        self.states.contains_key(file_id)
    }

    pub fn insert(&mut self, file_id: FileId, state: PreviewState) -> Arc<PreviewState> {
        let state = Arc::new(state);
        self.states.insert(file_id, Arc::clone(&state));
        self.revision += 1;
        state
    }

    /// Applies `edit` to a private copy, then swaps the copy in.
    pub fn update<R, F>(&mut self, file_id: &FileId, edit: F) -> ClientResult<R>
    where
        F: FnOnce(&mut PreviewState) -> ClientResult<R>,
    {
        let current = self
            .states
            .get(file_id)
            .ok_or_else(|| ClientError::preview_not_open(file_id.as_str()))?;
        let mut next = PreviewState::clone(current);
        let outcome = edit(&mut next)?;
        self.states.insert(file_id.clone(), Arc::new(next));
        self.revision += 1;
        Ok(outcome)
    }

    pub fn remove(&mut self, file_id: &FileId) -> Option<Arc<PreviewState>> {
        let removed = self.states.remove(file_id);
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.states.is_empty() {
            self.states.clear();
            self.revision += 1;
        }
    }

    /// Bumped on every change; lets pollers detect updates cheaply.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
