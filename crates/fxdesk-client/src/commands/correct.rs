use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::commands::common::{add_path, block_on, load_template};
use crate::contracts::envelope::{CommandName, SuccessEnvelope, success};
use crate::contracts::types::{CorrectData, CorrectSummary};
use crate::ingest::FileId;
use crate::preview::RowPatch;
use crate::session::UploadSession;
use crate::settings::{Settings, SettingsOverrides};
use crate::tokenize::Grid;
use crate::{ClientError, ClientResult};

/// First grid row that holds data; row 1 is the header.
const FIRST_DATA_ROW: usize = 2;

/// One `--set ROW:COLUMN=VALUE` request. `row` uses validation-error numbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellAssignment {
    pub row: usize,
    pub column: String,
    pub value: String,
}

#[derive(Debug, Default)]
pub struct CorrectOptions {
    pub path: String,
    pub template: String,
    pub remove_rows: Vec<usize>,
    pub assignments: Vec<CellAssignment>,
    pub output: Option<PathBuf>,
}

pub fn run(
    path: &str,
    template: &str,
    remove_rows: Vec<usize>,
    assignments: Vec<CellAssignment>,
    output: Option<PathBuf>,
) -> ClientResult<SuccessEnvelope> {
    run_with_options(CorrectOptions {
        path: path.to_string(),
        template: template.to_string(),
        remove_rows,
        assignments,
        output,
    })
}

/// Opens the preview, patches cells, drops rows, then saves the result.
///
/// Patches go first and removals run bottom-up, so every row number refers
/// to the file as uploaded.
pub fn run_with_options(options: CorrectOptions) -> ClientResult<SuccessEnvelope> {
    let patches = group_assignments(&options.assignments)?;
    let removals = removal_indices(&options.remove_rows)?;

    let template = load_template(&options.template)?;
    let settings = Settings::resolve(SettingsOverrides::default())?;
    let mut session = UploadSession::new(template.config.clone(), settings);
    let file_id = add_path(&mut session, &options.path)?;

    block_on(async {
        session.ingest(&file_id).await?;
        session.toggle_preview(&file_id).await
    })??;

    let errors_before = preview_error_count(&session, &file_id)?;

    let mut cells_updated = 0;
    for (index, patch) in &patches {
        session.update_row(&file_id, *index, patch)?;
        cells_updated += patch.len();
    }
    for index in &removals {
        session.remove_row(&file_id, *index)?;
    }

    session.save_edits(&file_id)?;
    let errors_after = preview_error_count(&session, &file_id)?;

    let output_path = match &options.output {
        Some(path) => {
            let grid = session.submission_grid(&file_id)?.unwrap_or_default();
            write_grid(path, &grid)?;
            Some(path.display().to_string())
        }
        None => None,
    };

    let state = session
        .preview(&file_id)
        .ok_or_else(|| ClientError::preview_not_open(file_id.as_str()))?;
    let file = session
        .file(&file_id)
        .ok_or_else(|| ClientError::file_not_found(file_id.as_str()))?;

    success(
        CommandName::Correct,
        CorrectData {
            template: template.id.to_string(),
            file: file.summary(),
            summary: CorrectSummary {
                rows_removed: removals.len(),
                cells_updated,
                errors_before,
                errors_after,
            },
            output_path,
            validation_errors: state
                .mapped_errors()
                .iter()
                .map(|mapped| mapped.to_contract())
                .collect(),
        },
    )
}

fn data_index(row: usize) -> ClientResult<usize> {
    row.checked_sub(FIRST_DATA_ROW).ok_or_else(|| {
        ClientError::invalid_argument_for_command(
            &format!("Row {row} is not a data row. Data rows start at {FIRST_DATA_ROW}; row 1 is the header."),
            Some("correct"),
        )
    })
}

fn group_assignments(assignments: &[CellAssignment]) -> ClientResult<BTreeMap<usize, RowPatch>> {
    let mut patches: BTreeMap<usize, RowPatch> = BTreeMap::new();
    for assignment in assignments {
        let index = data_index(assignment.row)?;
        patches
            .entry(index)
            .or_default()
            .insert(&assignment.column, &assignment.value);
    }
    Ok(patches)
}

/// Distinct data-row indices, largest first.
fn removal_indices(rows: &[usize]) -> ClientResult<Vec<usize>> {
    let mut indices = rows
        .iter()
        .map(|row| data_index(*row))
        .collect::<ClientResult<Vec<usize>>>()?;
    indices.sort_unstable_by(|left, right| right.cmp(left));
    indices.dedup();
    Ok(indices)
}

fn preview_error_count(session: &UploadSession, file_id: &FileId) -> ClientResult<usize> {
    session
        .preview(file_id)
        .map(|state| state.validation_errors().len())
        .ok_or_else(|| ClientError::preview_not_open(file_id.as_str()))
}

fn write_grid(path: &Path, grid: &Grid) -> ClientResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|error| ClientError::output_write_failed(path, &error.to_string()))?;
    for row in grid {
        writer
            .write_record(row)
            .map_err(|error| ClientError::output_write_failed(path, &error.to_string()))?;
    }
    writer
        .flush()
        .map_err(|error| ClientError::output_write_failed(path, &error.to_string()))
}
