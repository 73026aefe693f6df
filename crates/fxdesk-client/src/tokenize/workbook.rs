use std::io::Cursor;

use calamine::{Data, Reader, Xls, Xlsx};

use crate::dates::{from_serial, normalize_cell};
use crate::tokenize::{Grid, SourceFormat, TokenizeError};

/// Reads the first sheet of a workbook into a grid of text cells.
///
/// Fully blank rows are dropped before indexing. The first kept row is the
/// header and is only trimmed; later rows also get date normalization, with
/// date-typed cells converted from their serial value.
pub fn parse(format: SourceFormat, bytes: Vec<u8>) -> Result<Grid, TokenizeError> {
    let cursor = Cursor::new(bytes);
    match format {
        SourceFormat::Xls => {
            let workbook = Xls::new(cursor).map_err(calamine::Error::from)?;
            first_sheet_grid(workbook)
        }
        _ => {
            let workbook = Xlsx::new(cursor).map_err(calamine::Error::from)?;
            first_sheet_grid(workbook)
        }
    }
}

fn first_sheet_grid<R>(mut workbook: R) -> Result<Grid, TokenizeError>
where
    R: Reader<Cursor<Vec<u8>>>,
    calamine::Error: From<R::Error>,
{
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(TokenizeError::NoSheets)?
        .map_err(calamine::Error::from)?;

    let mut grid = Grid::new();
    for row in range.rows() {
        if row.iter().all(is_blank) {
            continue;
        }
        let cells = if grid.is_empty() {
            row.iter()
                .map(|cell| cell_text(cell).trim().to_string())
                .collect()
        } else {
            row.iter().map(data_cell).collect()
        };
        grid.push(cells);
    }

    Ok(grid)
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(value) => value.trim().is_empty(),
        _ => false,
    }
}

fn data_cell(cell: &Data) -> String {
    match cell {
        Data::DateTime(value) => {
            from_serial(value.as_f64()).unwrap_or_else(|| cell_text(cell).trim().to_string())
        }
        _ => normalize_cell(cell_text(cell).trim()),
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) | Data::DateTimeIso(value) | Data::DurationIso(value) => {
            value.clone()
        }
        Data::Float(value) => format_float(*value),
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => {
            if *value {
                "TRUE".to_string()
            } else {
                "FALSE".to_string()
            }
        }
        Data::DateTime(value) => format_float(value.as_f64()),
        Data::Error(value) => value.to_string(),
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    value.to_string()
}
