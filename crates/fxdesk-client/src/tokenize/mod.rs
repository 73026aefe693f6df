pub mod csv_text;
pub mod workbook;

use std::path::Path;

use thiserror::Error;

use crate::{ClientError, ClientResult};

/// Parsed tabular content; row 0 is conventionally the header row.
pub type Grid = Vec<Vec<String>>;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
    Xls,
}

impl SourceFormat {
    pub fn from_file_name(file_name: &str) -> ClientResult<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|value| value.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("xlsx") => Ok(Self::Xlsx),
            Some("xls") => Ok(Self::Xls),
            _ => Err(ClientError::unsupported_file_type(file_name)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenizeError {
    #[error("{0}")]
    Workbook(#[from] calamine::Error),
    #[error("workbook contains no sheets")]
    NoSheets,
}

/// Runs the tokenizer matching `format` over raw file bytes.
///
/// CSV is decoded lossily and never fails; workbooks that cannot be opened
/// surface as `workbook_unreadable`.
pub fn parse_bytes(file_name: &str, format: SourceFormat, bytes: Vec<u8>) -> ClientResult<Grid> {
    match format {
        SourceFormat::Csv => {
            let text = String::from_utf8_lossy(&bytes);
            Ok(csv_text::parse(&text))
        }
        SourceFormat::Xlsx | SourceFormat::Xls => workbook::parse(format, bytes)
            .map_err(|error| ClientError::workbook_unreadable(file_name, &error.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::{SourceFormat, parse_bytes};

    #[test]
    fn extension_selects_tokenizer_case_insensitively() {
        assert_eq!(SourceFormat::from_file_name("a.csv").ok(), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::from_file_name("A.XLSX").ok(), Some(SourceFormat::Xlsx));
        assert_eq!(SourceFormat::from_file_name("legacy.xls").ok(), Some(SourceFormat::Xls));
    }

    #[test]
    fn unknown_extensions_are_rejected() {
        for name in ["notes.txt", "payables", "book.xlsm.pdf"] {
            let result = SourceFormat::from_file_name(name);
            assert!(result.is_err());
            if let Err(error) = result {
                assert_eq!(error.code, "unsupported_file_type");
            }
        }
    }

    #[test]
    fn corrupt_workbooks_map_to_workbook_unreadable() {
        let result = parse_bytes("broken.xlsx", SourceFormat::Xlsx, b"not a zip".to_vec());
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "workbook_unreadable");
            assert!(error.message.contains("broken.xlsx"));
        }
    }

    #[test]
    fn csv_bytes_decode_lossily() {
        let result = parse_bytes("a.csv", SourceFormat::Csv, b"name\n\xffAcme\n".to_vec());
        assert!(result.is_ok());
        if let Ok(grid) = result {
            assert_eq!(grid.len(), 2);
            assert!(grid[1][0].ends_with("Acme"));
        }
    }
}
