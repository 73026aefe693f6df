pub mod source;

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use ulid::Ulid;

pub use source::FileSource;

use crate::ClientError;
use crate::contracts::types::{FileSummary, ValidationError};
use crate::rules::{ValidationConfig, validate};
use crate::tokenize::{self, Grid, SourceFormat};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(String);

impl FileId {
    pub fn generate() -> Self {
        Self(format!("upl_{}", Ulid::new()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Pending,
    Processing,
    Success,
    Error,
}

impl FileStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    pub const fn allows(self, next: FileStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Pending, Self::Error)
                | (Self::Processing, Self::Success)
                | (Self::Processing, Self::Error)
                | (Self::Success, Self::Processing)
                | (Self::Error, Self::Processing)
                | (Self::Error, Self::Success)
        )
    }
}

/// One user-selected file and everything learned about it so far.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub id: FileId,
    pub name: String,
    pub size: u64,
    pub upload_date: DateTime<Utc>,
    pub source: FileSource,
    pub row_count: Option<usize>,
    pub column_count: Option<usize>,
    pub has_headers: Option<bool>,
    pub has_missing_values: Option<bool>,
    pub preview_headers: Option<Vec<String>>,
    pub preview_data: Option<Vec<Vec<String>>>,
    pub preview_edited: bool,
    status: FileStatus,
    validation_errors: Vec<ValidationError>,
    error: Option<String>,
}

impl UploadedFile {
    pub fn new(name: &str, size: u64, source: FileSource) -> Self {
        Self {
            id: FileId::generate(),
            name: name.to_string(),
            size,
            upload_date: Utc::now(),
            source,
            row_count: None,
            column_count: None,
            has_headers: None,
            has_missing_values: None,
            preview_headers: None,
            preview_data: None,
            preview_edited: false,
            status: FileStatus::Pending,
            validation_errors: Vec::new(),
            error: None,
        }
    }

    pub fn status(&self) -> FileStatus {
        self.status
    }

    pub fn validation_errors(&self) -> &[ValidationError] {
        &self.validation_errors
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Clears errors after an in-place correction left the preview clean.
    ///
    /// Returns whether the status changed.
    pub fn promote(&mut self) -> bool {
        self.validation_errors.clear();
        self.error = None;
        if self.status == FileStatus::Error {
            self.transition(FileStatus::Success);
            return true;
        }
        false
    }

    /// Commits the preview's working grid as the payload for submission.
    pub fn save_edits(&mut self, headers: Vec<String>, data: Vec<Vec<String>>) {
        self.preview_headers = Some(headers);
        self.preview_data = Some(data);
        self.preview_edited = true;
    }

    /// The saved, corrected grid (header first), if edits were saved.
    pub fn submission_grid(&self) -> Option<Grid> {
        if !self.preview_edited {
            return None;
        }
        let headers = self.preview_headers.clone()?;
        let mut grid = vec![headers];
        grid.extend(self.preview_data.clone().unwrap_or_default());
        Some(grid)
    }

    pub fn summary(&self) -> FileSummary {
        FileSummary {
            id: self.id.to_string(),
            name: self.name.clone(),
            size: self.size,
            upload_date: self.upload_date.to_rfc3339_opts(SecondsFormat::Secs, true),
            status: self.status.as_str().to_string(),
            error: self.error.clone(),
            row_count: self.row_count,
            column_count: self.column_count,
            has_headers: self.has_headers,
            has_missing_values: self.has_missing_values,
            preview_edited: self.preview_edited,
        }
    }

    fn begin_processing(&mut self) {
        self.transition(FileStatus::Processing);
    }

    fn complete(&mut self, grid: &Grid, errors: Vec<ValidationError>) {
        self.row_count = Some(grid.len().saturating_sub(1));
        self.column_count = Some(grid.first().map(Vec::len).unwrap_or(0));
        self.has_headers = Some(!grid.is_empty());
        self.has_missing_values = Some(false);

        if errors.is_empty() {
            self.error = None;
            self.validation_errors = errors;
            self.transition(FileStatus::Success);
            return;
        }

        self.error = Some(
            errors
                .iter()
                .map(|error| error.description.as_str())
                .collect::<Vec<&str>>()
                .join("; "),
        );
        self.validation_errors = errors;
        self.transition(FileStatus::Error);
    }

    fn fail(&mut self, failure: &ClientError) {
        tracing::warn!(file_id = %self.id, code = %failure.code, "file ingestion failed");
        self.validation_errors = vec![failure.to_validation_error()];
        self.error = Some(failure.message.clone());
        self.transition(FileStatus::Error);
    }

    fn transition(&mut self, next: FileStatus) {
        debug_assert!(
            self.status.allows(next),
            "illegal transition {} -> {}",
            self.status.as_str(),
            next.as_str()
        );
        tracing::debug!(
            file_id = %self.id,
            from = self.status.as_str(),
            to = next.as_str(),
            "file status transition"
        );
        self.status = next;
    }
}

/// Reads, tokenizes, and validates one file, recording the outcome on it.
///
/// Unsupported extensions fail before any read starts. Read and parse
/// failures become a single file-level validation error.
pub async fn ingest(file: &mut UploadedFile, config: &ValidationConfig) -> FileStatus {
    let format = match SourceFormat::from_file_name(&file.name) {
        Ok(format) => format,
        Err(error) => {
            if file.status == FileStatus::Pending {
                file.fail(&error);
            } else {
                file.begin_processing();
                file.fail(&error);
            }
            return file.status;
        }
    };

    file.begin_processing();
    match read_grid(&file.name, format, &file.source).await {
        Ok(grid) => {
            let errors = validate(&grid, config);
            tracing::info!(
                file_id = %file.id,
                rows = grid.len().saturating_sub(1),
                columns = grid.first().map(Vec::len).unwrap_or(0),
                errors = errors.len(),
                "file ingested"
            );
            file.complete(&grid, errors);
        }
        Err(error) => file.fail(&error),
    }
    file.status
}

/// Fresh read and tokenize of a file's original bytes.
pub async fn read_grid(
    file_name: &str,
    format: SourceFormat,
    source: &FileSource,
) -> crate::ClientResult<Grid> {
    let bytes = source.read().await?;
    tokenize::parse_bytes(file_name, format, bytes)
}
