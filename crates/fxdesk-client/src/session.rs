use std::sync::Arc;

use crate::ingest::{self, FileId, FileSource, FileStatus, UploadedFile};
use crate::preview::{
    LargeGridAdvisory, OpenOutcome, PreviewState, PreviewTable, RowPatch, ToggleOutcome,
};
use crate::reads::{ReadTicket, ReadTracker};
use crate::rules::ValidationConfig;
use crate::settings::Settings;
use crate::tokenize::{Grid, SourceFormat};
use crate::{ClientError, ClientResult};

/// Result of an in-place preview edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditOutcome {
    pub error_count: usize,
    /// The owning file moved from `error` to `success` because of this edit.
    pub promoted: bool,
}

/// Cancels in-flight preview reads from outside the session.
#[derive(Debug, Clone)]
pub struct ReadCanceller {
    reads: ReadTracker,
}

impl ReadCanceller {
    pub fn cancel(&self, file_id: &FileId) -> bool {
        self.reads.cancel(file_id)
    }

    pub fn is_in_flight(&self, file_id: &FileId) -> bool {
        self.reads.is_in_flight(file_id)
    }

    /// True once the owning session is gone.
    pub fn is_shut_down(&self) -> bool {
        self.reads.is_shut_down()
    }
}

/// First half of a preview open: either the toggle finished on retained
/// state, or the file still has to be read.
#[derive(Debug)]
pub enum OpenStep {
    Toggled(ToggleOutcome),
    Read(PendingOpen),
}

/// A preview read detached from the session, so other files can be opened,
/// edited, or removed while it is outstanding.
#[derive(Debug)]
pub struct PendingOpen {
    ticket: ReadTicket,
    name: String,
    format: SourceFormat,
    source: FileSource,
}

impl PendingOpen {
    pub fn file_id(&self) -> &FileId {
        self.ticket.file_id()
    }

    /// Resolves with `read_cancelled` if the file's read is cancelled or the
    /// session is dropped first.
    pub async fn read(self) -> ClientResult<Grid> {
        let Self {
            ticket,
            name,
            format,
            source,
        } = self;
        ticket.run(ingest::read_grid(&name, format, &source)).await
    }
}

/// The working set of one upload flow: its files, their previews, and any
/// outstanding reads. Dropping the session cancels every read.
#[derive(Debug)]
pub struct UploadSession {
    config: Arc<ValidationConfig>,
    settings: Settings,
    files: Vec<UploadedFile>,
    previews: PreviewTable,
    reads: ReadTracker,
}

impl UploadSession {
    pub fn new(config: Arc<ValidationConfig>, settings: Settings) -> Self {
        Self {
            config,
            settings,
            files: Vec::new(),
            previews: PreviewTable::new(),
            reads: ReadTracker::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn add_file(&mut self, name: &str, size: u64, source: FileSource) -> FileId {
        let file = UploadedFile::new(name, size, source);
        let id = file.id.clone();
        tracing::debug!(file_id = %id, name, size, "file added");
        self.files.push(file);
        id
    }

    pub fn file(&self, file_id: &FileId) -> Option<&UploadedFile> {
        self.files.iter().find(|file| &file.id == file_id)
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn remove_file(&mut self, file_id: &FileId) -> ClientResult<UploadedFile> {
        let position = self
            .files
            .iter()
            .position(|file| &file.id == file_id)
            .ok_or_else(|| ClientError::file_not_found(file_id.as_str()))?;
        self.reads.cancel(file_id);
        self.previews.remove(file_id);
        Ok(self.files.remove(position))
    }

    pub fn clear(&mut self) {
        self.reads.cancel_all();
        self.previews.clear();
        self.files.clear();
    }

    pub async fn ingest(&mut self, file_id: &FileId) -> ClientResult<FileStatus> {
        let config = Arc::clone(&self.config);
        let file = self.file_mut(file_id)?;
        Ok(ingest::ingest(file, &config).await)
    }

    /// Files are processed one after another, in selection order.
    pub async fn ingest_all(&mut self) -> Vec<(FileId, FileStatus)> {
        let mut outcomes = Vec::with_capacity(self.files.len());
        for file in &mut self.files {
            let status = ingest::ingest(file, &self.config).await;
            outcomes.push((file.id.clone(), status));
        }
        outcomes
    }

    pub fn preview(&self, file_id: &FileId) -> Option<Arc<PreviewState>> {
        self.previews.get(file_id)
    }

    pub fn preview_revision(&self) -> u64 {
        self.previews.revision()
    }

    /// Shows or hides a file's preview.
    ///
    /// Only the first open reads the file; later toggles flip visibility on
    /// the retained working grid. The session stays borrowed while the read is
    /// pending; use `begin_open` and `finish_open` to keep other files usable.
    pub async fn toggle_preview(&mut self, file_id: &FileId) -> ClientResult<ToggleOutcome> {
        match self.begin_open(file_id)? {
            OpenStep::Toggled(outcome) => Ok(outcome),
            OpenStep::Read(pending) => {
                let grid = pending.read().await?;
                Ok(ToggleOutcome::Opened(self.finish_open(file_id, grid)?))
            }
        }
    }

    /// Flips an existing preview, or claims the file's read slot and hands
    /// back the read to run.
    pub fn begin_open(&mut self, file_id: &FileId) -> ClientResult<OpenStep> {
        let (name, source) = {
            let file = self.file_ref(file_id)?;
            (file.name.clone(), file.source.clone())
        };

        if let Some(current) = self.previews.get(file_id) {
            let show = !current.show;
            self.previews.update(file_id, |state| {
                state.show = show;
                Ok(())
            })?;
            if !show {
                return Ok(OpenStep::Toggled(ToggleOutcome::Closed));
            }
            let reshown = self
                .previews
                .get(file_id)
                .ok_or_else(|| ClientError::preview_not_open(file_id.as_str()))?;
            return Ok(OpenStep::Toggled(ToggleOutcome::Reshown(reshown)));
        }

        let format = SourceFormat::from_file_name(&name)?;
        let ticket = self.reads.start(file_id)?;
        Ok(OpenStep::Read(PendingOpen {
            ticket,
            name,
            format,
            source,
        }))
    }

    /// Installs the grid a `PendingOpen` produced as the file's preview.
    ///
    /// Fails with `file_not_found` if the file was removed while it was read.
    pub fn finish_open(&mut self, file_id: &FileId, grid: Grid) -> ClientResult<OpenOutcome> {
        self.file_ref(file_id)?;
        let state = PreviewState::from_grid(grid, Arc::clone(&self.config));
        let advisory = LargeGridAdvisory::check(&state, &self.settings);
        if let Some(notice) = &advisory {
            tracing::info!(
                file_id = %file_id,
                data_rows = notice.data_rows,
                threshold = notice.threshold,
                "large grid preview is virtualized"
            );
        }
        let state = self.previews.insert(file_id.clone(), state);
        Ok(OpenOutcome { state, advisory })
    }

    /// Hides the preview, keeping its working grid.
    pub fn close_preview(&mut self, file_id: &FileId) -> ClientResult<()> {
        self.previews.update(file_id, |state| {
            state.show = false;
            Ok(())
        })
    }

    pub fn remove_row(&mut self, file_id: &FileId, index: usize) -> ClientResult<EditOutcome> {
        self.file_ref(file_id)?;
        let error_count = self
            .previews
            .update(file_id, |state| state.remove_row(index))?;
        Ok(self.settle(file_id, error_count))
    }

    pub fn update_row(
        &mut self,
        file_id: &FileId,
        index: usize,
        patch: &RowPatch,
    ) -> ClientResult<EditOutcome> {
        self.file_ref(file_id)?;
        let error_count = self
            .previews
            .update(file_id, |state| state.update_row(index, patch))?;
        Ok(self.settle(file_id, error_count))
    }

    /// Commits the preview's working grid onto the file record.
    pub fn save_edits(&mut self, file_id: &FileId) -> ClientResult<()> {
        let state = self
            .previews
            .get(file_id)
            .ok_or_else(|| ClientError::preview_not_open(file_id.as_str()))?;
        let file = self.file_mut(file_id)?;
        file.save_edits(state.headers().to_vec(), state.data().to_vec());
        tracing::debug!(file_id = %file_id, rows = state.row_count(), "preview edits saved");
        Ok(())
    }

    pub fn read_canceller(&self) -> ReadCanceller {
        ReadCanceller {
            reads: self.reads.clone(),
        }
    }

    pub fn submission_grid(&self, file_id: &FileId) -> ClientResult<Option<Grid>> {
        Ok(self.file_ref(file_id)?.submission_grid())
    }

    fn settle(&mut self, file_id: &FileId, error_count: usize) -> EditOutcome {
        let promoted = match (error_count, self.file_mut(file_id)) {
            (0, Ok(file)) => file.promote(),
            _ => false,
        };
        if promoted {
            tracing::info!(file_id = %file_id, "file promoted to success after correction");
        }
        EditOutcome {
            error_count,
            promoted,
        }
    }

    fn file_ref(&self, file_id: &FileId) -> ClientResult<&UploadedFile> {
        self.file(file_id)
            .ok_or_else(|| ClientError::file_not_found(file_id.as_str()))
    }

    fn file_mut(&mut self, file_id: &FileId) -> ClientResult<&mut UploadedFile> {
        self.files
            .iter_mut()
            .find(|file| &file.id == file_id)
            .ok_or_else(|| ClientError::file_not_found(file_id.as_str()))
    }
}

impl Drop for UploadSession {
    fn drop(&mut self) {
        let outstanding = self.reads.in_flight_count();
        if outstanding > 0 {
            tracing::warn!(outstanding, "upload session dropped with reads in flight");
        }
        self.reads.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{OpenStep, UploadSession};
    use crate::ingest::{FileId, FileSource, FileStatus};
    use crate::preview::{RowPatch, ToggleOutcome};
    use crate::rules::ValidationConfig;
    use crate::settings::Settings;

    fn session() -> UploadSession {
        UploadSession::new(
            Arc::new(ValidationConfig::new(
                &["vendor_name", "invoice_amount"],
                &["vendor_name", "invoice_amount"],
                &["invoice_amount"],
            )),
            Settings::default(),
        )
    }

    fn add_csv(session: &mut UploadSession, name: &str, body: &str) -> FileId {
        session.add_file(name, body.len() as u64, FileSource::from_bytes(body.as_bytes()))
    }

    #[tokio::test]
    async fn toggling_reads_once_then_flips_visibility() {
        let mut session = session();
        let id = add_csv(&mut session, "a.csv", "vendor_name,invoice_amount\nAcme,1\n");

        let first = session.toggle_preview(&id).await;
        assert!(matches!(first, Ok(ToggleOutcome::Opened(ref outcome)) if outcome.advisory.is_none()));

        let second = session.toggle_preview(&id).await;
        assert!(matches!(second, Ok(ToggleOutcome::Closed)));
        assert_eq!(session.preview(&id).map(|state| state.show), Some(false));

        let third = session.toggle_preview(&id).await;
        assert!(matches!(third, Ok(ToggleOutcome::Reshown(_))));
    }

    #[tokio::test]
    async fn a_clean_edit_promotes_the_file() {
        let mut session = session();
        let id = add_csv(&mut session, "a.csv", "vendor_name,invoice_amount\n,1\n");
        assert_eq!(session.ingest(&id).await.ok(), Some(FileStatus::Error));
        assert!(session.toggle_preview(&id).await.is_ok());

        let outcome = session.update_row(&id, 0, &RowPatch::new().set("vendor_name", "Acme"));
        assert!(outcome.is_ok());
        if let Ok(outcome) = outcome {
            assert_eq!(outcome.error_count, 0);
            assert!(outcome.promoted);
        }

        let file = session.file(&id);
        assert_eq!(file.map(|file| file.status()), Some(FileStatus::Success));
        assert_eq!(file.map(|file| file.validation_errors().len()), Some(0));
    }

    #[tokio::test]
    async fn file_errors_stay_until_the_preview_is_clean() {
        let mut session = session();
        let id = add_csv(&mut session, "a.csv", "vendor_name,invoice_amount\n,1\nAcme,x\n");
        session.ingest(&id).await.ok();
        session.toggle_preview(&id).await.ok();

        let outcome = session.remove_row(&id, 0);
        assert_eq!(outcome.ok().map(|o| (o.error_count, o.promoted)), Some((1, false)));
        assert_eq!(session.file(&id).map(|file| file.validation_errors().len()), Some(2));
    }

    #[tokio::test]
    async fn edits_require_an_open_preview() {
        let mut session = session();
        let id = add_csv(&mut session, "a.csv", "vendor_name,invoice_amount\nAcme,1\n");
        let result = session.remove_row(&id, 0);
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "preview_not_open");
        }

        let unknown = session.remove_row(&FileId::from("upl_missing"), 0);
        assert!(unknown.is_err());
        if let Err(error) = unknown {
            assert_eq!(error.code, "file_not_found");
        }
    }

    #[tokio::test]
    async fn removing_a_file_drops_its_preview() {
        let mut session = session();
        let id = add_csv(&mut session, "a.csv", "vendor_name,invoice_amount\nAcme,1\n");
        session.toggle_preview(&id).await.ok();
        assert!(session.preview(&id).is_some());

        let removed = session.remove_file(&id);
        assert!(removed.is_ok());
        assert!(session.preview(&id).is_none());
        assert!(session.files().is_empty());
    }

    #[tokio::test]
    async fn ingest_all_keeps_selection_order() {
        let mut session = session();
        let good = add_csv(&mut session, "good.csv", "vendor_name,invoice_amount\nAcme,1\n");
        let bad = add_csv(&mut session, "bad.txt", "hello");
        let outcomes = session.ingest_all().await;
        assert_eq!(
            outcomes,
            vec![(good, FileStatus::Success), (bad, FileStatus::Error)]
        );
    }

    #[tokio::test]
    async fn a_stalled_open_leaves_other_files_usable() {
        let mut session = session();
        let slow = add_csv(&mut session, "slow.csv", "vendor_name,invoice_amount\nAcme,1\n");
        let fast = add_csv(&mut session, "fast.csv", "vendor_name,invoice_amount\n,1\n");
        session.ingest(&fast).await.ok();

        let step = session.begin_open(&slow);
        assert!(matches!(step, Ok(OpenStep::Read(_))));
        let Ok(OpenStep::Read(stalled)) = step else {
            return;
        };
        assert_eq!(stalled.file_id(), &slow);

        let canceller = session.read_canceller();
        assert!(canceller.is_in_flight(&slow));
        let again = session.begin_open(&slow);
        assert!(matches!(again, Err(ref error) if error.code == "read_in_flight"));

        let opened = session.toggle_preview(&fast).await;
        assert!(matches!(opened, Ok(ToggleOutcome::Opened(_))));
        let edited = session.update_row(&fast, 0, &RowPatch::new().set("vendor_name", "Globex"));
        assert_eq!(edited.ok().map(|outcome| outcome.promoted), Some(true));

        assert!(canceller.cancel(&slow));
        let result = stalled.read().await;
        assert!(matches!(result, Err(ref error) if error.code == "read_cancelled"));
        assert!(session.preview(&slow).is_none());
        assert!(!canceller.is_in_flight(&slow));
    }

    #[tokio::test]
    async fn concurrent_opens_finish_in_any_order() {
        let mut session = session();
        let first = add_csv(&mut session, "first.csv", "vendor_name,invoice_amount\nAcme,1\n");
        let second = add_csv(&mut session, "second.csv", "vendor_name,invoice_amount\nInitech,2\n");

        let first_step = session.begin_open(&first);
        let second_step = session.begin_open(&second);
        assert!(matches!(first_step, Ok(OpenStep::Read(_))));
        assert!(matches!(second_step, Ok(OpenStep::Read(_))));
        let (Ok(OpenStep::Read(first_read)), Ok(OpenStep::Read(second_read))) =
            (first_step, second_step)
        else {
            return;
        };

        let (first_grid, second_grid) = tokio::join!(first_read.read(), second_read.read());
        assert!(second_grid.is_ok());
        if let Ok(grid) = second_grid {
            assert!(session.finish_open(&second, grid).is_ok());
        }
        assert!(first_grid.is_ok());
        if let Ok(grid) = first_grid {
            assert!(session.finish_open(&first, grid).is_ok());
        }

        assert_eq!(
            session.preview(&second).map(|state| state.data()[0][0].clone()),
            Some("Initech".to_string())
        );
        assert_eq!(session.preview(&first).map(|state| state.row_count()), Some(1));
    }

    #[tokio::test]
    async fn finishing_an_open_for_a_removed_file_fails() {
        let mut session = session();
        let id = add_csv(&mut session, "gone.csv", "vendor_name,invoice_amount\nAcme,1\n");
        let step = session.begin_open(&id);
        assert!(matches!(step, Ok(OpenStep::Read(_))));
        let Ok(OpenStep::Read(pending)) = step else {
            return;
        };
        assert!(session.remove_file(&id).is_ok());

        let read = pending.read().await;
        assert!(matches!(read, Err(ref error) if error.code == "read_cancelled"));
        let finished = session.finish_open(&id, vec![vec!["vendor_name".to_string()]]);
        assert!(matches!(finished, Err(ref error) if error.code == "file_not_found"));
    }
}
