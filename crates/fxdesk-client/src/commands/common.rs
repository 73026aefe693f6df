use std::future::Future;
use std::path::Path;

use crate::ingest::{FileId, FileSource};
use crate::session::UploadSession;
use crate::templates::{Template, TemplateRegistry};
use crate::{ClientError, ClientResult};

/// Drives `future` on a fresh single-threaded runtime.
pub(crate) fn block_on<F: Future>(future: F) -> ClientResult<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| ClientError::internal_runtime(&error.to_string()))?;
    Ok(runtime.block_on(future))
}

pub(crate) fn load_template(slug: &str) -> ClientResult<Template> {
    let registry = TemplateRegistry::builtin()?;
    registry.resolve(slug).cloned()
}

/// Adds the file at `path` to the session the way a file picker would.
pub(crate) fn add_path(session: &mut UploadSession, path: &str) -> ClientResult<FileId> {
    let location = Path::new(path);
    let metadata = std::fs::metadata(location)
        .map_err(|error| ClientError::file_read_failed(location, &error.to_string()))?;
    if metadata.is_dir() {
        return Err(ClientError::file_read_failed(location, "path is a directory"));
    }
    let name = location
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());

    Ok(session.add_file(&name, metadata.len(), FileSource::Path(location.to_path_buf())))
}
