//! Bookkeeping for in-flight preview reads.
//!
//! Every read runs under a per-file cancellation token that is a child of
//! the tracker's root token. Cancelling one file's token resolves only that
//! read; shutting the tracker down resolves all of them, including reads
//! registered later.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::ingest::FileId;
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, Default)]
pub struct ReadTracker {
    inner: Arc<Mutex<TrackerState>>,
}

#[derive(Debug, Default)]
struct TrackerState {
    root: CancellationToken,
    next_generation: u64,
    in_flight: HashMap<FileId, InFlightRead>,
}

#[derive(Debug)]
struct InFlightRead {
    generation: u64,
    token: CancellationToken,
}

/// A read admitted for one file. The file's slot is held from `start` until
/// the ticket is dropped, whether or not the read ever ran.
#[derive(Debug)]
pub struct ReadTicket {
    tracker: ReadTracker,
    file_id: FileId,
    generation: u64,
    token: CancellationToken,
}

impl ReadTicket {
    pub fn file_id(&self) -> &FileId {
        &self.file_id
    }

    /// Drives `read` to completion unless the file's read is cancelled first.
    pub async fn run<F, T>(self, read: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        let token = self.token.clone();
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::warn!(file_id = %self.file_id, "preview read cancelled");
                Err(ClientError::read_cancelled(self.file_id.as_str()))
            }
            result = read => result,
        }
    }
}

impl Drop for ReadTicket {
    fn drop(&mut self) {
        let mut state = self.tracker.lock();
        // A cancelled entry may already have been replaced by a newer read.
        let still_ours = state
            .in_flight
            .get(&self.file_id)
            .is_some_and(|current| current.generation == self.generation);
        if still_ours {
            state.in_flight.remove(&self.file_id);
        }
    }
}

impl ReadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers and runs a read in one step.
    pub async fn run<F, T>(&self, file_id: &FileId, read: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        self.start(file_id)?.run(read).await
    }

    /// Claims `file_id`'s read slot.
    ///
    /// A second read for a file whose previous read is still outstanding is
    /// rejected with `read_in_flight` rather than queued.
    pub fn start(&self, file_id: &FileId) -> ClientResult<ReadTicket> {
        let mut state = self.lock();
        if state.in_flight.contains_key(file_id) {
            return Err(ClientError::read_in_flight(file_id.as_str()));
        }
        let token = state.root.child_token();
        let generation = state.next_generation;
        state.next_generation += 1;
        state.in_flight.insert(
            file_id.clone(),
            InFlightRead {
                generation,
                token: token.clone(),
            },
        );
        drop(state);

        Ok(ReadTicket {
            tracker: self.clone(),
            file_id: file_id.clone(),
            generation,
            token,
        })
    }

    /// Returns whether a read was outstanding for `file_id`.
    pub fn cancel(&self, file_id: &FileId) -> bool {
        let entry = self.lock().in_flight.remove(file_id);
        match entry {
            Some(entry) => {
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancels every outstanding read but keeps accepting new ones.
    pub fn cancel_all(&self) -> usize {
        let drained = self
            .lock()
            .in_flight
            .drain()
            .map(|(_, entry)| entry.token)
            .collect::<Vec<CancellationToken>>();
        for token in &drained {
            token.cancel();
        }
        drained.len()
    }

    /// Cancels everything, now and for any read started afterwards.
    pub fn shutdown(&self) {
        let root = self.lock().root.clone();
        root.cancel();
        self.cancel_all();
    }

    pub fn is_in_flight(&self, file_id: &FileId) -> bool {
        self.lock().in_flight.contains_key(file_id)
    }

    pub fn is_shut_down(&self) -> bool {
        self.lock().root.is_cancelled()
    }

    pub fn in_flight_count(&self) -> usize {
        self.lock().in_flight.len()
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
