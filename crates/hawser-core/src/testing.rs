//! Scripted in-memory sessions for lifecycle tests.
//!
//! The fixtures here let the pool, retry and close semantics be exercised
//! without a network: a [`ScriptedFactory`] mints [`ScriptedSession`]s
//! whose `list` outcomes are fed from a queue, and a shared [`Recorder`]
//! observes every create and disconnect so tests can assert on them.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::VfsError;
use crate::session::{
    Capability, DirEntry, FileInfo, FileType, ProviderSession, SessionFactory, WriteMode,
};

/// Everything the fixtures record about session lifecycles.
#[derive(Default)]
pub struct Recorder {
    created: AtomicU64,
    disconnected: Mutex<Vec<u64>>,
    disconnect_calls: AtomicU64,
    stale: Mutex<HashSet<u64>>,
    leaked: Mutex<Vec<u64>>,
    list_outcomes: Mutex<VecDeque<Result<Vec<DirEntry>, VfsError>>>,
    create_failures: Mutex<VecDeque<VfsError>>,
}

impl Recorder {
    /// Fresh recorder with no scripted outcomes.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of sessions the factory has created.
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }

    /// Session ids that transitioned to disconnected, in order. A session
    /// appears at most once no matter how often `disconnect` was called.
    pub fn disconnected(&self) -> Vec<u64> {
        self.disconnected.lock().clone()
    }

    /// Raw number of `disconnect` calls, counting repeats.
    pub fn disconnect_calls(&self) -> u64 {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    /// Session ids that were dropped while still connected — a leak in
    /// the lifecycle logic if nonempty.
    pub fn leaked(&self) -> Vec<u64> {
        self.leaked.lock().clone()
    }

    /// Make `session_id` report itself as no longer connected, as if the
    /// transport dropped while it sat idle.
    pub fn mark_stale(&self, session_id: u64) {
        self.stale.lock().insert(session_id);
    }

    /// Queue the outcome of the next `list` call (shared across all
    /// sessions, consumed in order).
    pub fn push_list_outcome(&self, outcome: Result<Vec<DirEntry>, VfsError>) {
        self.list_outcomes.lock().push_back(outcome);
    }

    /// Queue a failure for the next factory `create` call.
    pub fn push_create_failure(&self, err: VfsError) {
        self.create_failures.lock().push_back(err);
    }

    fn next_list_outcome(&self) -> Result<Vec<DirEntry>, VfsError> {
        self.list_outcomes
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// A fake transient failure for scripting.
pub fn transient_error() -> VfsError {
    VfsError::Io {
        op: "list",
        message: "connection reset by peer".into(),
    }
}

/// In-memory session handed out by [`ScriptedFactory`].
pub struct ScriptedSession {
    id: u64,
    connected: bool,
    recorder: Arc<Recorder>,
}

impl ProviderSession for ScriptedSession {
    fn is_connected(&self) -> bool {
        self.connected && !self.recorder.stale.lock().contains(&self.id)
    }

    fn disconnect(&mut self) {
        self.recorder.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        if !self.connected {
            return;
        }
        self.connected = false;
        self.recorder.disconnected.lock().push(self.id);
    }

    fn list(&mut self, _path: &str) -> Result<Vec<DirEntry>, VfsError> {
        self.recorder.next_list_outcome()
    }

    fn stat(&mut self, _path: &str) -> Result<FileInfo, VfsError> {
        Ok(FileInfo {
            file_type: FileType::File,
            size: Some(0),
            modified: None,
        })
    }

    fn read_to(&mut self, _path: &str, _sink: &mut dyn std::io::Write) -> Result<u64, VfsError> {
        Ok(0)
    }

    fn write_from(
        &mut self,
        _path: &str,
        _source: &mut dyn std::io::Read,
        _mode: WriteMode,
    ) -> Result<u64, VfsError> {
        Ok(0)
    }

    fn mkdir(&mut self, _path: &str) -> Result<(), VfsError> {
        Ok(())
    }

    fn remove_file(&mut self, _path: &str) -> Result<(), VfsError> {
        Ok(())
    }

    fn remove_dir(&mut self, _path: &str) -> Result<(), VfsError> {
        Ok(())
    }

    fn rename(&mut self, _from: &str, _to: &str) -> Result<(), VfsError> {
        Ok(())
    }
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        // A session dropped while still connected means some path skipped
        // disconnect; surface that to tests instead of hiding it.
        if self.connected {
            self.recorder.leaked.lock().push(self.id);
        }
    }
}

/// Factory minting [`ScriptedSession`]s numbered from 1.
pub struct ScriptedFactory {
    recorder: Arc<Recorder>,
}

impl ScriptedFactory {
    /// Factory reporting into `recorder`.
    pub fn new(recorder: Arc<Recorder>) -> Self {
        Self { recorder }
    }
}

impl SessionFactory for ScriptedFactory {
    fn create(&self) -> Result<Box<dyn ProviderSession>, VfsError> {
        if let Some(err) = self.recorder.create_failures.lock().pop_front() {
            return Err(err);
        }
        let id = self.recorder.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Box::new(ScriptedSession {
            id,
            connected: true,
            recorder: Arc::clone(&self.recorder),
        }))
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::Read, Capability::List, Capability::Stat]
    }

    fn scheme(&self) -> &'static str {
        "scripted"
    }
}
