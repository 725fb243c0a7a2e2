use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crossbeam_channel as channel;
use tracing::debug;

use crate::core::{FrameSet, ResourceId};
use crate::decode::worker::DecodeOutcome;

enum LoadState {
    InFlight,
    Ready(Arc<FrameSet>),
    Failed(Arc<str>),
}

/// Externally observable load state for a resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    /// No load has been requested (or a fetch failed before dispatch).
    Absent,
    /// A decode is in flight.
    Loading,
    /// The frame set is available.
    Ready,
    /// The decode faulted; the resource may be requested again.
    Failed(String),
}

/// Memoizes decode results and gates duplicate work.
///
/// One cache is shared by every playback engine a service hands out. Ready
/// entries are never evicted or replaced for the cache's lifetime; failed
/// entries may be retried. Completion messages from the decode worker are
/// drained on every read, so the map is only ever written from the consuming
/// side.
pub struct FrameCache {
    entries: Mutex<HashMap<ResourceId, LoadState>>,
    results: Mutex<channel::Receiver<DecodeOutcome>>,
}

impl FrameCache {
    pub(crate) fn new(results: channel::Receiver<DecodeOutcome>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            results: Mutex::new(results),
        }
    }

    /// Returns the frame set if its decode has completed.
    pub fn get(&self, resource: &ResourceId) -> Option<Arc<FrameSet>> {
        self.drain_completions();
        let entries = self.entries.lock().expect("frame cache poisoned");
        match entries.get(resource) {
            Some(LoadState::Ready(set)) => Some(Arc::clone(set)),
            _ => None,
        }
    }

    pub fn status(&self, resource: &ResourceId) -> LoadStatus {
        self.drain_completions();
        let entries = self.entries.lock().expect("frame cache poisoned");
        match entries.get(resource) {
            None => LoadStatus::Absent,
            Some(LoadState::InFlight) => LoadStatus::Loading,
            Some(LoadState::Ready(_)) => LoadStatus::Ready,
            Some(LoadState::Failed(e)) => LoadStatus::Failed(e.to_string()),
        }
    }

    /// Register `resource` as in flight unless an entry already covers it.
    ///
    /// Returns `true` when the caller should dispatch a decode; for N
    /// concurrent requests on one resource exactly one caller sees `true`.
    /// Failed entries are cleared so the load can be retried.
    pub(crate) fn gate_dispatch(&self, resource: &ResourceId) -> bool {
        self.drain_completions();
        let mut entries = self.entries.lock().expect("frame cache poisoned");
        match entries.get(resource) {
            Some(LoadState::InFlight) | Some(LoadState::Ready(_)) => false,
            Some(LoadState::Failed(_)) | None => {
                entries.insert(resource.clone(), LoadState::InFlight);
                true
            }
        }
    }

    /// Drop an in-flight marker after a failed fetch or dispatch, so the
    /// resource can be requested again.
    pub(crate) fn clear_in_flight(&self, resource: &ResourceId) {
        let mut entries = self.entries.lock().expect("frame cache poisoned");
        if let Some(LoadState::InFlight) = entries.get(resource) {
            entries.remove(resource);
        }
    }

    /// Apply pending worker completions to the map.
    fn drain_completions(&self) {
        let results = self.results.lock().expect("frame cache poisoned");
        let mut entries = self.entries.lock().expect("frame cache poisoned");
        while let Ok(outcome) = results.try_recv() {
            match outcome {
                DecodeOutcome::Ready { resource, set } => {
                    debug!(resource = %resource, "frame set ready");
                    entries.insert(resource, LoadState::Ready(set));
                }
                DecodeOutcome::Failed { resource, error } => {
                    entries.insert(resource, LoadState::Failed(error.into()));
                }
            }
        }
    }
}
