use std::sync::Arc;
use std::thread;

use crossbeam_channel as channel;
use tracing::{debug, warn};

use crate::core::{FrameSet, ResourceId};
use crate::decode::decode_frame_set;
use crate::error::{AnimTexError, AnimTexResult};

/// One decode request crossing the async boundary. Not retained after
/// dispatch.
pub(crate) struct DecodeJob {
    pub(crate) resource: ResourceId,
    pub(crate) bytes: Vec<u8>,
}

/// Completion message delivered back to the cache.
pub(crate) enum DecodeOutcome {
    Ready {
        resource: ResourceId,
        set: Arc<FrameSet>,
    },
    Failed {
        resource: ResourceId,
        error: String,
    },
}

/// Shared background decode thread.
///
/// All decode work for all resources is serialized through this one thread;
/// jobs run in FIFO arrival order with no priority or preemption. Dropping the
/// worker closes the job channel and joins the thread, cancelling anything
/// still queued.
pub(crate) struct DecodeWorker {
    jobs: Option<channel::Sender<DecodeJob>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl DecodeWorker {
    pub(crate) fn spawn(results: channel::Sender<DecodeOutcome>) -> AnimTexResult<Self> {
        let (jobs_tx, jobs_rx) = channel::unbounded::<DecodeJob>();
        let handle = thread::Builder::new()
            .name("animtex-decode".into())
            .spawn(move || {
                for job in jobs_rx {
                    let outcome = match decode_frame_set(&job.resource, &job.bytes) {
                        Ok(set) => {
                            debug!(resource = %job.resource, frames = set.frame_count(), "decoded");
                            DecodeOutcome::Ready {
                                resource: job.resource,
                                set: Arc::new(set),
                            }
                        }
                        Err(e) => {
                            warn!(resource = %job.resource, error = %e, "decode failed");
                            DecodeOutcome::Failed {
                                resource: job.resource,
                                error: e.to_string(),
                            }
                        }
                    };
                    if results.send(outcome).is_err() {
                        // Receiver gone; the owning service is shutting down.
                        break;
                    }
                }
            })
            .map_err(|e| AnimTexError::Other(anyhow::anyhow!("spawn decode worker: {e}")))?;

        Ok(Self {
            jobs: Some(jobs_tx),
            handle: Some(handle),
        })
    }

    pub(crate) fn submit(&self, job: DecodeJob) -> AnimTexResult<()> {
        let jobs = self
            .jobs
            .as_ref()
            .ok_or_else(|| AnimTexError::decode("decode worker is shut down"))?;
        jobs.send(job)
            .map_err(|_| AnimTexError::decode("decode worker is no longer running"))
    }
}

impl Drop for DecodeWorker {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop.
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
