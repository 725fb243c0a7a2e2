use std::sync::Arc;

use crossbeam_channel as channel;
use tracing::debug;

use crate::cache::FrameCache;
use crate::core::{PlaybackOptions, ResourceId};
use crate::decode::worker::{DecodeJob, DecodeWorker};
use crate::error::AnimTexResult;
use crate::fetch::BytesFetcher;
use crate::texture::AnimatedTexture;

/// Explicitly constructed animation-texture pipeline: fetcher + frame cache +
/// decode worker, with one owned lifecycle.
///
/// Consumers receive [`AnimatedTexture`] instances that share the service's
/// cache; detaching a consumer (dropping its texture) never affects cache
/// entries or other consumers. Dropping the service joins the decode worker,
/// cancelling any decodes still queued.
pub struct AnimationTextureService {
    fetcher: Box<dyn BytesFetcher>,
    cache: Arc<FrameCache>,
    worker: DecodeWorker,
}

impl AnimationTextureService {
    pub fn new(fetcher: Box<dyn BytesFetcher>) -> AnimTexResult<Self> {
        let (results_tx, results_rx) = channel::unbounded();
        let worker = DecodeWorker::spawn(results_tx)?;
        Ok(Self {
            fetcher,
            cache: Arc::new(FrameCache::new(results_rx)),
            worker,
        })
    }

    /// Shared frame cache backing every texture this service hands out.
    pub fn cache(&self) -> &Arc<FrameCache> {
        &self.cache
    }

    /// Ensure a load is underway for `resource`.
    ///
    /// No-op when an entry (complete or in flight) already exists. Otherwise
    /// the raw bytes are fetched and a decode dispatched; fetch failures are
    /// returned to the caller and leave no in-flight marker behind, so the
    /// resource can be retried.
    pub fn request_load(&self, resource: &ResourceId) -> AnimTexResult<()> {
        if !self.cache.gate_dispatch(resource) {
            return Ok(());
        }

        let bytes = match self.fetcher.fetch(resource) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.cache.clear_in_flight(resource);
                return Err(e);
            }
        };

        debug!(resource = %resource, len = bytes.len(), "dispatching decode");
        if let Err(e) = self.worker.submit(DecodeJob {
            resource: resource.clone(),
            bytes,
        }) {
            self.cache.clear_in_flight(resource);
            return Err(e);
        }
        Ok(())
    }

    /// Warm the cache for `resource` without attaching a playback instance.
    pub fn preload(&self, resource: &ResourceId) -> AnimTexResult<()> {
        self.request_load(resource)
    }

    /// Create a texture bound to `resource`, issuing the load if needed.
    pub fn attach(
        &self,
        resource: &ResourceId,
        opts: PlaybackOptions,
    ) -> AnimTexResult<AnimatedTexture> {
        self.request_load(resource)?;
        Ok(AnimatedTexture::new(
            resource.clone(),
            Arc::clone(&self.cache),
            opts,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::cache::LoadStatus;
    use crate::fetch::MemoryFetcher;

    fn wait_for<F: Fn() -> bool>(what: &str, pred: F) {
        for _ in 0..500 {
            if pred() {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("timed out waiting for {what}");
    }

    #[test]
    fn fetch_fault_is_returned_and_leaves_no_marker() {
        let service = AnimationTextureService::new(Box::new(MemoryFetcher::new())).unwrap();
        let id = ResourceId::from("missing.gif");

        let err = service.request_load(&id).unwrap_err();
        assert!(err.to_string().contains("fetch error:"));
        assert_eq!(service.cache().status(&id), LoadStatus::Absent);
    }

    #[test]
    fn malformed_bytes_surface_as_failed_load() {
        let mut fetcher = MemoryFetcher::new();
        fetcher.insert("broken.gif", vec![0u8; 16]);
        let service = AnimationTextureService::new(Box::new(fetcher)).unwrap();
        let id = ResourceId::from("broken.gif");

        service.request_load(&id).unwrap();
        wait_for("decode failure", || {
            matches!(service.cache().status(&id), LoadStatus::Failed(_))
        });
        // A failed decode is not a stuck in-flight entry: a retry dispatches.
        service.request_load(&id).unwrap();
        assert_ne!(service.cache().status(&id), LoadStatus::Absent);
    }
}
