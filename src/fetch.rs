use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::ResourceId;
use crate::error::{AnimTexError, AnimTexResult};

/// Source of raw resource bytes.
///
/// All external IO for a texture service goes through this seam; the rest of
/// the pipeline only ever sees byte buffers. Fetch failures are surfaced to
/// the caller of a load request, never swallowed.
pub trait BytesFetcher: Send + Sync {
    fn fetch(&self, resource: &ResourceId) -> AnimTexResult<Vec<u8>>;
}

/// Normalize and validate a root-relative resource path.
///
/// The normalized result uses `/` separators, removes `.` segments, and
/// rejects absolute paths or parent traversals (`..`).
pub(crate) fn normalize_rel_path(source: &str) -> AnimTexResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(AnimTexError::validation("resource paths must be relative"));
    }
    if s.is_empty() {
        return Err(AnimTexError::validation("resource path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(AnimTexError::validation(
                "resource paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(AnimTexError::validation(
            "resource path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

/// Filesystem fetcher resolving resource ids relative to a root directory.
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl BytesFetcher for FsFetcher {
    fn fetch(&self, resource: &ResourceId) -> AnimTexResult<Vec<u8>> {
        let rel = normalize_rel_path(resource.as_str())?;
        let path = self.root.join(&rel);
        std::fs::read(&path)
            .map_err(|e| AnimTexError::fetch(format!("read '{}': {e}", path.display())))
    }
}

/// In-memory fetcher for tests and pre-bundled assets.
///
/// Counts fetches so cache deduplication is observable.
#[derive(Default)]
pub struct MemoryFetcher {
    entries: HashMap<ResourceId, Vec<u8>>,
    fetches: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource: impl Into<ResourceId>, bytes: Vec<u8>) {
        self.entries.insert(resource.into(), bytes);
    }

    /// Number of successful fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl BytesFetcher for MemoryFetcher {
    fn fetch(&self, resource: &ResourceId) -> AnimTexResult<Vec<u8>> {
        let bytes = self
            .entries
            .get(resource)
            .cloned()
            .ok_or_else(|| AnimTexError::fetch(format!("no entry for '{resource}'")))?;
        self.fetches.fetch_add(1, Ordering::Relaxed);
        Ok(bytes)
    }
}
