pub(crate) mod apng;
pub(crate) mod gif;
pub(crate) mod worker;

use crate::core::{FrameSet, ResourceId, ResourceKind};
use crate::error::AnimTexResult;

/// Decode raw bytes into a [`FrameSet`], selecting the format from the
/// resource id's suffix (`.gif` → GIF, anything else → PNG/APNG).
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn decode_frame_set(resource: &ResourceId, bytes: &[u8]) -> AnimTexResult<FrameSet> {
    match resource.kind() {
        ResourceKind::Gif => gif::decode(resource, bytes),
        ResourceKind::Png => apng::decode(resource, bytes),
    }
}
