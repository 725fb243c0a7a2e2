use std::fmt;
use std::sync::Arc;

use crate::error::{AnimTexError, AnimTexResult};

/// Identifier of an animated-image resource (a URL or a path-like string).
///
/// The identifier doubles as the cache key and as the format selector: ids
/// ending in `.gif` (ASCII case-insensitive) take the GIF decode path, every
/// other id takes the PNG/APNG path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode path selected for this id. Suffix-based, not content-sniffed.
    pub fn kind(&self) -> ResourceKind {
        let bytes = self.0.as_bytes();
        if bytes.len() >= 4 && bytes[bytes.len() - 4..].eq_ignore_ascii_case(b".gif") {
            ResourceKind::Gif
        } else {
            ResourceKind::Png
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Decode path for a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    /// Patch-based frames with disposal semantics.
    Gif,
    /// Full-canvas frames (APNG) or a single static image (PNG).
    Png,
}

/// Backing surface dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Per-frame instruction for how to treat the frame's drawn region before the
/// next frame is composited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposal {
    /// No disposal specified; the region is left as drawn.
    None,
    /// Keep the region as drawn.
    Keep,
    /// Clear the region to transparent background before the next frame.
    RestoreBackground,
    /// Restore the region to the content it had before this frame.
    RestorePrevious,
}

/// One decoded raster frame. Immutable once produced.
///
/// GIF frames are patches positioned at `(offset_x, offset_y)` within the
/// canvas; PNG/APNG frames cover the full canvas with zero offsets.
#[derive(Clone, Debug)]
pub struct DecodedFrame {
    /// Display-sequence index within the owning [`FrameSet`].
    pub index: usize,
    /// Straight-alpha RGBA8, row-major, tightly packed (`width * height * 4`).
    pub pixels: Arc<Vec<u8>>,
    /// Patch width in pixels.
    pub width: u32,
    /// Patch height in pixels.
    pub height: u32,
    /// Horizontal offset of the patch within the canvas.
    pub offset_x: u32,
    /// Vertical offset of the patch within the canvas.
    pub offset_y: u32,
    /// Display duration in milliseconds.
    pub delay_ms: u32,
    /// Disposal applied to this frame's region before the next composite.
    pub disposal: Disposal,
}

impl DecodedFrame {
    /// Patch rectangle `(x, y, w, h)` within the canvas.
    pub fn rect(&self) -> (u32, u32, u32, u32) {
        (self.offset_x, self.offset_y, self.width, self.height)
    }
}

/// The complete decoded, ordered frame sequence for one resource.
///
/// Immutable; owned by the cache and shared read-only (via `Arc`) by every
/// playback engine bound to the resource.
#[derive(Clone, Debug)]
pub struct FrameSet {
    resource: ResourceId,
    canvas: Canvas,
    frames: Vec<DecodedFrame>,
}

impl FrameSet {
    /// Create a validated frame set.
    ///
    /// `frames` must be non-empty with contiguous indices ordered by display
    /// sequence, and every frame's pixel buffer must match its dimensions.
    pub fn new(
        resource: ResourceId,
        canvas: Canvas,
        frames: Vec<DecodedFrame>,
    ) -> AnimTexResult<Self> {
        if frames.is_empty() {
            return Err(AnimTexError::validation(format!(
                "frame set for '{resource}' is empty"
            )));
        }
        for (i, frame) in frames.iter().enumerate() {
            if frame.index != i {
                return Err(AnimTexError::validation(format!(
                    "frame set for '{resource}' has non-contiguous index {} at position {i}",
                    frame.index
                )));
            }
            let expected = frame.width as usize * frame.height as usize * 4;
            if frame.pixels.len() != expected {
                return Err(AnimTexError::validation(format!(
                    "frame {i} of '{resource}' has {} pixel bytes, expected {expected}",
                    frame.pixels.len()
                )));
            }
        }
        Ok(Self {
            resource,
            canvas,
            frames,
        })
    }

    pub fn resource(&self) -> &ResourceId {
        &self.resource
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn frames(&self) -> &[DecodedFrame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// A single-frame set never needs redrawing after the first composite.
    pub fn is_static(&self) -> bool {
        self.frames.len() == 1
    }
}

/// Playback configuration recognized by [`crate::AnimatedTexture`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlaybackOptions {
    /// Tick period in milliseconds.
    pub interval_ms: u64,
    /// Whether playback wraps past the last frame or freezes there.
    pub looping: bool,
    /// Initial Playing/Paused state after the first composite.
    pub autoplay: bool,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            looping: true,
            autoplay: true,
        }
    }
}
