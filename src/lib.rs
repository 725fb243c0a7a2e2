//! Animtex animates multi-frame raster images (GIF, APNG) as a live texture
//! source for a 3D scene, decoupling slow image decoding from the per-frame
//! redraw a renderer consumes.
//!
//! The pipeline is explicitly staged:
//!
//! 1. A consumer asks an [`AnimationTextureService`] for a resource
//! 2. The shared [`FrameCache`] gates duplicate work; bytes come through a
//!    [`BytesFetcher`] and are decoded on one background worker thread
//! 3. Each [`AnimatedTexture`] owns a [`PlaybackEngine`] that composites the
//!    current frame onto its persistent pixel surface on every due tick
//! 4. The external renderer polls the dirty flag and samples the surface with
//!    the texture's [`SamplerSpec`]
//!
//! Decoding never blocks the consuming side: ticks are no-ops until the frame
//! set lands in the cache.
#![forbid(unsafe_code)]

pub mod cache;
pub mod core;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod playback;
pub mod scheduler;
pub mod service;
pub mod surface;
pub mod texture;

pub use crate::cache::{FrameCache, LoadStatus};
pub use crate::core::{
    Canvas, DecodedFrame, Disposal, FrameSet, PlaybackOptions, ResourceId, ResourceKind,
};
pub use crate::decode::decode_frame_set;
pub use crate::error::{AnimTexError, AnimTexResult};
pub use crate::fetch::{BytesFetcher, FsFetcher, MemoryFetcher};
pub use crate::playback::{PlaybackCommand, PlaybackEngine, PlaybackPhase, TickOutcome};
pub use crate::scheduler::{CancellationToken, TickClock};
pub use crate::service::AnimationTextureService;
pub use crate::surface::PixelSurface;
pub use crate::texture::{AnimatedTexture, SamplerSpec, TextureFilter};
