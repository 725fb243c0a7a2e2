use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::FrameCache;
use crate::core::{PlaybackOptions, ResourceId};
use crate::error::AnimTexResult;
use crate::playback::{PlaybackCommand, PlaybackEngine, PlaybackPhase, TickOutcome};
use crate::scheduler::{CancellationToken, TickClock};
use crate::surface::PixelSurface;

/// Texture filtering mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TextureFilter {
    Linear,
    Nearest,
}

/// Sampler settings the consuming renderer should bind the surface with.
///
/// Defaults suit a frequently-mutated dynamic image: linear min/mag filtering
/// and no mip generation (regenerating mips every tick would be wasted work on
/// a surface that changes every frame). Alpha is premultiplied at upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SamplerSpec {
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub generate_mipmaps: bool,
    pub premultiply_alpha: bool,
}

impl Default for SamplerSpec {
    fn default() -> Self {
        Self {
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
            generate_mipmaps: false,
            premultiply_alpha: true,
        }
    }
}

/// Renderer-facing animated texture: playback engine + tick clock + sampler.
///
/// The consuming renderer drives [`AnimatedTexture::update`] from its own draw
/// cycle, samples [`AnimatedTexture::pixels`] whenever
/// [`AnimatedTexture::take_dirty`] reports a change, and binds the image with
/// the [`SamplerSpec`]. Dropping the texture cancels only its own clock; the
/// shared cache and worker are unaffected.
pub struct AnimatedTexture {
    engine: PlaybackEngine,
    clock: TickClock,
    sampler: SamplerSpec,
}

impl AnimatedTexture {
    pub(crate) fn new(
        resource: ResourceId,
        cache: Arc<FrameCache>,
        opts: PlaybackOptions,
    ) -> Self {
        let clock = TickClock::new(Duration::from_millis(opts.interval_ms));
        Self {
            engine: PlaybackEngine::new(resource, cache, opts),
            clock,
            sampler: SamplerSpec::default(),
        }
    }

    pub fn sampler(&self) -> SamplerSpec {
        self.sampler
    }

    /// Handle that permanently suspends this texture's tick clock.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.clock.cancel_handle()
    }

    /// Run at most one playback tick when the clock is due at `now`.
    pub fn update(&mut self, now: Instant) -> AnimTexResult<TickOutcome> {
        if !self.clock.poll(now) {
            return Ok(TickOutcome::NotDue);
        }
        self.engine.tick()
    }

    /// Start or resume playback. Never resets the frame index.
    pub fn play(&mut self) {
        self.engine.command(PlaybackCommand::Play);
    }

    /// Pause playback, retaining the frame index.
    pub fn pause(&mut self) {
        self.engine.command(PlaybackCommand::Pause);
    }

    /// Rewind to frame 0 without altering the play/pause state.
    pub fn reset(&mut self) {
        self.engine.command(PlaybackCommand::Reset);
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.engine.phase()
    }

    pub fn current_frame(&self) -> usize {
        self.engine.current_frame()
    }

    /// Backing surface, once the first composite has happened.
    pub fn surface(&self) -> Option<&PixelSurface> {
        self.engine.surface()
    }

    /// Backing pixel bytes (straight-alpha RGBA8), once available.
    pub fn pixels(&self) -> Option<&[u8]> {
        self.engine.surface().map(PixelSurface::pixels)
    }

    /// Read and clear the needs-redraw signal.
    pub fn take_dirty(&mut self) -> bool {
        self.engine
            .surface_mut()
            .map(PixelSurface::take_dirty)
            .unwrap_or(false)
    }
}

impl Drop for AnimatedTexture {
    fn drop(&mut self) {
        self.clock.cancel_handle().cancel();
    }
}
