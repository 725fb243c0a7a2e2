use std::sync::Arc;

use crate::cache::{FrameCache, LoadStatus};
use crate::core::{DecodedFrame, Disposal, FrameSet, PlaybackOptions, ResourceId, ResourceKind};
use crate::error::{AnimTexError, AnimTexResult};
use crate::surface::PixelSurface;

/// Playback phase of one engine instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// Initial phase, before the first frame is composited.
    Stopped,
    Playing,
    Paused,
}

/// Control command dispatched through [`PlaybackEngine::command`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Reset,
}

/// What a single tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick clock was not due; no tick ran.
    NotDue,
    /// Decode still pending; nothing to draw yet.
    AwaitingDecode,
    /// Engine is paused; the tick was a no-op.
    NotPlaying,
    /// Non-looping playback sits on the last frame; no redraw.
    Frozen,
    /// Single-frame resource already composited; no redraw.
    Static,
    /// The frame at this index was composited and the surface marked dirty.
    Drew(usize),
}

/// Per-instance state machine driving frame advancement and compositing.
///
/// Each engine owns its backing [`PixelSurface`] and its playback state; the
/// frame cache it reads from is shared. Ticks are cheap no-ops until the
/// resource's decode completes.
pub struct PlaybackEngine {
    resource: ResourceId,
    cache: Arc<FrameCache>,
    opts: PlaybackOptions,
    phase: PlaybackPhase,
    current_frame: usize,
    /// Patch rect of the previous GIF frame when its disposal asked for a
    /// restore-to-background before the next draw.
    pending_clear: Option<(u32, u32, u32, u32)>,
    surface: Option<PixelSurface>,
}

impl PlaybackEngine {
    pub fn new(resource: ResourceId, cache: Arc<FrameCache>, opts: PlaybackOptions) -> Self {
        Self {
            resource,
            cache,
            opts,
            phase: PlaybackPhase::Stopped,
            current_frame: 0,
            pending_clear: None,
            surface: None,
        }
    }

    pub fn resource(&self) -> &ResourceId {
        &self.resource
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Backing surface; `None` until the first composite.
    pub fn surface(&self) -> Option<&PixelSurface> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut PixelSurface> {
        self.surface.as_mut()
    }

    /// Single entry point for playback controls.
    ///
    /// Play/pause never touch the frame index; reset zeroes the index without
    /// changing the phase.
    pub fn command(&mut self, cmd: PlaybackCommand) {
        match cmd {
            PlaybackCommand::Play => self.phase = PlaybackPhase::Playing,
            PlaybackCommand::Pause => self.phase = PlaybackPhase::Paused,
            PlaybackCommand::Reset => {
                self.current_frame = 0;
                self.pending_clear = None;
            }
        }
    }

    /// Advance playback by one tick.
    ///
    /// Draws the frame at the current index per the format's compositing
    /// policy, marks the surface dirty, then advances the index modulo the
    /// frame count. See [`TickOutcome`] for the no-op cases.
    pub fn tick(&mut self) -> AnimTexResult<TickOutcome> {
        if self.phase == PlaybackPhase::Paused {
            return Ok(TickOutcome::NotPlaying);
        }

        let Some(set) = self.cache.get(&self.resource) else {
            if let LoadStatus::Failed(e) = self.cache.status(&self.resource) {
                return Err(AnimTexError::decode(e));
            }
            return Ok(TickOutcome::AwaitingDecode);
        };

        if self.surface.is_none() {
            return self.first_composite(&set);
        }

        let count = set.frame_count();
        if !self.opts.looping && self.current_frame == count - 1 {
            return Ok(TickOutcome::Frozen);
        }
        if set.is_static() {
            return Ok(TickOutcome::Static);
        }

        let drawn = self.current_frame;
        self.draw(&set)?;
        self.current_frame = (self.current_frame + 1) % count;
        Ok(TickOutcome::Drew(drawn))
    }

    /// First successful composite: create the surface and draw the current
    /// frame. Autoplay only decides the phase when no control command has
    /// moved the engine out of Stopped yet; a `Play` issued while the decode
    /// was pending is honored as-is.
    fn first_composite(&mut self, set: &FrameSet) -> AnimTexResult<TickOutcome> {
        self.surface = Some(PixelSurface::new(set.canvas())?);
        let drawn = self.current_frame;
        self.draw(set)?;
        self.current_frame = (self.current_frame + 1) % set.frame_count();
        if self.phase == PlaybackPhase::Stopped {
            self.phase = if self.opts.autoplay {
                PlaybackPhase::Playing
            } else {
                PlaybackPhase::Paused
            };
        }
        Ok(TickOutcome::Drew(drawn))
    }

    fn draw(&mut self, set: &FrameSet) -> AnimTexResult<()> {
        let frame = &set.frames()[self.current_frame];
        let surface = self
            .surface
            .as_mut()
            .ok_or_else(|| AnimTexError::surface("composite before surface creation"))?;

        match self.resource.kind() {
            ResourceKind::Png => {
                // Full-frame formats replace the whole backing surface.
                surface.replace(frame)?;
                self.pending_clear = None;
            }
            ResourceKind::Gif => {
                if let Some((x, y, w, h)) = self.pending_clear.take() {
                    surface.clear_rect(x, y, w, h);
                }
                surface.blit_over(frame);
                self.pending_clear = pending_clear_for(frame);
            }
        }
        Ok(())
    }
}

/// RestorePrevious is preserved in metadata but composited like Keep; only a
/// restore-to-background disposal schedules a clear.
fn pending_clear_for(frame: &DecodedFrame) -> Option<(u32, u32, u32, u32)> {
    match frame.disposal {
        Disposal::RestoreBackground => Some(frame.rect()),
        Disposal::None | Disposal::Keep | Disposal::RestorePrevious => None,
    }
}
