use crate::core::{Canvas, DecodedFrame};
use crate::error::{AnimTexError, AnimTexResult};

/// Surfaces above this edge length are rejected; matches common GPU texture
/// dimension limits.
pub const MAX_SURFACE_DIM: u32 = 16_384;

/// Persistent straight-alpha RGBA8 pixel surface with a dirty flag.
///
/// Created once per playback instance at the frame set's canvas size; the
/// dimensions never change afterwards. The dirty flag is set by every
/// composite and cleared by the consuming renderer via [`PixelSurface::take_dirty`].
pub struct PixelSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    dirty: bool,
}

impl PixelSurface {
    /// Allocate a transparent surface for `canvas`.
    pub fn new(canvas: Canvas) -> AnimTexResult<Self> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(AnimTexError::surface(format!(
                "surface dimensions must be non-zero, got {}x{}",
                canvas.width, canvas.height
            )));
        }
        if canvas.width > MAX_SURFACE_DIM || canvas.height > MAX_SURFACE_DIM {
            return Err(AnimTexError::surface(format!(
                "surface dimensions {}x{} exceed the {MAX_SURFACE_DIM} limit",
                canvas.width, canvas.height
            )));
        }
        Ok(Self {
            width: canvas.width,
            height: canvas.height,
            pixels: vec![0u8; canvas.width as usize * canvas.height as usize * 4],
            dirty: false,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major straight-alpha RGBA8 bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA of a single pixel, or `None` when the coordinates fall outside
    /// the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let off = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.pixels[off],
            self.pixels[off + 1],
            self.pixels[off + 2],
            self.pixels[off + 3],
        ])
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read and clear the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Replace the entire surface content with a full-canvas frame buffer.
    pub fn replace(&mut self, frame: &DecodedFrame) -> AnimTexResult<()> {
        if frame.pixels.len() != self.pixels.len() {
            return Err(AnimTexError::validation(format!(
                "replace expects a full-surface buffer of {} bytes, got {}",
                self.pixels.len(),
                frame.pixels.len()
            )));
        }
        self.pixels.copy_from_slice(&frame.pixels);
        self.dirty = true;
        Ok(())
    }

    /// Clear a rectangle to transparent. Out-of-bounds regions are clamped.
    pub fn clear_rect(&mut self, x: u32, y: u32, w: u32, h: u32) {
        let x_end = x.saturating_add(w).min(self.width);
        let y_end = y.saturating_add(h).min(self.height);
        if x >= x_end || y >= y_end {
            return;
        }
        for row in y..y_end {
            let start = (row as usize * self.width as usize + x as usize) * 4;
            let end = (row as usize * self.width as usize + x_end as usize) * 4;
            self.pixels[start..end].fill(0);
        }
        self.dirty = true;
    }

    /// Source-over blit of a patch frame into its offset rectangle.
    ///
    /// Transparent patch pixels leave existing surface content, which is what
    /// lets inter-frame transparency accumulate for GIF. Patch regions outside
    /// the surface are clipped.
    pub fn blit_over(&mut self, frame: &DecodedFrame) {
        let x_end = frame.offset_x.saturating_add(frame.width).min(self.width);
        let y_end = frame.offset_y.saturating_add(frame.height).min(self.height);
        if frame.offset_x >= x_end || frame.offset_y >= y_end {
            return;
        }
        let cols = (x_end - frame.offset_x) as usize;
        for row in frame.offset_y..y_end {
            let src_row = (row - frame.offset_y) as usize * frame.width as usize * 4;
            let dst_row = (row as usize * self.width as usize + frame.offset_x as usize) * 4;
            let src = &frame.pixels[src_row..src_row + cols * 4];
            let dst = &mut self.pixels[dst_row..dst_row + cols * 4];
            for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                let out = over_straight([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
                d.copy_from_slice(&out);
            }
        }
        self.dirty = true;
    }
}

/// Source-over for straight-alpha RGBA8.
fn over_straight(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = u32::from(src[3]);
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }

    let da = u32::from(dst[3]);
    let inv = 255 - sa;
    let out_a = sa + (da * inv + 127) / 255;
    if out_a == 0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    out[3] = out_a as u8;
    let den = out_a * 255;
    for i in 0..3 {
        let num = u32::from(src[i]) * sa * 255 + u32::from(dst[i]) * da * inv;
        out[i] = ((num + den / 2) / den) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::Disposal;

    fn canvas(w: u32, h: u32) -> Canvas {
        Canvas {
            width: w,
            height: h,
        }
    }

    fn patch(x: u32, y: u32, w: u32, h: u32, rgba: [u8; 4]) -> DecodedFrame {
        let mut pixels = Vec::with_capacity((w * h * 4) as usize);
        for _ in 0..w * h {
            pixels.extend_from_slice(&rgba);
        }
        DecodedFrame {
            index: 0,
            pixels: Arc::new(pixels),
            width: w,
            height: h,
            offset_x: x,
            offset_y: y,
            delay_ms: 100,
            disposal: Disposal::None,
        }
    }

    #[test]
    fn rejects_zero_and_oversized_dimensions() {
        assert!(PixelSurface::new(canvas(0, 4)).is_err());
        assert!(PixelSurface::new(canvas(4, MAX_SURFACE_DIM + 1)).is_err());
    }

    #[test]
    fn replace_requires_full_surface_buffer() {
        let mut s = PixelSurface::new(canvas(2, 2)).unwrap();
        assert!(s.replace(&patch(0, 0, 1, 1, [1, 2, 3, 255])).is_err());
        assert!(s.replace(&patch(0, 0, 2, 2, [1, 2, 3, 255])).is_ok());
        assert_eq!(s.pixel(1, 1), Some([1, 2, 3, 255]));
    }

    #[test]
    fn blit_opaque_replaces_and_transparent_preserves() {
        let mut s = PixelSurface::new(canvas(2, 1)).unwrap();
        s.replace(&patch(0, 0, 2, 1, [10, 20, 30, 255])).unwrap();

        s.blit_over(&patch(0, 0, 1, 1, [200, 0, 0, 255]));
        assert_eq!(s.pixel(0, 0), Some([200, 0, 0, 255]));

        s.blit_over(&patch(1, 0, 1, 1, [99, 99, 99, 0]));
        assert_eq!(s.pixel(1, 0), Some([10, 20, 30, 255]));
    }

    #[test]
    fn blit_clips_out_of_bounds_patch() {
        let mut s = PixelSurface::new(canvas(2, 2)).unwrap();
        s.blit_over(&patch(1, 1, 2, 2, [5, 5, 5, 255]));
        assert_eq!(s.pixel(1, 1), Some([5, 5, 5, 255]));
        assert_eq!(s.pixel(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn clear_rect_clamps_and_clears() {
        let mut s = PixelSurface::new(canvas(2, 2)).unwrap();
        s.replace(&patch(0, 0, 2, 2, [9, 9, 9, 255])).unwrap();
        s.clear_rect(1, 1, 10, 10);
        assert_eq!(s.pixel(0, 0), Some([9, 9, 9, 255]));
        assert_eq!(s.pixel(1, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn pixel_out_of_bounds_is_none() {
        let s = PixelSurface::new(canvas(2, 2)).unwrap();
        assert_eq!(s.pixel(1, 1), Some([0, 0, 0, 0]));
        assert_eq!(s.pixel(2, 0), None);
        assert_eq!(s.pixel(0, 2), None);
    }

    #[test]
    fn take_dirty_resets_flag() {
        let mut s = PixelSurface::new(canvas(1, 1)).unwrap();
        assert!(!s.is_dirty());
        s.clear_rect(0, 0, 1, 1);
        assert!(s.take_dirty());
        assert!(!s.is_dirty());
    }

    #[test]
    fn over_blends_partial_alpha() {
        // 50%-ish red over opaque blue keeps full alpha and mixes channels.
        let out = over_straight([0, 0, 200, 255], [200, 0, 0, 128]);
        assert_eq!(out[3], 255);
        assert!(out[0] > 90 && out[0] < 110);
        assert!(out[2] > 90 && out[2] < 110);
    }
}
