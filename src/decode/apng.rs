use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context;
use image::codecs::png::PngDecoder;
use image::{AnimationDecoder, ImageDecoder};

use crate::core::{Canvas, DecodedFrame, Disposal, FrameSet, ResourceId};
use crate::error::{AnimTexError, AnimTexResult};

/// Decode PNG bytes into a frame set.
///
/// When animation control chunks are present every frame comes back already
/// composited to canvas size, so the playback side treats them as full-frame
/// replacements. A plain PNG yields a single-element sequence.
pub(crate) fn decode(resource: &ResourceId, bytes: &[u8]) -> AnimTexResult<FrameSet> {
    let decoder = PngDecoder::new(Cursor::new(bytes))
        .map_err(|e| AnimTexError::decode(format!("png '{resource}': {e}")))?;
    let (width, height) = decoder.dimensions();
    let canvas = Canvas { width, height };

    let animated = decoder
        .is_apng()
        .map_err(|e| AnimTexError::decode(format!("png '{resource}': {e}")))?;
    if !animated {
        return static_frame_set(resource, canvas, decoder);
    }

    let apng = decoder
        .apng()
        .map_err(|e| AnimTexError::decode(format!("apng '{resource}': {e}")))?;
    let mut frames = Vec::new();
    for frame in apng.into_frames() {
        let frame = frame
            .map_err(|e| AnimTexError::decode(format!("apng '{resource}' frame {}: {e}", frames.len())))?;
        let (num, den) = frame.delay().numer_denom_ms();
        let buffer = frame.into_buffer();
        let (width, height) = buffer.dimensions();
        frames.push(DecodedFrame {
            index: frames.len(),
            pixels: Arc::new(buffer.into_raw()),
            width,
            height,
            offset_x: 0,
            offset_y: 0,
            delay_ms: ratio_ms(num, den),
            disposal: Disposal::None,
        });
    }

    FrameSet::new(resource.clone(), canvas, frames)
}

fn static_frame_set(
    resource: &ResourceId,
    canvas: Canvas,
    decoder: PngDecoder<Cursor<&[u8]>>,
) -> AnimTexResult<FrameSet> {
    let rgba = image::DynamicImage::from_decoder(decoder)
        .context("decode static png")?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    let frame = DecodedFrame {
        index: 0,
        pixels: Arc::new(rgba.into_raw()),
        width,
        height,
        offset_x: 0,
        offset_y: 0,
        delay_ms: 0,
        disposal: Disposal::None,
    };
    FrameSet::new(resource.clone(), canvas, vec![frame])
}

fn ratio_ms(num: u32, den: u32) -> u32 {
    if den == 0 {
        return num;
    }
    (num + den / 2) / den
}
