use std::io::Cursor;
use std::sync::Arc;

use crate::core::{Canvas, DecodedFrame, Disposal, FrameSet, ResourceId};
use crate::error::{AnimTexError, AnimTexResult};

/// GIF delay units are hundredths of a second.
const DELAY_UNIT_MS: u32 = 10;

/// Parse a GIF container into raw RGBA patch frames.
///
/// The logical screen descriptor provides the canvas; each image block keeps
/// its own display rectangle, delay and disposal method so the compositor can
/// apply patch updates. LZW decompression and palette expansion (local table
/// falling back to the global one) are handled by the `gif` decoder.
pub(crate) fn decode(resource: &ResourceId, bytes: &[u8]) -> AnimTexResult<FrameSet> {
    let mut opts = gif::DecodeOptions::new();
    opts.set_color_output(gif::ColorOutput::RGBA);

    let mut reader = opts
        .read_info(Cursor::new(bytes))
        .map_err(|e| AnimTexError::decode(format!("gif '{resource}': {e}")))?;
    let canvas = Canvas {
        width: u32::from(reader.width()),
        height: u32::from(reader.height()),
    };

    let mut frames = Vec::new();
    while let Some(frame) = reader
        .read_next_frame()
        .map_err(|e| AnimTexError::decode(format!("gif '{resource}' frame {}: {e}", frames.len())))?
    {
        frames.push(DecodedFrame {
            index: frames.len(),
            pixels: Arc::new(frame.buffer.to_vec()),
            width: u32::from(frame.width),
            height: u32::from(frame.height),
            offset_x: u32::from(frame.left),
            offset_y: u32::from(frame.top),
            delay_ms: u32::from(frame.delay) * DELAY_UNIT_MS,
            disposal: map_disposal(frame.dispose),
        });
    }

    FrameSet::new(resource.clone(), canvas, frames)
}

fn map_disposal(dispose: gif::DisposalMethod) -> Disposal {
    match dispose {
        gif::DisposalMethod::Any => Disposal::None,
        gif::DisposalMethod::Keep => Disposal::Keep,
        gif::DisposalMethod::Background => Disposal::RestoreBackground,
        gif::DisposalMethod::Previous => Disposal::RestorePrevious,
    }
}
