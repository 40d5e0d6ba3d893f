//! Animated PNG control chunks.

use pack1::{U16BE, U32BE};

use super::{PngChunk, PngError};
use crate::{parser_helpers::try_pull_pod, Tag};

/// Frame count and loop count, from `acTL`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnimationControl {
  /// Number of frames in the animation.
  pub num_frames: u32,
  /// Times to play the animation, 0 means forever.
  pub num_plays: u32,
}
impl AnimationControl {
  pub(crate) fn from_chunk(chunk: PngChunk<'_>) -> Result<Self, PngError> {
    #[derive(Clone, Copy, bytemuck::Zeroable, bytemuck::Pod)]
    #[repr(C)]
    struct Raw {
      num_frames: U32BE,
      num_plays: U32BE,
    }
    if chunk.tag != Tag::acTL || chunk.data.len() != 8 {
      return Err(PngError::Malformed);
    }
    let (raw, _) = try_pull_pod::<Raw>(chunk.data)?;
    if raw.num_frames.get() == 0 {
      return Err(PngError::Malformed);
    }
    Ok(Self { num_frames: raw.num_frames.get(), num_plays: raw.num_plays.get() })
  }
}

/// What to do with a frame's region before the next frame is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DisposeOp {
  /// Leave it as is.
  #[default]
  None,
  /// Clear it to transparent black.
  Background,
  /// Restore what was there before this frame.
  Previous,
}

/// How a frame's pixels combine with what's already on the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlendOp {
  /// Replace the region, alpha included.
  #[default]
  Source,
  /// Alpha blend over the region.
  Over,
}

/// Per-frame settings, from `fcTL`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub struct FrameControl {
  pub sequence_number: u32,
  pub width: u32,
  pub height: u32,
  pub x_offset: u32,
  pub y_offset: u32,
  pub delay_num: u16,
  pub delay_den: u16,
  pub dispose_op: DisposeOp,
  pub blend_op: BlendOp,
}
impl FrameControl {
  /// Parses an `fcTL` chunk.
  ///
  /// The frame region must lie inside of the `canvas_width` by
  /// `canvas_height` image.
  pub(crate) fn from_chunk(
    chunk: PngChunk<'_>, canvas_width: u32, canvas_height: u32,
  ) -> Result<Self, PngError> {
    #[derive(Clone, Copy, bytemuck::Zeroable, bytemuck::Pod)]
    #[repr(C)]
    struct Raw {
      sequence_number: U32BE,
      width: U32BE,
      height: U32BE,
      x_offset: U32BE,
      y_offset: U32BE,
      delay_num: U16BE,
      delay_den: U16BE,
      dispose_op: u8,
      blend_op: u8,
    }
    if chunk.tag != Tag::fcTL || chunk.data.len() != core::mem::size_of::<Raw>() {
      return Err(PngError::Malformed);
    }
    let (raw, _) = try_pull_pod::<Raw>(chunk.data)?;
    let dispose_op = match raw.dispose_op {
      0 => DisposeOp::None,
      1 => DisposeOp::Background,
      2 => DisposeOp::Previous,
      _ => return Err(PngError::Malformed),
    };
    let blend_op = match raw.blend_op {
      0 => BlendOp::Source,
      1 => BlendOp::Over,
      _ => return Err(PngError::Malformed),
    };
    let out = Self {
      sequence_number: raw.sequence_number.get(),
      width: raw.width.get(),
      height: raw.height.get(),
      x_offset: raw.x_offset.get(),
      y_offset: raw.y_offset.get(),
      delay_num: raw.delay_num.get(),
      delay_den: raw.delay_den.get(),
      dispose_op,
      blend_op,
    };
    let fits_x = out.x_offset.checked_add(out.width).is_some_and(|r| r <= canvas_width);
    let fits_y = out.y_offset.checked_add(out.height).is_some_and(|b| b <= canvas_height);
    if out.width == 0 || out.height == 0 || !fits_x || !fits_y {
      return Err(PngError::Malformed);
    }
    Ok(out)
  }

  /// The frame delay in milliseconds.
  ///
  /// A denominator of 0 means hundredths of a second.
  #[inline]
  #[must_use]
  pub const fn delay_ms(&self) -> u32 {
    let den = if self.delay_den == 0 { 100 } else { self.delay_den as u32 };
    self.delay_num as u32 * 1000 / den
  }
}
