//! Draw command sequences (`PDCS`), the animated form of an image.
//!
//! After the file header:
//!
//! ```text
//! version:     u8
//! reserved:    u8
//! size:        (i16, i16)
//! play_count:  u16         PLAY_COUNT_INFINITE repeats forever
//! num_frames:  u16
//! frames:      back to back, running to the end of the data
//! ```

use alloc::vec::Vec;

use log::{trace, warn};

use super::{
  draw::GContext,
  frame::{frame_size, FrameMut, FrameView},
  load_pdc_resource, pull_version_and_size, write_size, PdcBytes,
};
use crate::{
  parser_helpers::{try_pull_byte_array, u16_le},
  AppNum, DecodeError, GPoint, GSize, ResourceId, ResourceMap, ResourceStore, Tag,
};

/// A play count that means "loop forever".
pub const PLAY_COUNT_INFINITE: u16 = u16::MAX;

/// The total duration of a sequence that loops forever.
pub const DURATION_INFINITE: u32 = u32::MAX;

/// Bytes before the first frame.
const SEQUENCE_HEADER_SIZE: usize = 10;
const PLAY_COUNT_OFFSET: usize = 6;
const NUM_FRAMES_OFFSET: usize = 8;

/// An animated vector image.
#[derive(Debug)]
pub struct DrawCommandSequence {
  bytes: PdcBytes,
}
impl DrawCommandSequence {
  /// Checks sequence data (without the file header).
  ///
  /// ## Failure
  /// * `Malformed` if the version is newer than supported, there are no
  ///   frames, or the frames don't end exactly at the end of `bytes`.
  pub fn validate(bytes: &[u8]) -> Result<(), DecodeError> {
    let (_version, _size, rest) = pull_version_and_size(bytes)?;
    let ([_p0, _p1, f0, f1], mut rest) = try_pull_byte_array::<4>(rest)?;
    let num_frames = u16_le([f0, f1]);
    if num_frames == 0 {
      warn!("sequence has no frames");
      return Err(DecodeError::Malformed);
    }
    for i in 0..num_frames {
      let size = frame_size(rest).map_err(|e| {
        trace!("frame {} of {num_frames} is bad", i + 1);
        e
      })?;
      rest = &rest[size..];
    }
    if !rest.is_empty() {
      warn!("sequence has {} bytes after its last frame", rest.len());
      return Err(DecodeError::Malformed);
    }
    Ok(())
  }

  /// Takes ownership of sequence data (without the file header).
  pub fn from_vec(bytes: Vec<u8>) -> Result<Self, DecodeError> {
    Self::validate(&bytes)?;
    Ok(Self { bytes: PdcBytes::Owned(bytes) })
  }

  /// Loads and checks a sequence resource.
  ///
  /// A sequence in flash-mapped memory is used in place and is read-only.
  pub fn create_with_resource<S: ResourceStore>(
    map: &ResourceMap<S>, app: AppNum, id: ResourceId,
  ) -> Result<Self, DecodeError> {
    let bytes = load_pdc_resource(map, app, id, Tag::PDCS, Self::validate)?;
    Ok(Self { bytes })
  }

  /// Makes a writable heap copy.
  pub fn to_owned(&self) -> Result<Self, DecodeError> {
    Ok(Self { bytes: PdcBytes::Owned(self.bytes.to_vec()?) })
  }

  /// The sequence data, without the file header.
  #[inline]
  #[must_use]
  pub fn as_bytes(&self) -> &[u8] {
    self.bytes.as_slice()
  }

  /// If the sequence is read-only flash.
  #[inline]
  #[must_use]
  pub fn is_mapped(&self) -> bool {
    self.bytes.is_mapped()
  }

  #[inline]
  fn header_u16(&self, at: usize) -> u16 {
    match self.as_bytes().get(at..at + 2) {
      Some([a, b]) => u16_le([*a, *b]),
      _ => 0,
    }
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn version(&self) -> u8 {
    self.as_bytes().first().copied().unwrap_or(0)
  }

  /// The canvas size the frames are laid out in.
  #[inline]
  #[must_use]
  pub fn bounds_size(&self) -> GSize {
    pull_version_and_size(self.as_bytes()).map(|(_, size, _)| size).unwrap_or_default()
  }

  /// Changes the canvas size.
  ///
  /// ## Failure
  /// * `BadParameter` if the sequence is read-only.
  pub fn set_bounds_size(&mut self, size: GSize) -> Result<(), DecodeError> {
    let bytes = self.bytes.as_mut_slice().ok_or(DecodeError::BadParameter)?;
    write_size(bytes, size)
  }

  /// How many times the frames play, [`PLAY_COUNT_INFINITE`] for forever.
  #[inline]
  #[must_use]
  pub fn play_count(&self) -> u16 {
    self.header_u16(PLAY_COUNT_OFFSET)
  }

  /// ## Failure
  /// * `BadParameter` if the sequence is read-only.
  pub fn set_play_count(&mut self, play_count: u16) -> Result<(), DecodeError> {
    let bytes = self.bytes.as_mut_slice().ok_or(DecodeError::BadParameter)?;
    let slot =
      bytes.get_mut(PLAY_COUNT_OFFSET..PLAY_COUNT_OFFSET + 2).ok_or(DecodeError::Malformed)?;
    slot.copy_from_slice(&play_count.to_le_bytes());
    Ok(())
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn num_frames(&self) -> u16 {
    self.header_u16(NUM_FRAMES_OFFSET)
  }

  /// Iterates the frames in order.
  #[inline]
  #[must_use]
  pub fn frames(&self) -> FrameIter<'_> {
    FrameIter {
      rest: self.as_bytes().get(SEQUENCE_HEADER_SIZE..).unwrap_or(&[]),
      remaining: self.num_frames(),
    }
  }

  /// The frame at a 0-based index.
  #[must_use]
  pub fn frame_by_index(&self, index: u16) -> Option<FrameView<'_>> {
    self.frames().nth(index as usize)
  }

  /// A writable view of the frame at a 0-based index, `None` for a read-only
  /// sequence.
  pub fn frame_by_index_mut(&mut self, index: u16) -> Option<FrameMut<'_>> {
    if index >= self.num_frames() {
      return None;
    }
    let bytes = self.bytes.as_mut_slice()?;
    let mut rest: &mut [u8] = bytes.get_mut(SEQUENCE_HEADER_SIZE..)?;
    for _ in 0..index {
      let size = frame_size(rest).ok()?;
      rest = &mut core::mem::take(&mut rest)[size..];
    }
    FrameMut::parse(rest).ok().map(|(frame, _)| frame)
  }

  /// Duration of the frame at a 0-based index, in milliseconds.
  #[inline]
  #[must_use]
  pub fn frame_duration(&self, index: u16) -> Option<u16> {
    self.frame_by_index(index).map(|f| f.duration())
  }

  /// Duration of one pass through all of the frames, in milliseconds.
  #[must_use]
  pub fn play_duration(&self) -> u32 {
    self.frames().map(|f| f.duration() as u32).sum()
  }

  /// Duration of every pass, in milliseconds.
  ///
  /// This is [`DURATION_INFINITE`] for a sequence that loops forever, and
  /// saturates to the same value if the product is too big to hold.
  #[must_use]
  pub fn total_duration(&self) -> u32 {
    match self.play_count() {
      PLAY_COUNT_INFINITE => DURATION_INFINITE,
      count => self.play_duration().saturating_mul(count as u32),
    }
  }

  /// The frame showing at `elapsed_ms` after the start.
  ///
  /// Once every pass of a finite sequence is done this stays on the last
  /// frame. Otherwise time wraps around each pass.
  #[must_use]
  pub fn frame_by_elapsed(&self, elapsed_ms: u32) -> Option<FrameView<'_>> {
    let last = || self.frames().last();
    if self.play_count() != PLAY_COUNT_INFINITE && elapsed_ms >= self.total_duration() {
      return last();
    }
    let single = self.play_duration();
    if single == 0 {
      return last();
    }
    let mut t = elapsed_ms % single;
    for frame in self.frames() {
      let d = frame.duration() as u32;
      if t < d {
        return Some(frame);
      }
      t -= d;
    }
    last()
  }

  /// Calls `op` with each frame and its 1-based index, stopping early if `op`
  /// returns `false`.
  ///
  /// Returns if every frame was visited.
  pub fn for_each_frame<F>(&self, mut op: F) -> bool
  where
    F: FnMut(u16, FrameView<'_>) -> bool,
  {
    for (i, frame) in self.frames().enumerate() {
      if !op(i as u16 + 1, frame) {
        return false;
      }
    }
    true
  }

  /// Draws the frame showing at `elapsed_ms`, with its top left at `offset`.
  pub fn draw_at<C: GContext + ?Sized>(
    &self, ctx: &mut C, offset: GPoint, elapsed_ms: u32,
  ) -> Result<(), DecodeError> {
    match self.frame_by_elapsed(elapsed_ms) {
      Some(frame) => frame.draw(ctx, offset),
      None => Ok(()),
    }
  }
}

/// Walks the frames of a sequence.
#[derive(Debug, Clone)]
pub struct FrameIter<'d> {
  rest: &'d [u8],
  remaining: u16,
}
impl<'d> Iterator for FrameIter<'d> {
  type Item = FrameView<'d>;
  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    if self.remaining == 0 {
      return None;
    }
    let (frame, rest) = FrameView::parse(self.rest).ok()?;
    self.rest = rest;
    self.remaining -= 1;
    Some(frame)
  }
  #[inline]
  fn size_hint(&self) -> (usize, Option<usize>) {
    (0, Some(self.remaining as usize))
  }
}
