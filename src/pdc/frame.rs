//! Sequence frames: a `u16` duration in milliseconds, then a command list.

use super::list::{command_list_size, CommandListMut, CommandListView};
use crate::{
  parser_helpers::{try_pull_byte_array, u16_le},
  DecodeError,
};

/// Checks the frame at the start of `bytes`, returning its size.
#[inline]
pub fn frame_size(bytes: &[u8]) -> Result<usize, DecodeError> {
  let (_duration, rest) = try_pull_byte_array::<2>(bytes)?;
  Ok(2 + command_list_size(rest)?)
}

/// A read-only view of a frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'d> {
  duration: u16,
  list: CommandListView<'d>,
}
impl<'d> FrameView<'d> {
  /// Views the frame at the start of `bytes`, returning it and the bytes after
  /// it.
  pub fn parse(bytes: &'d [u8]) -> Result<(Self, &'d [u8]), DecodeError> {
    let (duration, rest) = try_pull_byte_array::<2>(bytes)?;
    let (list, rest) = CommandListView::parse(rest)?;
    Ok((Self { duration: u16_le(duration), list }, rest))
  }

  /// How long this frame shows, in milliseconds.
  #[inline]
  #[must_use]
  pub fn duration(&self) -> u16 {
    self.duration
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn command_list(&self) -> CommandListView<'d> {
    self.list
  }

  /// Bytes this frame takes up.
  #[inline]
  #[must_use]
  pub fn size(&self) -> usize {
    2 + self.list.size()
  }
}

/// A writable view of a frame.
#[derive(Debug)]
pub struct FrameMut<'d> {
  duration: &'d mut [u8; 2],
  list: CommandListMut<'d>,
}
impl<'d> FrameMut<'d> {
  /// Views the frame at the start of `bytes`, returning it and the bytes after
  /// it.
  pub fn parse(bytes: &'d mut [u8]) -> Result<(Self, &'d mut [u8]), DecodeError> {
    if bytes.len() < 2 {
      return Err(DecodeError::Malformed);
    }
    let (duration, rest) = bytes.split_at_mut(2);
    let duration: &mut [u8; 2] = duration.try_into().map_err(|_| DecodeError::Malformed)?;
    let (list, rest) = CommandListMut::parse(rest)?;
    Ok((Self { duration, list }, rest))
  }

  /// Reads the current values.
  #[inline]
  #[must_use]
  pub fn as_view(&self) -> FrameView<'_> {
    FrameView { duration: u16_le(*self.duration), list: self.list.as_view() }
  }

  /// Sets how long this frame shows, in milliseconds.
  #[inline]
  pub fn set_duration(&mut self, duration: u16) {
    *self.duration = duration.to_le_bytes();
  }

  #[inline]
  #[allow(missing_docs)]
  pub fn command_list_mut(&mut self) -> &mut CommandListMut<'d> {
    &mut self.list
  }
}
