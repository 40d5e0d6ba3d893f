//! Command lists: a `u16` count, then that many commands back to back.

use log::trace;

use super::command::{command_size, DrawCommandMut, DrawCommandView};
use crate::{
  parser_helpers::{try_pull_byte_array, u16_le},
  DecodeError,
};

/// Checks the list at the start of `bytes`, returning its size.
///
/// The list may be followed by more bytes. It's up to the container to check
/// that the list ends where it should.
pub fn command_list_size(bytes: &[u8]) -> Result<usize, DecodeError> {
  let (count, mut rest) = try_pull_byte_array::<2>(bytes)?;
  let count = u16_le(count);
  let mut size = 2;
  for i in 0..count {
    let command = command_size(rest).map_err(|e| {
      trace!("command {} of {count} is bad", i + 1);
      e
    })?;
    size += command;
    rest = &rest[command..];
  }
  Ok(size)
}

/// A read-only view of a command list.
#[derive(Debug, Clone, Copy)]
pub struct CommandListView<'d> {
  num_commands: u16,
  commands: &'d [u8],
}
impl<'d> CommandListView<'d> {
  /// Views the list at the start of `bytes`, returning it and the bytes after
  /// it.
  pub fn parse(bytes: &'d [u8]) -> Result<(Self, &'d [u8]), DecodeError> {
    let size = command_list_size(bytes)?;
    let (this, rest) = bytes.split_at(size);
    Ok((Self { num_commands: u16_le([this[0], this[1]]), commands: &this[2..] }, rest))
  }

  /// Views a list that its container already checked.
  ///
  /// Nothing is checked again here. If the bytes were bad after all, iteration
  /// just ends at the first command that doesn't parse.
  #[inline]
  #[must_use]
  pub(crate) fn from_checked(bytes: &'d [u8]) -> Self {
    match bytes {
      [c0, c1, commands @ ..] => Self { num_commands: u16_le([*c0, *c1]), commands },
      _ => Self { num_commands: 0, commands: &[] },
    }
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn num_commands(&self) -> u16 {
    self.num_commands
  }

  /// Bytes this list takes up, count included.
  #[inline]
  #[must_use]
  pub fn size(&self) -> usize {
    2 + self.commands.len()
  }

  /// Iterates the commands in storage order.
  #[inline]
  #[must_use]
  pub fn iter(&self) -> DrawCommandIter<'d> {
    DrawCommandIter { rest: self.commands, remaining: self.num_commands }
  }

  /// The command at a 0-based index.
  #[must_use]
  pub fn get(&self, index: u16) -> Option<DrawCommandView<'d>> {
    self.iter().nth(index as usize)
  }

  /// Calls `op` with each command and its 1-based index, stopping early if
  /// `op` returns `false`.
  ///
  /// Returns if every command was visited.
  pub fn for_each_command<F>(&self, mut op: F) -> bool
  where
    F: FnMut(u16, DrawCommandView<'d>) -> bool,
  {
    for (i, command) in self.iter().enumerate() {
      if !op(i as u16 + 1, command) {
        return false;
      }
    }
    true
  }
}

/// Walks the commands of a list.
///
/// Each step finds the next command from the size of the current one.
#[derive(Debug, Clone)]
pub struct DrawCommandIter<'d> {
  rest: &'d [u8],
  remaining: u16,
}
impl<'d> Iterator for DrawCommandIter<'d> {
  type Item = DrawCommandView<'d>;
  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    if self.remaining == 0 {
      return None;
    }
    let (command, rest) = DrawCommandView::parse(self.rest).ok()?;
    self.rest = rest;
    self.remaining -= 1;
    Some(command)
  }
  #[inline]
  fn size_hint(&self) -> (usize, Option<usize>) {
    (0, Some(self.remaining as usize))
  }
}

/// A writable view of a command list.
#[derive(Debug)]
pub struct CommandListMut<'d> {
  num_commands: u16,
  commands: &'d mut [u8],
}
impl<'d> CommandListMut<'d> {
  /// Views the list at the start of `bytes`, returning it and the bytes after
  /// it.
  pub fn parse(bytes: &'d mut [u8]) -> Result<(Self, &'d mut [u8]), DecodeError> {
    let size = command_list_size(bytes)?;
    let (this, rest) = bytes.split_at_mut(size);
    let num_commands = u16_le([this[0], this[1]]);
    Ok((Self { num_commands, commands: &mut this[2..] }, rest))
  }

  /// Writable version of [`CommandListView::from_checked`].
  #[inline]
  #[must_use]
  pub(crate) fn from_checked(bytes: &'d mut [u8]) -> Self {
    match bytes {
      [c0, c1, commands @ ..] => Self { num_commands: u16_le([*c0, *c1]), commands },
      _ => Self { num_commands: 0, commands: &mut [] },
    }
  }

  /// Reads the current values.
  #[inline]
  #[must_use]
  pub fn as_view(&self) -> CommandListView<'_> {
    CommandListView { num_commands: self.num_commands, commands: self.commands }
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn num_commands(&self) -> u16 {
    self.num_commands
  }

  /// The command at a 0-based index.
  pub fn command_mut(&mut self, index: u16) -> Option<DrawCommandMut<'_>> {
    let mut rest: &mut [u8] = &mut *self.commands;
    for _ in 0..index.min(self.num_commands) {
      let size = command_size(rest).ok()?;
      rest = &mut core::mem::take(&mut rest)[size..];
    }
    if index >= self.num_commands {
      return None;
    }
    DrawCommandMut::parse(rest).ok().map(|(command, _)| command)
  }

  /// Calls `op` with each command and its 1-based index, stopping early if
  /// `op` returns `false`.
  ///
  /// Returns if every command was visited.
  pub fn for_each_command_mut<F>(&mut self, mut op: F) -> bool
  where
    F: FnMut(u16, &mut DrawCommandMut<'_>) -> bool,
  {
    let mut rest: &mut [u8] = &mut *self.commands;
    for i in 0..self.num_commands {
      let Ok((mut command, after)) = DrawCommandMut::parse(core::mem::take(&mut rest)) else {
        return false;
      };
      if !op(i + 1, &mut command) {
        return false;
      }
      rest = after;
    }
    true
  }
}
