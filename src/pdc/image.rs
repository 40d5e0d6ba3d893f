//! Static draw command images (`PDCI`).
//!
//! After the file header:
//!
//! ```text
//! version:   u8
//! reserved:  u8
//! size:      (i16, i16)  the canvas the commands are drawn in
//! commands:  a command list, running to the end of the data
//! ```

use alloc::vec::Vec;

use log::warn;

use super::{
  draw::{DrawCommandProcessor, GContext},
  list::{command_list_size, CommandListMut, CommandListView},
  load_pdc_resource, pull_version_and_size, write_size, PdcBytes,
};
use crate::{AppNum, DecodeError, GPoint, GSize, ResourceId, ResourceMap, ResourceStore, Tag};

/// Bytes before the command list.
const IMAGE_HEADER_SIZE: usize = 6;

/// A vector image.
#[derive(Debug)]
pub struct DrawCommandImage {
  bytes: PdcBytes,
}
impl DrawCommandImage {
  /// Checks image data (without the file header).
  ///
  /// ## Failure
  /// * `Malformed` if the version is newer than supported, or the commands
  ///   don't end exactly at the end of `bytes`.
  pub fn validate(bytes: &[u8]) -> Result<(), DecodeError> {
    let (_version, _size, list) = pull_version_and_size(bytes)?;
    let used = command_list_size(list)?;
    if used != list.len() {
      warn!("image commands end at {}, but there's {} bytes", used, list.len());
      return Err(DecodeError::Malformed);
    }
    Ok(())
  }

  /// Takes ownership of image data (without the file header).
  pub fn from_vec(bytes: Vec<u8>) -> Result<Self, DecodeError> {
    Self::validate(&bytes)?;
    Ok(Self { bytes: PdcBytes::Owned(bytes) })
  }

  /// Loads and checks an image resource.
  ///
  /// An image in flash-mapped memory is used in place and is read-only.
  pub fn create_with_resource<S: ResourceStore>(
    map: &ResourceMap<S>, app: AppNum, id: ResourceId,
  ) -> Result<Self, DecodeError> {
    let bytes = load_pdc_resource(map, app, id, Tag::PDCI, Self::validate)?;
    Ok(Self { bytes })
  }

  /// Makes a writable heap copy.
  pub fn to_owned(&self) -> Result<Self, DecodeError> {
    Ok(Self { bytes: PdcBytes::Owned(self.bytes.to_vec()?) })
  }

  /// The image data, without the file header.
  #[inline]
  #[must_use]
  pub fn as_bytes(&self) -> &[u8] {
    self.bytes.as_slice()
  }

  /// If the image is read-only flash.
  #[inline]
  #[must_use]
  pub fn is_mapped(&self) -> bool {
    self.bytes.is_mapped()
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn version(&self) -> u8 {
    self.as_bytes().first().copied().unwrap_or(0)
  }

  /// The canvas size the commands are laid out in.
  #[inline]
  #[must_use]
  pub fn bounds_size(&self) -> GSize {
    pull_version_and_size(self.as_bytes()).map(|(_, size, _)| size).unwrap_or_default()
  }

  /// Changes the canvas size.
  ///
  /// ## Failure
  /// * `BadParameter` if the image is read-only.
  pub fn set_bounds_size(&mut self, size: GSize) -> Result<(), DecodeError> {
    let bytes = self.bytes.as_mut_slice().ok_or(DecodeError::BadParameter)?;
    write_size(bytes, size)
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn command_list(&self) -> CommandListView<'_> {
    CommandListView::from_checked(self.as_bytes().get(IMAGE_HEADER_SIZE..).unwrap_or(&[]))
  }

  /// A writable view of the commands, `None` for a read-only image.
  #[inline]
  #[must_use]
  pub fn command_list_mut(&mut self) -> Option<CommandListMut<'_>> {
    let bytes = self.bytes.as_mut_slice()?;
    Some(CommandListMut::from_checked(bytes.get_mut(IMAGE_HEADER_SIZE..)?))
  }

  /// Draws the image with its top left at `offset`.
  #[inline]
  pub fn draw<C: GContext + ?Sized>(&self, ctx: &mut C, offset: GPoint) -> Result<(), DecodeError> {
    self.command_list().draw(ctx, offset)
  }

  /// Draws the image, letting `processor` edit a copy of each command first.
  #[inline]
  pub fn draw_processed<C: GContext + ?Sized, P: DrawCommandProcessor>(
    &self, ctx: &mut C, offset: GPoint, processor: &mut P,
  ) -> Result<(), DecodeError> {
    self.command_list().draw_processed(ctx, offset, processor)
  }
}
