#![forbid(unsafe_code)]

//! Draw command images and sequences (PDC).
//!
//! A PDC resource is a small vector scene, stored so that it can be drawn
//! straight out of flash:
//!
//! ```text
//! signature:  [u8; 4]  "PDCI" for an image, "PDCS" for a sequence
//! size:       u32      bytes after this field
//! payload:    an image or a sequence
//! ```
//!
//! Nothing in the payload has a separate length table. Each record (command,
//! command list, frame) says how big it is, and the record after it starts
//! right where it ends. Every container is checked once when it's made, and
//! walking the records has to land exactly on the end of the data, or the
//! whole container is rejected.
//!
//! Containers loaded from a flash-mapped resource are read-only. Heap copies
//! can be edited in place through the `*Mut` views, which only ever change
//! values, never the layout.

mod command;
pub use command::*;

mod list;
pub use list::*;

mod frame;
pub use frame::*;

mod image;
pub use image::*;

mod sequence;
pub use sequence::*;

mod draw;
pub use draw::*;

use alloc::vec::Vec;

use log::{debug, warn};

use crate::{
  parser_helpers::try_pull_byte_array, AppNum, DecodeError, GSize, ResourceBytes, ResourceId,
  ResourceMap, ResourceStore, Tag,
};

/// Size of the signature and size fields at the start of a PDC resource.
pub const PDC_FILE_HEADER_SIZE: usize = 8;

/// Checks the file header, returning the payload after it.
///
/// ## Failure
/// * `NotThisFormat` if the signature isn't `tag`.
/// * `Malformed` if the size field doesn't match the bytes that follow.
pub fn check_file_header(bytes: &[u8], tag: Tag) -> Result<&[u8], DecodeError> {
  let (signature, rest) = try_pull_byte_array::<4>(bytes)?;
  if Tag(signature) != tag {
    return Err(DecodeError::NotThisFormat);
  }
  let (size, payload) = try_pull_byte_array::<4>(rest)?;
  let size = u32::from_le_bytes(size);
  if usize::try_from(size)? != payload.len() {
    warn!("{tag:?} says it has {size} bytes, but {} follow", payload.len());
    return Err(DecodeError::Malformed);
  }
  Ok(payload)
}

/// Where a container's bytes live.
#[derive(Debug)]
enum PdcBytes {
  Resource(ResourceBytes),
  Owned(Vec<u8>),
}
impl PdcBytes {
  #[inline]
  fn as_slice(&self) -> &[u8] {
    match self {
      Self::Resource(r) => r.as_slice(),
      Self::Owned(v) => v,
    }
  }

  #[inline]
  fn as_mut_slice(&mut self) -> Option<&mut [u8]> {
    match self {
      Self::Resource(r) => r.as_mut_slice(),
      Self::Owned(v) => Some(v),
    }
  }

  #[inline]
  fn is_mapped(&self) -> bool {
    matches!(self, Self::Resource(r) if r.is_mapped())
  }

  /// A heap copy of the data.
  fn to_vec(&self) -> Result<Vec<u8>, DecodeError> {
    let bytes = self.as_slice();
    let mut v = Vec::new();
    v.try_reserve_exact(bytes.len())?;
    v.extend_from_slice(bytes);
    Ok(v)
  }
}

/// Loads a PDC resource and checks its file header and payload.
///
/// The file header is dropped from the returned bytes. The resource is
/// released again if anything fails.
fn load_pdc_resource<S: ResourceStore>(
  map: &ResourceMap<S>, app: AppNum, id: ResourceId, tag: Tag,
  validate: fn(&[u8]) -> Result<(), DecodeError>,
) -> Result<PdcBytes, DecodeError> {
  let mut bytes = map.load(app, id, false)?;
  let checked = check_file_header(bytes.as_slice(), tag).and_then(validate);
  if let Err(e) = checked {
    warn!("resource {app}:{id} is not a valid {tag:?}: {e}");
    map.release(bytes);
    return Err(e);
  }
  bytes.advance(PDC_FILE_HEADER_SIZE);
  debug!("loaded {tag:?} {app}:{id}, {} bytes", bytes.len());
  Ok(PdcBytes::Resource(bytes))
}

/// Any version newer than this is rejected.
pub const PDC_VERSION: u8 = 1;

/// Reads the shared `version, reserved, width, height` prefix of images and
/// sequences.
fn pull_version_and_size(bytes: &[u8]) -> Result<(u8, GSize, &[u8]), DecodeError> {
  let ([version, _reserved, w0, w1, h0, h1], rest) = try_pull_byte_array::<6>(bytes)?;
  if version > PDC_VERSION {
    warn!("PDC version {version} is newer than {PDC_VERSION}");
    return Err(DecodeError::Malformed);
  }
  let size = GSize { w: i16::from_le_bytes([w0, w1]), h: i16::from_le_bytes([h0, h1]) };
  Ok((version, size, rest))
}

/// Writes a size into the shared prefix.
fn write_size(bytes: &mut [u8], size: GSize) -> Result<(), DecodeError> {
  let slot = bytes.get_mut(2..6).ok_or(DecodeError::Malformed)?;
  slot[..2].copy_from_slice(&size.w.to_le_bytes());
  slot[2..].copy_from_slice(&size.h.to_le_bytes());
  Ok(())
}
