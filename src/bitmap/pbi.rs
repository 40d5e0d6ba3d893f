//! The raw bitmap resource format (PBI).
//!
//! A PBI is a small fixed header, then the pixel rows, then (for palette
//! formats) the palette:
//!
//! ```text
//! row_size_bytes: u16
//! info_flags:     u16   bit 0 heap, bits 1..=3 format, bit 4 palette heap, bits 12..=15 version
//! reserved:       u16 x 2
//! width:          u16
//! height:         u16
//! data:           [u8; row_size_bytes * height]
//! palette:        [GColor8; palette_size]
//! ```
//!
//! All values are little-endian.

use pack1::U16LE;

use super::{row_info::circular_rows, GBitmapFormat};
use crate::{
  bitmap::row_info::circular_data_size, parser_helpers::try_pull_pod, CompatMode, DecodeError,
  GSize, PlatformConfig,
};

#[derive(Debug, Clone, Copy, bytemuck::Zeroable, bytemuck::Pod)]
#[repr(C)]
pub(crate) struct PbiHeader {
  pub row_size_bytes: U16LE,
  pub info_flags: U16LE,
  pub reserved: [U16LE; 2],
  pub width: U16LE,
  pub height: U16LE,
}

/// Size of [`PbiHeader`] in bytes.
pub const PBI_HEADER_SIZE: usize = core::mem::size_of::<PbiHeader>();

pub(crate) const INFO_HEAP_BIT: u16 = 1 << 0;
pub(crate) const INFO_FORMAT_SHIFT: u16 = 1;
pub(crate) const INFO_FORMAT_MASK: u16 = 0b111;
pub(crate) const INFO_PALETTE_HEAP_BIT: u16 = 1 << 4;
pub(crate) const INFO_VERSION_SHIFT: u16 = 12;

/// The checked contents of a PBI header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PbiLayout {
  pub format: GBitmapFormat,
  pub version: u8,
  pub row_size_bytes: u16,
  pub size: GSize,
  /// Bytes of pixel data following the header.
  pub pixel_len: usize,
  /// Bytes of palette following the pixel data.
  pub palette_len: usize,
}
impl PbiLayout {
  /// Header plus pixels plus palette.
  #[inline]
  #[must_use]
  pub fn total_len(&self) -> usize {
    PBI_HEADER_SIZE + self.pixel_len + self.palette_len
  }
}

/// Parses and checks the header at the start of `bytes`.
///
/// Checks that the declared stride can actually hold a row of the declared
/// width in the declared format. Does *not* check that enough bytes follow
/// the header, since callers differ on whether extra bytes are allowed.
pub(crate) fn parse_pbi_header(
  bytes: &[u8], platform: &PlatformConfig,
) -> Result<PbiLayout, DecodeError> {
  let (header, _rest) = try_pull_pod::<PbiHeader>(bytes)?;
  let info_flags = header.info_flags.get();
  let format_bits = ((info_flags >> INFO_FORMAT_SHIFT) & INFO_FORMAT_MASK) as u8;
  let format = GBitmapFormat::try_from(format_bits).map_err(|_| DecodeError::Malformed)?;
  if platform.compat == CompatMode::Legacy2 && format != GBitmapFormat::Format1Bit {
    return Err(DecodeError::UnsupportedFeature);
  }
  let size = GSize {
    w: i16::try_from(header.width.get())?,
    h: i16::try_from(header.height.get())?,
  };
  let row_size_bytes = header.row_size_bytes.get();
  let pixel_len = if format == GBitmapFormat::Format8BitCircular {
    if size.is_empty() {
      return Err(DecodeError::Malformed);
    }
    circular_data_size(&circular_rows(size)?)
  } else {
    let needed_bits = format.bits_per_pixel() as usize * size.w as usize;
    if (row_size_bytes as usize) * 8 < needed_bits {
      return Err(DecodeError::Malformed);
    }
    if format == GBitmapFormat::Format1Bit && row_size_bytes % 4 != 0 {
      return Err(DecodeError::Malformed);
    }
    row_size_bytes as usize * size.h as usize
  };
  Ok(PbiLayout {
    format,
    version: (info_flags >> INFO_VERSION_SHIFT) as u8,
    row_size_bytes,
    size,
    pixel_len,
    palette_len: format.palette_size(),
  })
}
