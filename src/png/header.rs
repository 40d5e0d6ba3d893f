use super::{PngChunk, PngError};
use crate::{parser_helpers::u32_be, Tag};

/// PNG color types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PngColorType {
  /// Greyscale
  Y = 0,
  /// Red, Green, Blue
  RGB = 2,
  /// Index into a palette.
  ///
  /// The palette will have RGB8 data. There may optionally be a transparency
  /// chunk.
  Index = 3,
  /// Greyscale + Alpha
  YA = 4,
  /// Red, Green, Blue, Alpha
  RGBA = 6,
}
impl PngColorType {
  /// The number of channels in this type of color.
  #[inline]
  #[must_use]
  pub const fn channel_count(self) -> u8 {
    match self {
      Self::Y => 1,
      Self::RGB => 3,
      Self::Index => 1,
      Self::YA => 2,
      Self::RGBA => 4,
    }
  }

  /// If the bit depth is allowed at all for this color type.
  #[inline]
  #[must_use]
  pub const fn allows_bit_depth(self, bit_depth: u8) -> bool {
    match self {
      Self::Y => matches!(bit_depth, 1 | 2 | 4 | 8 | 16),
      Self::Index => matches!(bit_depth, 1 | 2 | 4 | 8),
      Self::RGB | Self::YA | Self::RGBA => matches!(bit_depth, 8 | 16),
    }
  }
}
impl TryFrom<u8> for PngColorType {
  type Error = ();
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => PngColorType::Y,
      2 => PngColorType::RGB,
      3 => PngColorType::Index,
      4 => PngColorType::YA,
      6 => PngColorType::RGBA,
      _ => return Err(()),
    })
  }
}

/// Image Header
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PngHeader {
  /// width in pixels
  pub width: u32,
  /// height in pixels
  pub height: u32,
  /// bits per channel
  pub bit_depth: u8,
  /// pixel color type
  pub color_type: PngColorType,
}
impl PngHeader {
  /// Parses and checks an `IHDR` chunk.
  ///
  /// ## Failure
  /// * `Malformed` for a zero sized image, an invalid color type or bit depth,
  ///   or a compression or filter method other than 0.
  /// * `UnsupportedInterlacing` for interlaced images.
  /// * `UnsupportedColorFormat` for 16 bits per channel.
  pub fn from_chunk(chunk: PngChunk<'_>) -> Result<Self, PngError> {
    if chunk.tag != Tag::IHDR {
      return Err(PngError::Malformed);
    }
    let [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, compression, filter, interlace] =
      <[u8; 13]>::try_from(chunk.data).map_err(|_| PngError::Malformed)?;
    let width = u32_be([w0, w1, w2, w3]);
    let height = u32_be([h0, h1, h2, h3]);
    if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
      return Err(PngError::Malformed);
    }
    let color_type = PngColorType::try_from(color_type).map_err(|_| PngError::Malformed)?;
    if !color_type.allows_bit_depth(bit_depth) {
      return Err(PngError::Malformed);
    }
    if compression != 0 || filter != 0 || interlace > 1 {
      return Err(PngError::Malformed);
    }
    if interlace == 1 {
      return Err(PngError::UnsupportedInterlacing);
    }
    if bit_depth == 16 {
      return Err(PngError::UnsupportedColorFormat);
    }
    Ok(Self { width, height, bit_depth, color_type })
  }

  /// Bits used by each pixel.
  #[inline]
  #[must_use]
  pub const fn bits_per_pixel(&self) -> usize {
    self.bit_depth as usize * self.color_type.channel_count() as usize
  }

  /// Bytes the filter algorithm treats as one unit (always at least 1).
  #[inline]
  #[must_use]
  pub const fn filter_unit(&self) -> usize {
    let bytes = self.bits_per_pixel() / 8;
    if bytes == 0 {
      1
    } else {
      bytes
    }
  }

  /// Bytes in one row of `width` pixels, not counting the filter byte.
  ///
  /// `None` if that doesn't fit in a `usize`.
  #[inline]
  #[must_use]
  pub const fn row_stride(&self, width: u32) -> Option<usize> {
    match self.bits_per_pixel().checked_mul(width as usize) {
      Some(bits) => match bits.checked_add(7) {
        Some(bits) => Some(bits / 8),
        None => None,
      },
      None => None,
    }
  }
}
