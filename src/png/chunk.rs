use core::fmt::Debug;

use super::PngError;
use crate::{
  parser_helpers::{try_pull_byte_array, try_split_at, u32_be},
  Tag,
};

#[allow(nonstandard_style)]
#[allow(missing_docs)]
impl Tag {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const PLTE: Self = Self(*b"PLTE");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");
  pub const tRNS: Self = Self(*b"tRNS");
  pub const acTL: Self = Self(*b"acTL");
  pub const fcTL: Self = Self(*b"fcTL");
  pub const fdAT: Self = Self(*b"fdAT");
}

/// An unparsed chunk from a PNG.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PngChunk<'b> {
  pub(crate) tag: Tag,
  pub(crate) data: &'b [u8],
  pub(crate) declared_crc: u32,
}
impl<'b> PngChunk<'b> {
  #[inline]
  #[must_use]
  pub const fn tag(&self) -> Tag {
    self.tag
  }
  #[inline]
  #[must_use]
  pub const fn data(&self) -> &'b [u8] {
    self.data
  }
  #[inline]
  #[must_use]
  pub const fn declared_crc(&self) -> u32 {
    self.declared_crc
  }

  /// Splits one chunk off the front of `bytes`.
  ///
  /// The chunk must fit completely, including its CRC.
  pub fn pull(bytes: &'b [u8]) -> Result<(Self, &'b [u8]), PngError> {
    let (len, rest) = try_pull_byte_array::<4>(bytes)?;
    let (tag, rest) = try_pull_byte_array::<4>(rest)?;
    let len = usize::try_from(u32_be(len)).map_err(|_| PngError::Malformed)?;
    let (data, rest) = try_split_at(rest, len)?;
    let (crc, rest) = try_pull_byte_array::<4>(rest)?;
    Ok((Self { tag: Tag(tag), data, declared_crc: u32_be(crc) }, rest))
  }
}
impl Debug for PngChunk<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("PngChunk")
      .field("tag", &self.tag)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("declared_crc", &self.declared_crc)
      .finish()
  }
}

#[test]
fn test_pull_chunk() {
  let bytes = [0, 0, 0, 2, b'a', b'b', b'C', b'd', 7, 8, 1, 2, 3, 4, 99];
  let (chunk, rest) = PngChunk::pull(&bytes).unwrap();
  assert_eq!(chunk.tag(), Tag(*b"abCd"));
  assert!(chunk.tag().is_ancillary());
  assert_eq!(chunk.data(), &[7, 8]);
  assert_eq!(chunk.declared_crc(), 0x01020304);
  assert_eq!(rest, &[99]);
  // the CRC is cut off
  assert_eq!(PngChunk::pull(&bytes[..13]), Err(PngError::Malformed));
}
