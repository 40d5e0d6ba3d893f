//! Tells apart the resource formats by their leading bytes.

use core::fmt::Write;

/// A four byte tag that's meant to be read as ascii.
///
/// PNG chunk types and draw command file signatures are both tags like this,
/// so this gives them a readable `Debug` output.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(bytemuck::Zeroable, bytemuck::Pod)]
#[repr(transparent)]
pub struct Tag(pub [u8; 4]);

#[allow(missing_docs)]
impl Tag {
  pub const PDCI: Self = Self(*b"PDCI");
  pub const PDCS: Self = Self(*b"PDCS");

  /// In PNG, a lowercase first letter marks a chunk as safe to skip.
  #[inline]
  #[must_use]
  pub const fn is_ancillary(self) -> bool {
    self.0[0] & 0x20 != 0
  }
}
impl core::fmt::Debug for Tag {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_char('\"')?;
    for ch in self.0.iter().copied().map(|u| u as char) {
      f.write_char(ch)?;
    }
    f.write_char('\"')
  }
}
impl From<[u8; 4]> for Tag {
  #[inline]
  fn from(array: [u8; 4]) -> Self {
    Self(array)
  }
}

/// The first eight bytes of a PNG datastream.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// The kinds of image resource this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImageFormat {
  /// PNG or APNG.
  Png,
  /// A static draw command image.
  Pdci,
  /// A draw command sequence.
  Pdcs,
  /// Anything else is assumed to be a raw PBI bitmap, which has no signature.
  Pbi,
}

/// Checks if the initial 8 bytes are the PNG signature.
#[inline]
#[must_use]
pub fn is_png(bytes: &[u8]) -> bool {
  bytes.starts_with(&PNG_SIGNATURE)
}

/// Picks the format of some resource bytes based on their signature.
#[must_use]
pub fn sniff(bytes: &[u8]) -> ImageFormat {
  if is_png(bytes) {
    return ImageFormat::Png;
  }
  match bytes.get(..4).and_then(|b| <[u8; 4]>::try_from(b).ok()).map(Tag) {
    Some(Tag::PDCI) => ImageFormat::Pdci,
    Some(Tag::PDCS) => ImageFormat::Pdcs,
    _ => ImageFormat::Pbi,
  }
}

#[test]
fn test_sniff() {
  assert_eq!(sniff(&PNG_SIGNATURE), ImageFormat::Png);
  assert_eq!(sniff(b"PDCI\x00\x00\x00\x00"), ImageFormat::Pdci);
  assert_eq!(sniff(b"PDCS"), ImageFormat::Pdcs);
  assert_eq!(sniff(b"PDC"), ImageFormat::Pbi);
  assert_eq!(sniff(&PNG_SIGNATURE[..7]), ImageFormat::Pbi);
  assert!(Tag(*b"tRNS").is_ancillary());
  assert!(!Tag(*b"IDAT").is_ancillary());
}
