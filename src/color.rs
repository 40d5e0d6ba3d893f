//! The display's native color: 2 bits each of alpha, red, green, and blue.

use pixel_formats::r8g8b8a8_Srgb;

/// An `argb2222` color, packed into one byte.
///
/// Bits from high to low are `a a r r g g b b`. This is the pixel value of
/// [`Format8Bit`](crate::GBitmapFormat::Format8Bit) bitmaps and the entry type
/// of every bitmap palette.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(bytemuck::Zeroable, bytemuck::Pod)]
#[repr(transparent)]
pub struct GColor8(pub u8);

#[allow(missing_docs)]
impl GColor8 {
  pub const CLEAR: Self = Self(0b00_00_00_00);
  pub const BLACK: Self = Self(0b11_00_00_00);
  pub const WHITE: Self = Self(0b11_11_11_11);
  pub const RED: Self = Self(0b11_11_00_00);
  pub const GREEN: Self = Self(0b11_00_11_00);
  pub const BLUE: Self = Self(0b11_00_00_11);

  #[inline]
  #[must_use]
  pub const fn from_argb2(a: u8, r: u8, g: u8, b: u8) -> Self {
    Self(((a & 3) << 6) | ((r & 3) << 4) | ((g & 3) << 2) | (b & 3))
  }

  /// Alpha in `0..=3`.
  #[inline]
  #[must_use]
  pub const fn alpha(self) -> u8 {
    self.0 >> 6
  }

  /// If drawing with this color would change nothing.
  #[inline]
  #[must_use]
  pub const fn is_transparent(self) -> bool {
    self.alpha() == 0
  }

  /// Reduces an 8-bit gray level to the nearest of the 4 representable levels.
  #[inline]
  #[must_use]
  pub const fn from_gray8(y: u8, a: u8) -> Self {
    let y2 = y >> 6;
    Self::from_argb2(a >> 6, y2, y2, y2)
  }
}

impl From<r8g8b8a8_Srgb> for GColor8 {
  /// Keeps the top two bits of each channel.
  #[inline]
  fn from(c: r8g8b8a8_Srgb) -> Self {
    Self::from_argb2(c.a >> 6, c.r >> 6, c.g >> 6, c.b >> 6)
  }
}

impl core::fmt::Debug for GColor8 {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(f, "GColor8(0b{:08b})", self.0)
  }
}

#[test]
fn test_gcolor8_from_rgba() {
  let black = r8g8b8a8_Srgb { r: 0, g: 0, b: 0, a: 255 };
  let white = r8g8b8a8_Srgb { r: 255, g: 255, b: 255, a: 255 };
  assert_eq!(GColor8::from(black), GColor8::BLACK);
  assert_eq!(GColor8::from(white), GColor8::WHITE);
  assert_eq!(GColor8::from(r8g8b8a8_Srgb { r: 255, g: 0, b: 0, a: 0 }), GColor8(0b00_11_00_00));
  assert!(GColor8::CLEAR.is_transparent());
  assert_eq!(GColor8::from_gray8(0x80, 0xFF), GColor8(0b11_10_10_10));
}
