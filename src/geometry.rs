//! Points, sizes, and rectangles in display coordinates.

use core::ops::{Add, Sub};

/// A position, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub struct GPoint {
  pub x: i16,
  pub y: i16,
}
impl GPoint {
  #[inline]
  #[must_use]
  pub const fn new(x: i16, y: i16) -> Self {
    Self { x, y }
  }
}
impl Add for GPoint {
  type Output = Self;
  #[inline]
  fn add(self, rhs: Self) -> Self {
    Self { x: self.x.wrapping_add(rhs.x), y: self.y.wrapping_add(rhs.y) }
  }
}
impl Sub for GPoint {
  type Output = Self;
  #[inline]
  fn sub(self, rhs: Self) -> Self {
    Self { x: self.x.wrapping_sub(rhs.x), y: self.y.wrapping_sub(rhs.y) }
  }
}

/// A width and height, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub struct GSize {
  pub w: i16,
  pub h: i16,
}
impl GSize {
  #[inline]
  #[must_use]
  pub const fn new(w: i16, h: i16) -> Self {
    Self { w, h }
  }
  /// If either dimension is zero or negative.
  #[inline]
  #[must_use]
  pub const fn is_empty(self) -> bool {
    self.w <= 0 || self.h <= 0
  }
}

/// An origin plus a size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub struct GRect {
  pub origin: GPoint,
  pub size: GSize,
}
impl GRect {
  #[inline]
  #[must_use]
  pub const fn new(x: i16, y: i16, w: i16, h: i16) -> Self {
    Self { origin: GPoint { x, y }, size: GSize { w, h } }
  }

  /// One past the rightmost column.
  #[inline]
  #[must_use]
  pub const fn max_x(&self) -> i32 {
    self.origin.x as i32 + self.size.w as i32
  }

  /// One past the bottom row.
  #[inline]
  #[must_use]
  pub const fn max_y(&self) -> i32 {
    self.origin.y as i32 + self.size.h as i32
  }

  /// Flips negative sizes so that the size is never negative.
  #[inline]
  #[must_use]
  pub fn standardize(self) -> Self {
    let mut out = self;
    if out.size.w < 0 {
      out.origin.x = out.origin.x.wrapping_add(out.size.w);
      out.size.w = out.size.w.wrapping_neg();
    }
    if out.size.h < 0 {
      out.origin.y = out.origin.y.wrapping_add(out.size.h);
      out.size.h = out.size.h.wrapping_neg();
    }
    out
  }

  /// The overlap of `self` with `container`.
  ///
  /// When the two don't overlap the output has a zero size, positioned at the
  /// nearest edge of `container`, so it's still inside of it.
  #[must_use]
  pub fn clip(self, container: GRect) -> Self {
    let r = self.standardize();
    let c = container.standardize();
    let min_x = (r.origin.x as i32).clamp(c.origin.x as i32, c.max_x());
    let min_y = (r.origin.y as i32).clamp(c.origin.y as i32, c.max_y());
    let max_x = r.max_x().clamp(min_x, c.max_x());
    let max_y = r.max_y().clamp(min_y, c.max_y());
    // all four values are clamped inside of `c`, so they fit in i16
    Self::new(min_x as i16, min_y as i16, (max_x - min_x) as i16, (max_y - min_y) as i16)
  }

  /// The smallest rectangle covering both inputs.
  #[must_use]
  pub fn union(self, other: GRect) -> Self {
    let a = self.standardize();
    let b = other.standardize();
    let min_x = a.origin.x.min(b.origin.x);
    let min_y = a.origin.y.min(b.origin.y);
    let max_x = a.max_x().max(b.max_x());
    let max_y = a.max_y().max(b.max_y());
    Self::new(
      min_x,
      min_y,
      (max_x - min_x as i32).clamp(0, i16::MAX as i32) as i16,
      (max_y - min_y as i32).clamp(0, i16::MAX as i32) as i16,
    )
  }

  /// If `other` lies completely inside of `self`.
  #[inline]
  #[must_use]
  pub fn contains_rect(&self, other: &GRect) -> bool {
    let o = other.standardize();
    o.origin.x >= self.origin.x
      && o.origin.y >= self.origin.y
      && o.max_x() <= self.max_x()
      && o.max_y() <= self.max_y()
  }
}

/// A sub-pixel position stored as 13.3 signed fixed point (`Fixed_S16_3`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub struct GPointPrecise {
  pub x: i16,
  pub y: i16,
}
impl GPointPrecise {
  /// Number of fractional bits.
  pub const FRACTION_BITS: u32 = 3;

  #[inline]
  #[must_use]
  pub const fn new(raw_x: i16, raw_y: i16) -> Self {
    Self { x: raw_x, y: raw_y }
  }

  /// Rounds toward negative infinity.
  #[inline]
  #[must_use]
  pub const fn to_gpoint(self) -> GPoint {
    GPoint { x: self.x >> Self::FRACTION_BITS, y: self.y >> Self::FRACTION_BITS }
  }

  /// Offsets by a whole-pixel amount.
  #[inline]
  #[must_use]
  pub const fn offset_by(self, p: GPoint) -> Self {
    Self {
      x: self.x.wrapping_add(p.x.wrapping_shl(Self::FRACTION_BITS)),
      y: self.y.wrapping_add(p.y.wrapping_shl(Self::FRACTION_BITS)),
    }
  }
}
impl From<GPoint> for GPointPrecise {
  #[inline]
  fn from(p: GPoint) -> Self {
    Self { x: p.x.wrapping_shl(Self::FRACTION_BITS), y: p.y.wrapping_shl(Self::FRACTION_BITS) }
  }
}
