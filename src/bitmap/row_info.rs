//! Row layout of the circular 8-bit format.
//!
//! A circular bitmap only stores the pixels that are visible on a round
//! display: each row holds just the chord of the display circle at that row.
//! Rows are stored back to back, so finding a row needs a table of offsets.

use alloc::{sync::Arc, vec::Vec};

use crate::{DecodeError, GSize};

/// Where one row of a circular bitmap is stored, and which columns it covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CircularRow {
  /// Byte offset of the row's first stored pixel.
  pub offset: u32,
  /// First stored column.
  pub min_x: i16,
  /// Last stored column. Less than `min_x` when the row is empty.
  pub max_x: i16,
}
impl CircularRow {
  /// Number of stored pixels (which is also bytes) in this row.
  #[inline]
  #[must_use]
  pub const fn span(&self) -> usize {
    if self.max_x < self.min_x {
      0
    } else {
      (self.max_x - self.min_x) as usize + 1
    }
  }
}

/// Integer square root, rounded down.
const fn isqrt(n: u32) -> u32 {
  if n < 2 {
    return n;
  }
  let mut x = n;
  let mut y = (x + 1) / 2;
  while y < x {
    x = y;
    y = (x + n / x) / 2;
  }
  x
}

/// Computes the row table for a circle of diameter `size.w`, for `size.h`
/// rows.
///
/// Works in doubled coordinates so that pixel centers are integers: the chord
/// through the center of row `y` has length `sqrt(d^2 - (2y + 1 - d)^2)`. Each
/// span is widened by one when needed so that it stays centered.
pub(crate) fn circular_rows(size: GSize) -> Result<Arc<[CircularRow]>, DecodeError> {
  if size.w <= 0 || size.h <= 0 {
    return Err(DecodeError::BadParameter);
  }
  let d = size.w as i32;
  let mut rows: Vec<CircularRow> = Vec::new();
  rows.try_reserve_exact(size.h as usize)?;
  let mut offset = 0_u32;
  for y in 0..size.h as i32 {
    let dy = 2 * y + 1 - d;
    let span = if dy.abs() >= d {
      0
    } else {
      let mut w = isqrt((d * d - dy * dy) as u32) as i32;
      if (d - w) % 2 != 0 {
        w += 1;
      }
      w.min(d)
    };
    let min_x = (d - span) / 2;
    rows.push(CircularRow { offset, min_x: min_x as i16, max_x: (min_x + span - 1) as i16 });
    offset += span as u32;
  }
  Ok(rows.into())
}

/// Total bytes of pixel storage the rows need.
#[inline]
#[must_use]
pub(crate) fn circular_data_size(rows: &[CircularRow]) -> usize {
  rows.last().map(|r| r.offset as usize + r.span()).unwrap_or(0)
}
