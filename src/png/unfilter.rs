use alloc::vec::Vec;

use super::PngError;

/// The per-scanline filter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum PngFilter {
  None = 0,
  Sub = 1,
  Up = 2,
  Average = 3,
  Paeth = 4,
}
impl TryFrom<u8> for PngFilter {
  type Error = ();
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => Self::None,
      1 => Self::Sub,
      2 => Self::Up,
      3 => Self::Average,
      4 => Self::Paeth,
      _ => return Err(()),
    })
  }
}

const fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p: i32 = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  // the order of these tests is fixed by the PNG format
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// The value a filter predicts for byte `i` of a row.
///
/// * `a` is the byte one filter unit to the left (0 at the start of a row)
/// * `b` is the byte above (0 on the first row)
/// * `c` is the byte above and to the left
#[inline]
fn predict(filter: PngFilter, a: u8, b: u8, c: u8) -> u8 {
  match filter {
    PngFilter::None => 0,
    PngFilter::Sub => a,
    PngFilter::Up => b,
    PngFilter::Average => ((a as u16 + b as u16) / 2) as u8,
    PngFilter::Paeth => paeth_predict(a, b, c),
  }
}

/// Reverses one filter in place.
fn unfilter_row(filter: PngFilter, prev: Option<&[u8]>, row: &mut [u8], unit: usize) {
  if filter == PngFilter::None {
    return;
  }
  for i in 0..row.len() {
    let a = if i >= unit { row[i - unit] } else { 0 };
    let b = prev.map_or(0, |p| p[i]);
    let c = if i >= unit { prev.map_or(0, |p| p[i - unit]) } else { 0 };
    row[i] = row[i].wrapping_add(predict(filter, a, b, c));
  }
}

/// Applies a filter to one row of raw bytes.
///
/// `prev` is the raw (not filtered) previous row, or `None` for the first
/// row of an image. The output doesn't include the filter type byte.
pub fn filter_scanline(
  filter: PngFilter, prev: Option<&[u8]>, row: &[u8], unit: usize, out: &mut [u8],
) {
  for (i, out) in out.iter_mut().enumerate().take(row.len()) {
    let a = if i >= unit { row[i - unit] } else { 0 };
    let b = prev.map_or(0, |p| p[i]);
    let c = if i >= unit { prev.map_or(0, |p| p[i - unit]) } else { 0 };
    *out = row[i].wrapping_sub(predict(filter, a, b, c));
  }
}

/// Unfilters decompressed image data in place.
///
/// The data must be whole lines of one filter byte plus `row_len` data bytes.
/// `unit` is the number of bytes per complete pixel, rounded up to 1. Filter
/// bytes are reset to [`PngFilter::None`] as each row is processed.
///
/// ## Failure
/// * `Malformed` if the data isn't whole lines or a filter type is invalid.
///   Rows before the bad one will already be unfiltered.
pub fn unfilter_in_place(data: &mut [u8], row_len: usize, unit: usize) -> Result<(), PngError> {
  let line = row_len + 1;
  if row_len == 0 || unit == 0 || data.len() % line != 0 {
    return Err(PngError::Malformed);
  }
  let mut prev: Option<&[u8]> = None;
  for chunk in data.chunks_exact_mut(line) {
    let (f, row) = chunk.split_at_mut(1);
    let filter = PngFilter::try_from(f[0]).map_err(|_| PngError::Malformed)?;
    unfilter_row(filter, prev, row, unit);
    f[0] = PngFilter::None as u8;
    prev = Some(row);
  }
  Ok(())
}

/// Removes the filter byte from the front of each line, packing the rows
/// together at the start of the buffer.
pub(crate) fn strip_filter_bytes(data: &mut Vec<u8>, row_len: usize) {
  let line = row_len + 1;
  let rows = data.len() / line;
  for r in 0..rows {
    data.copy_within(r * line + 1..(r + 1) * line, r * row_len);
  }
  data.truncate(rows * row_len);
}

/// Zeroes the unused low bits at the end of each row.
///
/// When `bits_per_row` isn't a multiple of 8 the last byte of each row is
/// only partly image data, and the encoder may have left anything in the
/// remaining bits.
pub(crate) fn clear_padding_bits(rows: &mut [u8], row_len: usize, bits_per_row: usize) {
  let used = bits_per_row % 8;
  if used == 0 || row_len == 0 {
    return;
  }
  let mask = 0xFF_u8 << (8 - used);
  for row in rows.chunks_exact_mut(row_len) {
    if let Some(last) = row.last_mut() {
      *last &= mask;
    }
  }
}
