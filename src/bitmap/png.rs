//! Turning a decoded PNG into a bitmap.

use alloc::vec::Vec;

use bitfrob::u8_replicate_bits;
use log::debug;
use pixel_formats::r8g8b8a8_Srgb;

use super::{GBitmap, GBitmapFormat, PaletteStore};
use crate::{
  png::{PngColorType, PngDecoder, PngFrame, PngHeader, TransparentKey},
  CompatMode, DecodeError, GColor8, GSize, PlatformConfig,
};

const TRANSPARENT: r8g8b8a8_Srgb = r8g8b8a8_Srgb { r: 0, g: 0, b: 0, a: 0 };

/// The value of pixel `x` in a row packed at `depth` bits per value, highest
/// bits first.
#[inline]
fn packed_value(row: &[u8], x: usize, depth: u8) -> u8 {
  let per_byte = 8 / depth as usize;
  let byte = row.get(x / per_byte).copied().unwrap_or(0);
  let shift = 8 - depth as usize * (x % per_byte + 1);
  (byte >> shift) & (u8::MAX >> (8 - depth))
}

/// Reads pixel `x` of a decoded row as 8-bit RGBA.
fn sample(
  header: &PngHeader, palette: &[r8g8b8a8_Srgb], key: Option<TransparentKey>, row: &[u8],
  x: usize,
) -> r8g8b8a8_Srgb {
  let at = |i: usize| row.get(i).copied().unwrap_or(0);
  match header.color_type {
    PngColorType::Index => {
      let i = packed_value(row, x, header.bit_depth);
      palette.get(i as usize).copied().unwrap_or(TRANSPARENT)
    }
    PngColorType::Y => {
      let v = packed_value(row, x, header.bit_depth);
      if key == Some(TransparentKey::Y(v as u16)) {
        return TRANSPARENT;
      }
      let y = u8_replicate_bits(header.bit_depth as u32, v);
      r8g8b8a8_Srgb { r: y, g: y, b: y, a: 0xFF }
    }
    PngColorType::YA => {
      let y = at(x * 2);
      r8g8b8a8_Srgb { r: y, g: y, b: y, a: at(x * 2 + 1) }
    }
    PngColorType::RGB => {
      let (r, g, b) = (at(x * 3), at(x * 3 + 1), at(x * 3 + 2));
      if key == Some(TransparentKey::RGB([r as u16, g as u16, b as u16])) {
        return TRANSPARENT;
      }
      r8g8b8a8_Srgb { r, g, b, a: 0xFF }
    }
    PngColorType::RGBA => {
      r8g8b8a8_Srgb { r: at(x * 4), g: at(x * 4 + 1), b: at(x * 4 + 2), a: at(x * 4 + 3) }
    }
  }
}

/// If a color is drawn white in a 1-bit image.
///
/// Mostly transparent pixels count as white, the usual background.
#[inline]
fn is_light(c: r8g8b8a8_Srgb) -> bool {
  if c.a < 0x80 {
    return true;
  }
  let luma = (c.r as u32 * 299 + c.g as u32 * 587 + c.b as u32 * 114) / 1000;
  luma >= 0x80
}

impl GBitmap<'_> {
  /// Decodes PNG bytes into a new bitmap.
  ///
  /// Only the first frame of an animated PNG is used.
  ///
  /// * Indexed color at 1, 2, or 4 bits becomes the matching palette format,
  ///   with the palette taken from `PLTE` and alpha from `tRNS`. Missing
  ///   entries are [`GColor8::CLEAR`].
  /// * Greyscale at 1, 2, or 4 bits also becomes a palette format, with each
  ///   entry being the gray level for that value. The `tRNS` key entry is
  ///   transparent.
  /// * Everything else becomes `Format8Bit`, keeping the top 2 bits of each
  ///   channel.
  /// * In `Legacy2` mode the output is always `Format1Bit`.
  pub fn from_png_data(
    bytes: &[u8], platform: &PlatformConfig,
  ) -> Result<GBitmap<'static>, DecodeError> {
    let mut decoder = PngDecoder::new(bytes);
    let header = decoder.header()?;
    let size = GSize { w: i16::try_from(header.width)?, h: i16::try_from(header.height)? };
    decoder.decode_metadata()?;
    let frame = decoder.decode_image()?;
    let palette = decoder.palette();
    let key = decoder.transparent_key();

    let bitmap = if platform.compat == CompatMode::Legacy2 {
      threshold_1bit(&header, palette, key, &frame, size)?
    } else {
      match (header.color_type, GBitmapFormat::palettized_with_bits(header.bit_depth)) {
        (PngColorType::Index, Some(format)) => {
          let colors = palette.iter().copied().map(GColor8::from);
          with_palette(&frame, size, format, colors)?
        }
        (PngColorType::Y, Some(format)) => {
          let levels = (0..format.palette_size() as u8).map(|v| {
            if key == Some(TransparentKey::Y(v as u16)) {
              GColor8::CLEAR
            } else {
              GColor8::from_gray8(u8_replicate_bits(header.bit_depth as u32, v), 0xFF)
            }
          });
          with_palette(&frame, size, format, levels)?
        }
        _ => {
          let mut bitmap = GBitmap::alloc_blank(size, GBitmapFormat::Format8Bit)?;
          let stride = bitmap.row_size_bytes as usize;
          if let Some(data) = bitmap.data_mut() {
            for (out_row, row) in data.chunks_exact_mut(stride).zip(frame.data.chunks(frame.row_stride))
            {
              for (x, out) in out_row.iter_mut().enumerate() {
                *out = GColor8::from(sample(&header, palette, key, row, x)).0;
              }
            }
          }
          bitmap
        }
      }
    };
    debug!("PNG became a {:?} {:?} bitmap", bitmap.format, size);
    Ok(bitmap)
  }
}

/// Copies the packed rows as is, since PNG and the palette formats pack pixels
/// the same way.
fn with_palette(
  frame: &PngFrame, size: GSize, format: GBitmapFormat, colors: impl Iterator<Item = GColor8>,
) -> Result<GBitmap<'static>, DecodeError> {
  let mut bitmap = GBitmap::alloc_blank(size, format)?;
  let stride = bitmap.row_size_bytes as usize;
  if let Some(data) = bitmap.data_mut() {
    for (out_row, row) in data.chunks_exact_mut(stride).zip(frame.data.chunks(frame.row_stride)) {
      let n = out_row.len().min(row.len());
      out_row[..n].copy_from_slice(&row[..n]);
    }
  }
  let mut entries: Vec<GColor8> = Vec::new();
  entries.try_reserve_exact(format.palette_size())?;
  entries.extend(colors.take(format.palette_size()));
  entries.resize(format.palette_size(), GColor8::CLEAR);
  bitmap.palette = PaletteStore::Owned(entries);
  Ok(bitmap)
}

fn threshold_1bit(
  header: &PngHeader, palette: &[r8g8b8a8_Srgb], key: Option<TransparentKey>, frame: &PngFrame,
  size: GSize,
) -> Result<GBitmap<'static>, DecodeError> {
  let mut bitmap = GBitmap::alloc_blank(size, GBitmapFormat::Format1Bit)?;
  let stride = bitmap.row_size_bytes as usize;
  let width = size.w as usize;
  if let Some(data) = bitmap.data_mut() {
    for (out_row, row) in data.chunks_exact_mut(stride).zip(frame.data.chunks(frame.row_stride)) {
      for x in 0..width {
        if is_light(sample(header, palette, key, row, x)) {
          out_row[x / 8] |= 1 << (x % 8);
        }
      }
    }
  }
  Ok(bitmap)
}
