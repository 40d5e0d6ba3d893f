//! In-memory raster images.
//!
//! A [`GBitmap`] is some pixel storage plus the description needed to read
//! it: a [`GBitmapFormat`], a row stride, a bounding rectangle, and (for the
//! palette formats) a palette.
//!
//! ## Who Frees What
//!
//! The pixel storage and the palette are tracked separately, and each one is
//! either *owned* by the bitmap or *borrowed* from something else:
//!
//! * A bitmap made from a resource owns a [`ResourceBytes`] handle. Dropping
//!   the bitmap releases it, which un-maps flash or frees the heap copy as
//!   appropriate.
//! * A blank bitmap owns a heap buffer (and a palette, for palette formats).
//! * A sub-bitmap borrows both the pixels and the palette of its parent, and
//!   the borrow checker keeps the parent alive for as long as the sub-bitmap
//!   exists. A sub-bitmap never frees anything.
//! * A PBI resource's palette is stored right after its pixel rows, in the
//!   same buffer, so it goes away along with the pixels.

use alloc::{sync::Arc, vec, vec::Vec};

use log::{debug, warn};

use crate::{
  parser_helpers::try_zeroed_vec, sniff::is_png, AppNum, CompatMode, DecodeError, DisplayShape,
  GColor8, GRect, GSize, PlatformConfig, ResourceBytes, ResourceId, ResourceMap, ResourceStore,
};

mod pbi;
pub use pbi::PBI_HEADER_SIZE;
use pbi::*;

mod row_info;
pub use row_info::CircularRow;
use row_info::*;

#[cfg(feature = "png")]
mod png;

/// Pixel formats a bitmap can use.
///
/// The numeric values are the ones stored in a PBI header's format bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum GBitmapFormat {
  /// 1 bit per pixel, black or white.
  ///
  /// Rows are padded to a multiple of 4 bytes, and within each byte the
  /// *lowest* bit is the leftmost pixel.
  Format1Bit = 0,
  /// One [`GColor8`] per pixel.
  Format8Bit = 1,
  /// 1 bit palette index per pixel, highest bit leftmost.
  Format1BitPalette = 2,
  /// 2 bit palette index per pixel, highest bits leftmost.
  Format2BitPalette = 3,
  /// 4 bit palette index per pixel, highest bits leftmost.
  Format4BitPalette = 4,
  /// One [`GColor8`] per pixel, storing only the pixels visible on a round
  /// display.
  Format8BitCircular = 5,
}
impl GBitmapFormat {
  /// Bits used for each pixel.
  #[inline]
  #[must_use]
  pub const fn bits_per_pixel(self) -> u8 {
    match self {
      Self::Format1Bit | Self::Format1BitPalette => 1,
      Self::Format2BitPalette => 2,
      Self::Format4BitPalette => 4,
      Self::Format8Bit | Self::Format8BitCircular => 8,
    }
  }

  /// Number of palette entries, 0 for formats that don't use a palette.
  #[inline]
  #[must_use]
  pub const fn palette_size(self) -> usize {
    match self {
      Self::Format1BitPalette | Self::Format2BitPalette | Self::Format4BitPalette => {
        1 << self.bits_per_pixel()
      }
      _ => 0,
    }
  }

  /// If this is one of the palette formats.
  #[inline]
  #[must_use]
  pub const fn is_palettized(self) -> bool {
    self.palette_size() != 0
  }

  /// The palette format with the given bits per pixel.
  #[inline]
  #[must_use]
  pub const fn palettized_with_bits(bits: u8) -> Option<Self> {
    match bits {
      1 => Some(Self::Format1BitPalette),
      2 => Some(Self::Format2BitPalette),
      4 => Some(Self::Format4BitPalette),
      _ => None,
    }
  }
}
impl TryFrom<u8> for GBitmapFormat {
  type Error = ();
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => Self::Format1Bit,
      1 => Self::Format8Bit,
      2 => Self::Format1BitPalette,
      3 => Self::Format2BitPalette,
      4 => Self::Format4BitPalette,
      5 => Self::Format8BitCircular,
      _ => return Err(()),
    })
  }
}

/// The minimum bytes per row for a bitmap of the given width and format.
///
/// * `Format1Bit` rows are padded to whole 32-bit words.
/// * The palette formats are padded to whole bytes, wasting up to 7 bits.
/// * `Format8Bit` has no padding.
/// * `Format8BitCircular` has no fixed stride, so this is 0.
#[inline]
#[must_use]
pub const fn row_stride(width: u16, format: GBitmapFormat) -> u16 {
  let w = width as u32;
  let stride = match format {
    GBitmapFormat::Format1Bit => ((w + 31) / 32) * 4,
    GBitmapFormat::Format8Bit => w,
    GBitmapFormat::Format8BitCircular => 0,
    _ => (w * format.bits_per_pixel() as u32 + 7) / 8,
  };
  stride as u16
}

/// Where a bitmap's pixels are stored.
#[derive(Debug)]
pub enum PixelSource<'a> {
  /// Resource bytes, mapped from flash or loaded to the heap.
  Resource(ResourceBytes),
  /// A heap buffer owned by the bitmap.
  Owned(Vec<u8>),
  /// Read-only pixels owned by someone else.
  Borrowed(&'a [u8]),
  /// Writable pixels owned by someone else.
  BorrowedMut(&'a mut [u8]),
}
impl PixelSource<'_> {
  #[inline]
  fn as_slice(&self) -> &[u8] {
    match self {
      Self::Resource(r) => r.as_slice(),
      Self::Owned(v) => v,
      Self::Borrowed(s) => s,
      Self::BorrowedMut(s) => s,
    }
  }

  #[inline]
  fn as_mut_slice(&mut self) -> Option<&mut [u8]> {
    match self {
      Self::Resource(r) => r.as_mut_slice(),
      Self::Owned(v) => Some(v),
      Self::Borrowed(_) => None,
      Self::BorrowedMut(s) => Some(s),
    }
  }

  /// If dropping this frees (or un-maps) the pixels.
  #[inline]
  #[must_use]
  pub fn is_owned(&self) -> bool {
    matches!(self, Self::Resource(_) | Self::Owned(_))
  }

  /// If the pixels live in the heap, as opposed to flash or a borrow.
  #[inline]
  #[must_use]
  pub fn is_heap_allocated(&self) -> bool {
    match self {
      Self::Resource(r) => !r.is_mapped(),
      Self::Owned(_) => true,
      _ => false,
    }
  }
}

/// A palette to give to a bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Palette<'a> {
  /// The bitmap owns the palette and frees it when dropped.
  Owned(Vec<GColor8>),
  /// The palette belongs to someone else.
  Borrowed(&'a [GColor8]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PaletteStore<'a> {
  None,
  Owned(Vec<GColor8>),
  Borrowed(&'a [GColor8]),
  /// Stored inside of the pixel buffer, starting at this byte offset.
  Trailing(usize),
}
impl<'a> From<Palette<'a>> for PaletteStore<'a> {
  #[inline]
  fn from(p: Palette<'a>) -> Self {
    match p {
      Palette::Owned(v) => Self::Owned(v),
      Palette::Borrowed(s) => Self::Borrowed(s),
    }
  }
}

/// The storage of one row of a bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GBitmapDataRowInfo<'d> {
  /// Bytes of the row. The first byte holds column `min_x`.
  ///
  /// For the fixed stride formats this is the whole row (so it starts at
  /// column 0), for the circular format it's only the stored span.
  pub data: &'d [u8],
  /// First usable column.
  pub min_x: i16,
  /// Last usable column.
  pub max_x: i16,
}

/// A raster image.
#[derive(Debug)]
pub struct GBitmap<'a> {
  pixels: PixelSource<'a>,
  palette: PaletteStore<'a>,
  row_size_bytes: u16,
  format: GBitmapFormat,
  version: u8,
  bounds: GRect,
  circular_rows: Option<Arc<[CircularRow]>>,
}

impl<'a> GBitmap<'a> {
  /// Checks that this platform can hold a bitmap of the given size and format.
  fn check_platform_support(
    size: GSize, format: GBitmapFormat, platform: &PlatformConfig,
  ) -> Result<(), DecodeError> {
    if size.w < 0 || size.h < 0 {
      return Err(DecodeError::BadParameter);
    }
    if platform.compat == CompatMode::Legacy2 && format != GBitmapFormat::Format1Bit {
      warn!("legacy apps can only make 1-bit bitmaps, not {format:?}");
      return Err(DecodeError::BadParameter);
    }
    if format == GBitmapFormat::Format8BitCircular {
      if platform.display_shape != DisplayShape::Round {
        return Err(DecodeError::BadParameter);
      }
      if platform.circular_requires_display_size && size != platform.display_size {
        warn!("circular bitmaps must be {:?}, not {size:?}", platform.display_size);
        return Err(DecodeError::BadParameter);
      }
    }
    Ok(())
  }

  /// Allocates zeroed storage, skipping the platform checks.
  fn alloc_blank(size: GSize, format: GBitmapFormat) -> Result<GBitmap<'static>, DecodeError> {
    let (row_size_bytes, circular, data_len) = if format == GBitmapFormat::Format8BitCircular {
      let rows = circular_rows(size)?;
      let len = circular_data_size(&rows);
      (0, Some(rows), len)
    } else {
      let stride = row_stride(size.w.max(0) as u16, format);
      (stride, None, stride as usize * size.h.max(0) as usize)
    };
    Ok(GBitmap {
      pixels: PixelSource::Owned(try_zeroed_vec(data_len)?),
      palette: PaletteStore::None,
      row_size_bytes,
      format,
      version: 1,
      bounds: GRect { origin: Default::default(), size },
      circular_rows: circular,
    })
  }

  /// Makes a new, zero-filled bitmap.
  ///
  /// Palette formats also get an owned palette with every entry set to
  /// [`GColor8::CLEAR`].
  ///
  /// ## Failure
  /// * `BadParameter` if the platform doesn't support this size and format.
  ///   In `Legacy2` mode that's anything but `Format1Bit`, and the circular
  ///   format needs a round display (possibly of exactly this size).
  /// * `OutOfMemory` if the allocation fails.
  pub fn create_blank(
    size: GSize, format: GBitmapFormat, platform: &PlatformConfig,
  ) -> Result<GBitmap<'static>, DecodeError> {
    Self::check_platform_support(size, format, platform)?;
    let mut bitmap = Self::alloc_blank(size, format)?;
    if format.is_palettized() {
      let mut palette = Vec::new();
      palette.try_reserve_exact(format.palette_size())?;
      palette.resize(format.palette_size(), GColor8::CLEAR);
      bitmap.palette = PaletteStore::Owned(palette);
    }
    Ok(bitmap)
  }

  /// Makes a new, zero-filled bitmap of a palette format using the given
  /// palette.
  ///
  /// The palette must have at least [`palette_size`] entries.
  ///
  /// [`palette_size`]: GBitmapFormat::palette_size
  pub fn create_blank_with_palette(
    size: GSize, format: GBitmapFormat, palette: Palette<'a>, platform: &PlatformConfig,
  ) -> Result<GBitmap<'a>, DecodeError> {
    if !format.is_palettized() {
      return Err(DecodeError::BadParameter);
    }
    let entries = match &palette {
      Palette::Owned(v) => v.len(),
      Palette::Borrowed(s) => s.len(),
    };
    if entries < format.palette_size() {
      return Err(DecodeError::BadParameter);
    }
    Self::check_platform_support(size, format, platform)?;
    let mut bitmap: GBitmap<'a> = Self::alloc_blank(size, format)?;
    bitmap.palette = palette.into();
    Ok(bitmap)
  }

  /// Views header-prefixed PBI data in place.
  ///
  /// Nothing is copied: the bitmap borrows `data` for pixels and palette.
  /// Extra bytes after the palette are allowed.
  ///
  /// ## Failure
  /// * `Malformed` if the header's stride can't hold its width, or `data` is
  ///   too short for what the header declares.
  /// * `UnsupportedFeature` if the format isn't allowed in legacy mode.
  pub fn with_data(data: &'a [u8], platform: &PlatformConfig) -> Result<Self, DecodeError> {
    let layout = parse_pbi_header(data, platform)?;
    if data.len() < layout.total_len() {
      warn!("PBI data is {} bytes but the header needs {}", data.len(), layout.total_len());
      return Err(DecodeError::Malformed);
    }
    Self::from_layout(PixelSource::Borrowed(&data[PBI_HEADER_SIZE..]), layout)
  }

  fn from_layout(pixels: PixelSource<'a>, layout: PbiLayout) -> Result<Self, DecodeError> {
    let circular_rows = if layout.format == GBitmapFormat::Format8BitCircular {
      Some(circular_rows(layout.size)?)
    } else {
      None
    };
    Ok(Self {
      pixels,
      palette: if layout.palette_len > 0 {
        PaletteStore::Trailing(layout.pixel_len)
      } else {
        PaletteStore::None
      },
      row_size_bytes: layout.row_size_bytes,
      format: layout.format,
      version: layout.version,
      bounds: GRect { origin: Default::default(), size: layout.size },
      circular_rows,
    })
  }

  /// A view of part of this bitmap.
  ///
  /// The sub-bitmap shares this bitmap's pixels and palette. Its bounds are
  /// `rect` clipped to this bitmap's bounds, so they can't reach outside of
  /// the parent even if `rect` does.
  #[must_use]
  pub fn create_as_sub_bitmap(&self, rect: GRect) -> GBitmap<'_> {
    GBitmap {
      pixels: PixelSource::Borrowed(self.pixels.as_slice()),
      palette: self.borrowed_palette_store(),
      row_size_bytes: self.row_size_bytes,
      format: self.format,
      version: self.version,
      bounds: rect.clip(self.bounds),
      circular_rows: self.circular_rows.clone(),
    }
  }

  /// A writable view of part of this bitmap.
  ///
  /// This is `None` when the pixels aren't writable (such as when they're in
  /// flash).
  pub fn create_as_sub_bitmap_mut(&mut self, rect: GRect) -> Option<GBitmap<'_>> {
    let bounds = rect.clip(self.bounds);
    let Self { pixels, palette, row_size_bytes, format, version, bounds: _, circular_rows } = self;
    let palette = match palette {
      PaletteStore::None => PaletteStore::None,
      PaletteStore::Owned(v) => PaletteStore::Borrowed(v.as_slice()),
      PaletteStore::Borrowed(s) => PaletteStore::Borrowed(*s),
      PaletteStore::Trailing(offset) => PaletteStore::Trailing(*offset),
    };
    Some(GBitmap {
      pixels: PixelSource::BorrowedMut(pixels.as_mut_slice()?),
      palette,
      row_size_bytes: *row_size_bytes,
      format: *format,
      version: *version,
      bounds,
      circular_rows: circular_rows.clone(),
    })
  }

  fn borrowed_palette_store(&self) -> PaletteStore<'_> {
    match &self.palette {
      PaletteStore::None => PaletteStore::None,
      PaletteStore::Owned(v) => PaletteStore::Borrowed(v),
      PaletteStore::Borrowed(s) => PaletteStore::Borrowed(s),
      PaletteStore::Trailing(offset) => PaletteStore::Trailing(*offset),
    }
  }

  /// Loads a bitmap resource, either PBI or PNG.
  ///
  /// A PBI is used in place: when the resource is mapped from flash the
  /// bitmap just views it, otherwise the header is absorbed by moving the
  /// pixels to the front of the heap copy. A PNG is always decoded to a new
  /// heap buffer, and the resource bytes are released right after.
  ///
  /// ## Failure
  /// * `NotFound` if the resource doesn't exist.
  /// * `Malformed` if a PBI's header plus pixels plus palette isn't exactly
  ///   the size of the resource.
  /// * Any error from decoding the PNG.
  ///
  /// The resource is always released when this fails.
  pub fn create_with_resource<S: ResourceStore>(
    map: &ResourceMap<S>, app: AppNum, id: ResourceId, platform: &PlatformConfig,
  ) -> Result<GBitmap<'static>, DecodeError> {
    let mut bytes = map.load(app, id, true)?;
    if is_png(bytes.as_slice()) {
      let result = Self::from_png_data(bytes.as_slice(), platform);
      map.release(bytes);
      return result;
    }
    let layout = parse_pbi_header(bytes.as_slice(), platform)?;
    if layout.total_len() != bytes.len() {
      warn!(
        "resource {app}:{id} is {} bytes, but its PBI header describes {}",
        bytes.len(),
        layout.total_len()
      );
      map.release(bytes);
      return Err(DecodeError::Malformed);
    }
    bytes.advance(PBI_HEADER_SIZE);
    if let ResourceBytes::Heap(heap) = &mut bytes {
      heap.align_start(4);
    }
    debug!("bitmap {app}:{id} is {:?} {:?}", layout.format, layout.size);
    GBitmap::from_layout(PixelSource::Resource(bytes), layout)
  }

  /// Stand-in for the PNG decoder when it's not compiled in.
  #[cfg(not(feature = "png"))]
  pub fn from_png_data(
    _bytes: &[u8], _platform: &PlatformConfig,
  ) -> Result<GBitmap<'static>, DecodeError> {
    Err(DecodeError::UnsupportedFeature)
  }

  /// Converts a `Format1Bit` bitmap into `Format1BitPalette`.
  ///
  /// The new bitmap covers everything from `(0,0)` out to the far corner of
  /// the source's bounds, keeps the source's bounds, and gets the palette
  /// `[BLACK, WHITE]`. Each byte is bit-reversed along the way, because the
  /// 1-bit format stores its leftmost pixel in the lowest bit while the
  /// palette formats use the highest bit.
  pub fn create_palettized_from_1bit(&self) -> Result<GBitmap<'static>, DecodeError> {
    if self.format != GBitmapFormat::Format1Bit {
      return Err(DecodeError::BadParameter);
    }
    let full = self.bounds.union(GRect::default());
    let size = GSize { w: i16::try_from(full.max_x())?, h: i16::try_from(full.max_y())? };
    let mut out = Self::alloc_blank(size, GBitmapFormat::Format1BitPalette)?;
    let dst_stride = out.row_size_bytes as usize;
    let src_stride = self.row_size_bytes as usize;
    let src = self.pixels.as_slice();
    // zero width means there are no pixels to copy
    if dst_stride == 0 || src_stride == 0 {
      debug!("nothing to copy into the {size:?} palette bitmap");
    } else if let PixelSource::Owned(dst) = &mut out.pixels {
      for (dst_row, src_row) in dst.chunks_exact_mut(dst_stride).zip(src.chunks(src_stride)) {
        dst_row.iter_mut().zip(src_row).for_each(|(d, s)| *d = s.reverse_bits());
      }
    }
    out.palette = PaletteStore::Owned(vec![GColor8::BLACK, GColor8::WHITE]);
    out.bounds = self.bounds;
    Ok(out)
  }

  /// The format of the pixels.
  #[inline]
  #[must_use]
  pub fn format(&self) -> GBitmapFormat {
    self.format
  }

  /// Bytes per row of storage. Always 0 for the circular format.
  #[inline]
  #[must_use]
  pub fn bytes_per_row(&self) -> u16 {
    self.row_size_bytes
  }

  /// Version number from the PBI header (1 for bitmaps made in memory).
  #[inline]
  #[must_use]
  pub fn version(&self) -> u8 {
    self.version
  }

  /// The area of the storage this bitmap covers.
  #[inline]
  #[must_use]
  pub fn bounds(&self) -> GRect {
    self.bounds
  }

  /// Size of the area the storage can hold.
  fn storage_size(&self) -> GSize {
    if let Some(rows) = &self.circular_rows {
      let w = rows.iter().map(|r| r.max_x as i32 + 1).max().unwrap_or(0);
      return GSize { w: w as i16, h: rows.len() as i16 };
    }
    let bpp = self.format.bits_per_pixel() as usize;
    let w = (self.row_size_bytes as usize * 8 / bpp).min(i16::MAX as usize);
    let h = match self.row_size_bytes as usize {
      0 => 0,
      stride => (self.pixels.as_slice().len() / stride).min(i16::MAX as usize),
    };
    GSize { w: w as i16, h: h as i16 }
  }

  /// Changes the bounds. Fails (and changes nothing) if the new bounds would
  /// reach outside of the storage.
  pub fn set_bounds(&mut self, bounds: GRect) -> Result<(), DecodeError> {
    let storage = GRect { origin: Default::default(), size: self.storage_size() };
    if bounds.size.w < 0 || bounds.size.h < 0 || !storage.contains_rect(&bounds) {
      return Err(DecodeError::BadParameter);
    }
    self.bounds = bounds;
    Ok(())
  }

  /// All of the pixel storage (not counting a trailing palette).
  #[inline]
  #[must_use]
  pub fn data(&self) -> &[u8] {
    let all = self.pixels.as_slice();
    match self.palette {
      PaletteStore::Trailing(offset) => &all[..offset.min(all.len())],
      _ => all,
    }
  }

  /// Writable pixel storage, if the storage is writable.
  #[inline]
  #[must_use]
  pub fn data_mut(&mut self) -> Option<&mut [u8]> {
    let limit = match self.palette {
      PaletteStore::Trailing(offset) => offset,
      _ => usize::MAX,
    };
    self.pixels.as_mut_slice().map(|all| {
      let end = limit.min(all.len());
      &mut all[..end]
    })
  }

  /// Replaces the pixel storage.
  ///
  /// The bounds are kept, so the new storage must be able to hold them. A
  /// palette that lived inside of the old storage is dropped along with it.
  pub fn set_data(
    &mut self, pixels: PixelSource<'a>, format: GBitmapFormat, row_size_bytes: u16,
  ) -> Result<(), DecodeError> {
    let circular = if format == GBitmapFormat::Format8BitCircular {
      Some(circular_rows(self.bounds.size)?)
    } else {
      let min = row_stride(self.bounds.max_x().clamp(0, u16::MAX as i32) as u16, format);
      if row_size_bytes < min {
        return Err(DecodeError::BadParameter);
      }
      None
    };
    let needed = match &circular {
      Some(rows) => circular_data_size(rows),
      None => row_size_bytes as usize * self.bounds.max_y().max(0) as usize,
    };
    if pixels.as_slice().len() < needed {
      return Err(DecodeError::BadParameter);
    }
    if matches!(self.palette, PaletteStore::Trailing(_)) {
      self.palette = PaletteStore::None;
    }
    self.pixels = pixels;
    self.format = format;
    self.row_size_bytes = if circular.is_some() { 0 } else { row_size_bytes };
    self.circular_rows = circular;
    Ok(())
  }

  /// The palette, for palette formats that have one.
  #[must_use]
  pub fn palette(&self) -> Option<&[GColor8]> {
    match &self.palette {
      PaletteStore::None => None,
      PaletteStore::Owned(v) => Some(v),
      PaletteStore::Borrowed(s) => Some(s),
      PaletteStore::Trailing(offset) => {
        let all = self.pixels.as_slice();
        let bytes = all.get(*offset..offset.checked_add(self.format.palette_size())?)?;
        Some(bytemuck::cast_slice(bytes))
      }
    }
  }

  /// Writable palette, when the palette is writable.
  #[must_use]
  pub fn palette_mut(&mut self) -> Option<&mut [GColor8]> {
    let palette_size = self.format.palette_size();
    match &mut self.palette {
      PaletteStore::Owned(v) => Some(v),
      PaletteStore::Trailing(offset) => {
        let offset = *offset;
        let all = self.pixels.as_mut_slice()?;
        let bytes = all.get_mut(offset..offset.checked_add(palette_size)?)?;
        Some(bytemuck::cast_slice_mut(bytes))
      }
      _ => None,
    }
  }

  /// Replaces the palette. The old one is freed if it was owned.
  pub fn set_palette(&mut self, palette: Palette<'a>) {
    self.palette = palette.into();
  }

  /// If dropping this bitmap frees (or un-maps) its pixels.
  #[inline]
  #[must_use]
  pub fn owns_pixels(&self) -> bool {
    self.pixels.is_owned()
  }

  /// If dropping this bitmap frees its palette.
  #[inline]
  #[must_use]
  pub fn owns_palette(&self) -> bool {
    matches!(self.palette, PaletteStore::Owned(_))
  }

  /// If the pixels are a view of read-only flash.
  #[inline]
  #[must_use]
  pub fn is_mapped(&self) -> bool {
    matches!(&self.pixels, PixelSource::Resource(r) if r.is_mapped())
  }

  /// The PBI style info flags for this bitmap.
  #[must_use]
  pub fn info_flags(&self) -> u16 {
    let mut flags = (self.format as u16 & INFO_FORMAT_MASK) << INFO_FORMAT_SHIFT;
    flags |= (self.version as u16 & 0xF) << INFO_VERSION_SHIFT;
    if self.pixels.is_heap_allocated() {
      flags |= INFO_HEAP_BIT;
    }
    if self.owns_palette() {
      flags |= INFO_PALETTE_HEAP_BIT;
    }
    flags
  }

  /// Storage details of row `y`, in storage coordinates.
  ///
  /// For fixed stride formats every column from 0 to the right edge of the
  /// bounds is usable. For the circular format the usable span is whatever
  /// the display circle covers on that row.
  #[must_use]
  pub fn get_data_row_info(&self, y: i16) -> Option<GBitmapDataRowInfo<'_>> {
    let y = usize::try_from(y).ok()?;
    let data = self.data();
    if let Some(rows) = &self.circular_rows {
      let row = rows.get(y)?;
      let start = row.offset as usize;
      return Some(GBitmapDataRowInfo {
        data: data.get(start..start + row.span())?,
        min_x: row.min_x,
        max_x: row.max_x,
      });
    }
    let stride = self.row_size_bytes as usize;
    let start = y.checked_mul(stride)?;
    Some(GBitmapDataRowInfo {
      data: data.get(start..start + stride)?,
      min_x: 0,
      max_x: (self.bounds.max_x() - 1).clamp(-1, i16::MAX as i32) as i16,
    })
  }
}
