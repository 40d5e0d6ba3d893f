use watchgfx::{
  row_stride, DecodeError, GBitmap, GBitmapFormat, GColor8, GRect, GSize, PlatformConfig,
  ResourceMap,
};

use crate::TestStore;

/// Builds PBI resource bytes.
fn pbi(format: GBitmapFormat, row_size: u16, w: u16, h: u16, palette: &[u8]) -> Vec<u8> {
  let flags = ((format as u16) << 1) | (1 << 12);
  let mut v = Vec::new();
  v.extend_from_slice(&row_size.to_le_bytes());
  v.extend_from_slice(&flags.to_le_bytes());
  v.extend_from_slice(&[0; 4]);
  v.extend_from_slice(&w.to_le_bytes());
  v.extend_from_slice(&h.to_le_bytes());
  v.extend((0..row_size as usize * h as usize).map(|i| i as u8));
  v.extend_from_slice(palette);
  v
}

#[test]
fn test_pbi_resource_heap_and_mapped() {
  let bytes = pbi(GBitmapFormat::Format2BitPalette, 2, 5, 3, &[0xC0, 0xD5, 0xEA, 0xFF]);
  let store = TestStore::default().with(1, bytes.clone(), false).with(2, bytes, true);
  let map = ResourceMap::new(store);
  let platform = PlatformConfig::default();

  let heap = GBitmap::create_with_resource(&map, 0, 1, &platform).unwrap();
  assert!(!heap.is_mapped());
  assert!(heap.owns_pixels());
  assert_eq!(heap.format(), GBitmapFormat::Format2BitPalette);
  assert_eq!(heap.bounds(), GRect::new(0, 0, 5, 3));
  assert_eq!(heap.data(), &[0, 1, 2, 3, 4, 5]);
  assert_eq!(heap.palette().unwrap(), &[GColor8(0xC0), GColor8(0xD5), GColor8(0xEA), GColor8::WHITE]);

  let mapped = GBitmap::create_with_resource(&map, 0, 2, &platform).unwrap();
  assert!(mapped.is_mapped());
  assert_eq!(map.mapped_refcount(0, 2), 1);
  assert_eq!(mapped.data(), heap.data());
  assert_eq!(mapped.palette(), heap.palette());
  let sub = mapped.create_as_sub_bitmap(GRect::new(1, 1, 10, 10));
  assert_eq!(sub.bounds(), GRect::new(1, 1, 4, 2));
  drop(sub);
  drop(mapped);
  assert_eq!(map.mapped_refcount(0, 2), 0);
}

#[test]
fn test_pbi_size_mismatch_fails_and_releases() {
  let mut long = pbi(GBitmapFormat::Format1Bit, 4, 29, 5, &[]);
  long.push(0);
  let mut short = pbi(GBitmapFormat::Format8Bit, 4, 4, 4, &[]);
  short.pop();
  let palette_missing = pbi(GBitmapFormat::Format1BitPalette, 1, 8, 2, &[0xC0]);
  let store = TestStore::default()
    .with(1, long, true)
    .with(2, short, true)
    .with(3, palette_missing, false);
  let map = ResourceMap::new(store);
  let platform = PlatformConfig::default();
  for id in 1..=3 {
    assert_eq!(
      GBitmap::create_with_resource(&map, 0, id, &platform).unwrap_err(),
      DecodeError::Malformed,
      "resource {id}"
    );
    assert_eq!(map.mapped_refcount(0, id), 0);
  }
  assert_eq!(
    GBitmap::create_with_resource(&map, 0, 99, &platform).unwrap_err(),
    DecodeError::NotFound
  );
}

#[test]
fn test_circular_pbi_resource() {
  let platform = PlatformConfig::round(40);
  let size = GSize::new(40, 40);
  let blank = GBitmap::create_blank(size, GBitmapFormat::Format8BitCircular, &platform).unwrap();
  let pixel_len = blank.data().len();
  assert!(pixel_len < 40 * 40);
  let mut bytes = pbi(GBitmapFormat::Format8BitCircular, 0, 40, 40, &[]);
  bytes.extend((0..pixel_len).map(|i| i as u8));
  let mut long = bytes.clone();
  long.push(0);
  let store =
    TestStore::default().with(1, bytes.clone(), true).with(2, bytes, false).with(3, long, true);
  let map = ResourceMap::new(store);

  for id in [1, 2] {
    let b = GBitmap::create_with_resource(&map, 0, id, &platform).unwrap();
    assert_eq!(b.is_mapped(), id == 1);
    assert_eq!(b.format(), GBitmapFormat::Format8BitCircular);
    assert_eq!(b.bounds(), GRect::new(0, 0, 40, 40));
    assert_eq!(b.bytes_per_row(), 0);
    assert_eq!(b.data().len(), pixel_len);
    let middle = b.get_data_row_info(20).unwrap();
    assert_eq!((middle.min_x, middle.max_x), (0, 39));
    let top = b.get_data_row_info(0).unwrap();
    assert_eq!(top.data[0], 0);
    assert!(b.get_data_row_info(40).is_none());
  }
  assert_eq!(map.mapped_refcount(0, 1), 0);
  assert_eq!(
    GBitmap::create_with_resource(&map, 0, 3, &platform).unwrap_err(),
    DecodeError::Malformed
  );
  assert_eq!(map.mapped_refcount(0, 3), 0);
}

#[test]
fn test_bad_stride_is_rejected() {
  // 29 pixels can't fit in 3 bytes
  let bytes = pbi(GBitmapFormat::Format1Bit, 3, 29, 1, &[]);
  assert_eq!(
    GBitmap::with_data(&bytes, &PlatformConfig::default()).unwrap_err(),
    DecodeError::Malformed
  );
}

#[test]
fn test_legacy_rejects_color_pbi() {
  let bytes = pbi(GBitmapFormat::Format8Bit, 2, 2, 2, &[]);
  let map = ResourceMap::new(TestStore::default().with(1, bytes, true));
  assert_eq!(
    GBitmap::create_with_resource(&map, 0, 1, &PlatformConfig::legacy2()).unwrap_err(),
    DecodeError::UnsupportedFeature
  );
  assert_eq!(map.mapped_refcount(0, 1), 0);
}

#[test]
fn test_29x5_palettized_from_1bit() {
  let bytes = pbi(GBitmapFormat::Format1Bit, 4, 29, 5, &[]);
  let map = ResourceMap::new(TestStore::default().with(1, bytes, false));
  let src = GBitmap::create_with_resource(&map, 0, 1, &PlatformConfig::default()).unwrap();
  assert_eq!(src.bounds(), GRect::new(0, 0, 29, 5));
  assert_eq!(src.bytes_per_row(), 4);
  assert_eq!(row_stride(29, GBitmapFormat::Format1Bit), 4);
  let pal = src.create_palettized_from_1bit().unwrap();
  assert_eq!(pal.palette().unwrap(), &[GColor8::BLACK, GColor8::WHITE]);
  assert_eq!(pal.bounds(), GRect::new(0, 0, 29, 5));
  for (row, src_row) in pal.data().chunks(pal.bytes_per_row() as usize).zip(src.data().chunks(4)) {
    for (p, s) in row.iter().zip(src_row) {
      assert_eq!(*p, s.reverse_bits());
    }
  }
}

#[test]
fn test_blank_sizes_match_stride() {
  let platform = PlatformConfig::rect(200, 228);
  for format in [
    GBitmapFormat::Format1Bit,
    GBitmapFormat::Format8Bit,
    GBitmapFormat::Format1BitPalette,
    GBitmapFormat::Format2BitPalette,
    GBitmapFormat::Format4BitPalette,
  ] {
    for w in [1_i16, 3, 8, 9, 31, 32, 33, 200] {
      let b = GBitmap::create_blank(GSize::new(w, 3), format, &platform).unwrap();
      assert_eq!(b.data().len(), row_stride(w as u16, format) as usize * 3, "{format:?} {w}");
    }
  }
}

#[test]
fn test_random_pbi_data_never_panics() {
  let platform = PlatformConfig::default();
  for _ in 0..200 {
    let v = crate::rand_bytes(64);
    if let Ok(b) = GBitmap::with_data(&v, &platform) {
      let _ = b.palette();
      let _ = b.get_data_row_info(0);
      let _ = b.create_as_sub_bitmap(GRect::new(-3, -3, 100, 100));
    }
  }
}

#[cfg(feature = "png")]
#[test]
fn test_png_resource_becomes_bitmap() {
  use crate::png::{png_bytes, PngParts};

  // 2-bit indexed, 5x2
  let raw = [0b00_01_10_11, 0b00_000000, 0b11_11_11_11, 0b01_000000];
  let png = png_bytes(PngParts {
    width: 5,
    height: 2,
    bit_depth: 2,
    color_type: 3,
    raw_rows: &raw,
    before_idat: &[
      (*b"PLTE", vec![0, 0, 0, 255, 255, 255, 255, 0, 0, 0, 0, 255]),
      (*b"tRNS", vec![0]),
    ],
  });
  let map = ResourceMap::new(TestStore::default().with(7, png.clone(), true));
  let b = GBitmap::create_with_resource(&map, 0, 7, &PlatformConfig::default()).unwrap();
  assert_eq!(map.mapped_refcount(0, 7), 0);
  assert_eq!(b.format(), GBitmapFormat::Format2BitPalette);
  assert_eq!(b.bounds(), GRect::new(0, 0, 5, 2));
  assert_eq!(b.data(), &raw);
  assert_eq!(b.palette().unwrap(), &[GColor8::CLEAR, GColor8::WHITE, GColor8::RED, GColor8::BLUE]);

  let legacy = GBitmap::from_png_data(&png, &PlatformConfig::legacy2()).unwrap();
  assert_eq!(legacy.format(), GBitmapFormat::Format1Bit);
  // clear and white become white, red and blue are dark
  assert_eq!(legacy.data()[0], 0b0001_0011);
  assert_eq!(legacy.data()[4], 0b0001_0000);
}

#[cfg(feature = "png")]
#[test]
fn test_rgba_png_becomes_8bit() {
  use crate::png::{png_bytes, PngParts};

  let raw = [255, 0, 0, 255, 0, 0, 255, 128, 10, 10, 10, 0];
  let png = png_bytes(PngParts {
    width: 3,
    height: 1,
    bit_depth: 8,
    color_type: 6,
    raw_rows: &raw,
    before_idat: &[],
  });
  let b = GBitmap::from_png_data(&png, &PlatformConfig::default()).unwrap();
  assert_eq!(b.format(), GBitmapFormat::Format8Bit);
  assert_eq!(b.data(), &[GColor8::RED.0, 0b10_00_00_11, 0]);
}

#[cfg(feature = "png")]
#[test]
fn test_png_too_wide_is_rejected_before_decoding() {
  use crate::png::{png_bytes, PngParts};

  // the unknown critical chunk would stop a decode, so reaching it would
  // give a different error
  let raw = vec![0; 40_000 / 8];
  let png = png_bytes(PngParts {
    width: 40_000,
    height: 1,
    bit_depth: 1,
    color_type: 0,
    raw_rows: &raw,
    before_idat: &[(*b"QQQQ", vec![0])],
  });
  assert_eq!(
    GBitmap::from_png_data(&png, &PlatformConfig::default()).unwrap_err(),
    DecodeError::Malformed
  );
}
