use watchgfx::{
  png::{
    filter_scanline, BlendOp, DisposeOp, PngColorType, PngDecoder, PngDecoderState, PngError,
    PngFilter, TransparentKey,
  },
  GBitmap, GBitmapFormat, GColor8, PlatformConfig, PNG_SIGNATURE,
};

/// The pieces of a test image.
pub struct PngParts<'a> {
  pub width: u32,
  pub height: u32,
  pub bit_depth: u8,
  pub color_type: u8,
  /// Unfiltered rows, packed with no filter bytes.
  pub raw_rows: &'a [u8],
  /// Chunks to put between `IHDR` and `IDAT`.
  pub before_idat: &'a [([u8; 4], Vec<u8>)],
}

const FILTERS: [PngFilter; 5] =
  [PngFilter::None, PngFilter::Sub, PngFilter::Up, PngFilter::Average, PngFilter::Paeth];

/// Appends one chunk. The CRC is left as zero, since it's never checked.
pub fn push_chunk(out: &mut Vec<u8>, tag: [u8; 4], data: &[u8]) {
  out.extend_from_slice(&(data.len() as u32).to_be_bytes());
  out.extend_from_slice(&tag);
  out.extend_from_slice(data);
  out.extend_from_slice(&[0; 4]);
}

fn channels(color_type: u8) -> usize {
  match color_type {
    0 | 3 => 1,
    4 => 2,
    2 => 3,
    6 => 4,
    _ => unreachable!(),
  }
}

fn ihdr(width: u32, height: u32, bit_depth: u8, color_type: u8, interlace: u8) -> Vec<u8> {
  let mut v = Vec::new();
  v.extend_from_slice(&width.to_be_bytes());
  v.extend_from_slice(&height.to_be_bytes());
  v.extend_from_slice(&[bit_depth, color_type, 0, 0, interlace]);
  v
}

/// Filters the rows (cycling through every filter type) and compresses them.
pub fn image_stream(width: u32, bit_depth: u8, color_type: u8, raw: &[u8]) -> Vec<u8> {
  let bits = bit_depth as usize * channels(color_type);
  let stride = (bits * width as usize + 7) / 8;
  let unit = (bits / 8).max(1);
  let mut filtered = Vec::new();
  let mut prev: Option<&[u8]> = None;
  for (i, row) in raw.chunks(stride).enumerate() {
    let filter = FILTERS[i % FILTERS.len()];
    let mut out = vec![0; stride];
    filter_scanline(filter, prev, row, unit, &mut out);
    filtered.push(filter as u8);
    filtered.extend_from_slice(&out);
    prev = Some(row);
  }
  miniz_oxide::deflate::compress_to_vec_zlib(&filtered, 6)
}

pub fn png_bytes(parts: PngParts<'_>) -> Vec<u8> {
  let mut out = Vec::from(PNG_SIGNATURE);
  push_chunk(&mut out, *b"IHDR", &ihdr(parts.width, parts.height, parts.bit_depth, parts.color_type, 0));
  for (tag, data) in parts.before_idat {
    push_chunk(&mut out, *tag, data);
  }
  let stream = image_stream(parts.width, parts.bit_depth, parts.color_type, parts.raw_rows);
  push_chunk(&mut out, *b"IDAT", &stream);
  push_chunk(&mut out, *b"IEND", &[]);
  out
}

fn rgba_rows() -> Vec<u8> {
  (0..3 * 5 * 4).map(|i| (i * 37 % 251) as u8).collect()
}

#[test]
fn test_rgba_round_trip() {
  let raw = rgba_rows();
  let png = png_bytes(PngParts {
    width: 3,
    height: 5,
    bit_depth: 8,
    color_type: 6,
    raw_rows: &raw,
    before_idat: &[(*b"tEXt", b"Comment\0hi".to_vec())],
  });
  let mut decoder = PngDecoder::new(&png);
  assert_eq!(decoder.state(), PngDecoderState::New);
  let header = decoder.header().unwrap();
  assert_eq!((header.width, header.height, header.bit_depth), (3, 5, 8));
  assert_eq!(header.color_type, PngColorType::RGBA);
  assert_eq!(decoder.state(), PngDecoderState::Header);
  decoder.decode_metadata().unwrap();
  assert_eq!(decoder.frames_remaining(), Some(1));
  assert!(decoder.animation().is_none());
  let frame = decoder.decode_image().unwrap();
  assert_eq!(decoder.state(), PngDecoderState::Decoded);
  assert_eq!((frame.x, frame.y, frame.width, frame.height), (0, 0, 3, 5));
  assert_eq!(frame.row_stride, 12);
  assert_eq!(frame.delay_ms, 0);
  assert_eq!(frame.data, raw);
  assert_eq!(decoder.decode_image(), Err(PngError::EndOfStream));
  assert_eq!(decoder.state(), PngDecoderState::Decoded);
  assert!(decoder.last_error().is_none());
}

#[test]
fn test_split_image_data() {
  let raw = rgba_rows();
  let stream = image_stream(3, 8, 6, &raw);
  let mut png = Vec::from(PNG_SIGNATURE);
  push_chunk(&mut png, *b"IHDR", &ihdr(3, 5, 8, 6, 0));
  let third = stream.len() / 3;
  push_chunk(&mut png, *b"IDAT", &stream[..third]);
  push_chunk(&mut png, *b"IDAT", &stream[third..third * 2]);
  push_chunk(&mut png, *b"IDAT", &stream[third * 2..]);
  push_chunk(&mut png, *b"IEND", &[]);
  let frame = PngDecoder::new(&png).decode_image().unwrap();
  assert_eq!(frame.data, raw);
}

#[test]
fn test_image_data_in_tiny_chunks() {
  // a flat image compresses to almost nothing, so the pixels are all out
  // well before the last chunk arrives
  let raw = vec![0x80; 64 * 64];
  let stream = image_stream(64, 8, 0, &raw);
  for size in [1, 2, 3, 5, 8] {
    let mut png = Vec::from(PNG_SIGNATURE);
    push_chunk(&mut png, *b"IHDR", &ihdr(64, 64, 8, 0, 0));
    for piece in stream.chunks(size) {
      push_chunk(&mut png, *b"IDAT", piece);
    }
    push_chunk(&mut png, *b"IEND", &[]);
    let frame = PngDecoder::new(&png).decode_image().unwrap();
    assert_eq!(frame.data, raw, "chunks of {size}");
    let b = GBitmap::from_png_data(&png, &PlatformConfig::default()).unwrap();
    assert_eq!(b.format(), GBitmapFormat::Format8Bit);
    assert_eq!(b.data().len(), 64 * 64);
  }
}

#[test]
fn test_indexed_with_alpha() {
  // 4-bit indexed, 3x2, padding bits are zero
  let raw = [0x01, 0x20, 0x21, 0x00];
  let png = png_bytes(PngParts {
    width: 3,
    height: 2,
    bit_depth: 4,
    color_type: 3,
    raw_rows: &raw,
    before_idat: &[(*b"PLTE", vec![10, 20, 30, 40, 50, 60, 70, 80, 90]), (*b"tRNS", vec![0, 128])],
  });
  let mut decoder = PngDecoder::new(&png);
  decoder.decode_metadata().unwrap();
  let alphas: Vec<u8> = decoder.palette().iter().map(|c| c.a).collect();
  assert_eq!(alphas, [0, 128, 255]);
  assert_eq!(decoder.palette()[2].r, 70);
  let frame = decoder.decode_image().unwrap();
  assert_eq!(frame.row_stride, 2);
  assert_eq!(frame.data, raw);

  let bitmap = GBitmap::from_png_data(&png, &PlatformConfig::default()).unwrap();
  assert_eq!(bitmap.format(), GBitmapFormat::Format4BitPalette);
  let palette = bitmap.palette().unwrap();
  assert_eq!(palette.len(), 16);
  assert_eq!(palette[0], GColor8::CLEAR);
  assert_eq!(palette[1].alpha(), 2);
  assert_eq!(palette[3], GColor8::CLEAR);
}

#[test]
fn test_gray_color_key() {
  let raw = [0x00, 0x80, 0xFF, 0x80];
  let png = png_bytes(PngParts {
    width: 4,
    height: 1,
    bit_depth: 8,
    color_type: 0,
    raw_rows: &raw,
    before_idat: &[(*b"tRNS", vec![0, 0xFF])],
  });
  let mut decoder = PngDecoder::new(&png);
  decoder.decode_metadata().unwrap();
  assert_eq!(decoder.transparent_key(), Some(TransparentKey::Y(0xFF)));
  assert!(decoder.palette().is_empty());

  let bitmap = GBitmap::from_png_data(&png, &PlatformConfig::default()).unwrap();
  assert_eq!(bitmap.format(), GBitmapFormat::Format8Bit);
  assert_eq!(bitmap.data(), &[GColor8::BLACK.0, 0b11_10_10_10, 0, 0b11_10_10_10]);
}

/// Two frames: the default image, then a 1x1 patch at (1,0).
fn two_frame_apng() -> Vec<u8> {
  let full = [1, 2, 3, 4, 5, 6];
  let patch = [9];
  let mut png = Vec::from(PNG_SIGNATURE);
  push_chunk(&mut png, *b"IHDR", &ihdr(3, 2, 8, 0, 0));
  let mut actl = Vec::new();
  actl.extend_from_slice(&2_u32.to_be_bytes());
  actl.extend_from_slice(&0_u32.to_be_bytes());
  push_chunk(&mut png, *b"acTL", &actl);
  push_chunk(&mut png, *b"fcTL", &fctl(0, 3, 2, 0, 0, 1, 10, 0, 0));
  push_chunk(&mut png, *b"IDAT", &image_stream(3, 8, 0, &full));
  push_chunk(&mut png, *b"fcTL", &fctl(1, 1, 1, 1, 0, 50, 0, 1, 1));
  let mut fdat = 2_u32.to_be_bytes().to_vec();
  fdat.extend(image_stream(1, 8, 0, &patch));
  push_chunk(&mut png, *b"fdAT", &fdat);
  push_chunk(&mut png, *b"IEND", &[]);
  png
}

#[allow(clippy::too_many_arguments)]
fn fctl(seq: u32, w: u32, h: u32, x: u32, y: u32, num: u16, den: u16, dispose: u8, blend: u8) -> Vec<u8> {
  let mut v = Vec::new();
  for n in [seq, w, h, x, y] {
    v.extend_from_slice(&n.to_be_bytes());
  }
  v.extend_from_slice(&num.to_be_bytes());
  v.extend_from_slice(&den.to_be_bytes());
  v.extend_from_slice(&[dispose, blend]);
  v
}

#[test]
fn test_apng_frames() {
  let png = two_frame_apng();
  let mut decoder = PngDecoder::new(&png);
  decoder.decode_metadata().unwrap();
  let animation = decoder.animation().unwrap();
  assert_eq!((animation.num_frames, animation.num_plays), (2, 0));
  assert_eq!(decoder.frames_remaining(), Some(2));

  let first = decoder.decode_image().unwrap();
  assert_eq!(first.data, [1, 2, 3, 4, 5, 6]);
  assert_eq!(first.delay_ms, 100);
  assert_eq!(decoder.frames_remaining(), Some(1));

  let second = decoder.decode_image().unwrap();
  assert_eq!((second.x, second.y, second.width, second.height), (1, 0, 1, 1));
  assert_eq!(second.data, [9]);
  assert_eq!(second.row_stride, 1);
  // a zero denominator means hundredths
  assert_eq!(second.delay_ms, 500);
  assert_eq!(second.dispose_op, DisposeOp::Background);
  assert_eq!(second.blend_op, BlendOp::Over);

  assert_eq!(decoder.decode_image(), Err(PngError::EndOfStream));
  assert_ne!(decoder.state(), PngDecoderState::Error);
  assert_eq!(decoder.frames_remaining(), Some(0));
}

#[test]
fn test_frame_outside_canvas() {
  let mut png = Vec::from(PNG_SIGNATURE);
  push_chunk(&mut png, *b"IHDR", &ihdr(3, 2, 8, 0, 0));
  push_chunk(&mut png, *b"acTL", &[0, 0, 0, 2, 0, 0, 0, 0]);
  push_chunk(&mut png, *b"IDAT", &image_stream(3, 8, 0, &[0; 6]));
  push_chunk(&mut png, *b"fcTL", &fctl(0, 2, 2, 2, 0, 1, 1, 0, 0));
  push_chunk(&mut png, *b"IEND", &[]);
  let mut decoder = PngDecoder::new(&png);
  // the default image isn't part of the animation here
  decoder.decode_metadata().unwrap();
  assert_eq!(decoder.frames_remaining(), Some(3));
  decoder.decode_image().unwrap();
  assert_eq!(decoder.decode_image(), Err(PngError::Malformed));
  assert_eq!(decoder.state(), PngDecoderState::Error);
}

#[test]
fn test_header_rejections() {
  let mut interlaced = Vec::from(PNG_SIGNATURE);
  push_chunk(&mut interlaced, *b"IHDR", &ihdr(2, 2, 8, 2, 1));
  let mut decoder = PngDecoder::new(&interlaced);
  assert_eq!(decoder.header(), Err(PngError::UnsupportedInterlacing));
  assert_eq!(decoder.state(), PngDecoderState::Error);

  let mut deep = Vec::from(PNG_SIGNATURE);
  push_chunk(&mut deep, *b"IHDR", &ihdr(2, 2, 16, 2, 0));
  assert_eq!(PngDecoder::new(&deep).header(), Err(PngError::UnsupportedColorFormat));

  let mut bad_depth = Vec::from(PNG_SIGNATURE);
  push_chunk(&mut bad_depth, *b"IHDR", &ihdr(2, 2, 3, 0, 0));
  assert_eq!(PngDecoder::new(&bad_depth).header(), Err(PngError::Malformed));

  assert_eq!(PngDecoder::new(b"GIF89a......").header(), Err(PngError::NotPng));
  assert_eq!(PngDecoder::new(&PNG_SIGNATURE).header(), Err(PngError::Malformed));
}

#[test]
fn test_unknown_critical_chunk() {
  let raw = [0; 4];
  let png = png_bytes(PngParts {
    width: 2,
    height: 2,
    bit_depth: 8,
    color_type: 0,
    raw_rows: &raw,
    before_idat: &[(*b"QQQQ", vec![1, 2, 3])],
  });
  let mut decoder = PngDecoder::new(&png);
  assert_eq!(decoder.decode_metadata(), Err(PngError::UnsupportedChunk));
  let (first, location) = decoder.last_error().unwrap();
  assert_eq!(first, PngError::UnsupportedChunk);
  // the first error sticks
  assert_eq!(decoder.decode_image(), Err(PngError::UnsupportedChunk));
  assert_eq!(decoder.header(), Err(PngError::UnsupportedChunk));
  assert_eq!(decoder.last_error().unwrap().1, location);

  let skipped = png_bytes(PngParts {
    width: 2,
    height: 2,
    bit_depth: 8,
    color_type: 0,
    raw_rows: &raw,
    before_idat: &[(*b"qqQQ", vec![1, 2, 3])],
  });
  assert_eq!(PngDecoder::new(&skipped).decode_image().unwrap().data, raw);
}

#[test]
fn test_indexed_needs_palette() {
  let png = png_bytes(PngParts {
    width: 2,
    height: 1,
    bit_depth: 8,
    color_type: 3,
    raw_rows: &[0, 0],
    before_idat: &[],
  });
  assert_eq!(PngDecoder::new(&png).decode_metadata(), Err(PngError::Malformed));
}

#[test]
fn test_random_bytes_never_panic() {
  for _ in 0..200 {
    let v = super::rand_bytes(256);
    let mut decoder = PngDecoder::new(&v);
    let _ = decoder.decode_image();
    assert_eq!(decoder.state(), PngDecoderState::Error);

    let mut prefixed = Vec::from(PNG_SIGNATURE);
    prefixed.extend_from_slice(&v);
    let _ = PngDecoder::new(&prefixed).decode_image();
    let _ = GBitmap::from_png_data(&prefixed, &PlatformConfig::default());
  }
  // damage a good file in random places
  let good = two_frame_apng();
  for _ in 0..200 {
    let mut bad = good.clone();
    let r = super::rand_bytes(4);
    let at = u16::from_le_bytes([r[0], r[1]]) as usize % bad.len();
    bad[at] ^= r[2] | 1;
    let mut decoder = PngDecoder::new(&bad);
    while decoder.decode_image().is_ok() {}
  }
}
