use alloc::vec::Vec;
use core::panic::Location;

use log::{debug, trace, warn};
use pixel_formats::r8g8b8a8_Srgb;

use super::*;
use crate::{inflate::inflate_zlib_exact, parser_helpers::try_zeroed_vec, sniff::is_png, Tag};

/// Where a [`PngDecoder`] is in its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PngDecoderState {
  /// Nothing has been parsed yet.
  New,
  /// `IHDR` has been read.
  Header,
  /// Everything before the first image data has been read.
  Loaded,
  /// At least one frame has been decoded.
  Decoded,
  /// Something went wrong. Nothing more can be decoded.
  Error,
}

/// The color key from a `tRNS` chunk in a non-indexed image.
///
/// Pixels exactly matching the key are fully transparent. Values are at the
/// image's bit depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum TransparentKey {
  Y(u16),
  RGB([u16; 3]),
}

/// One decoded frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PngFrame {
  /// Unfiltered rows at the image's bit depth, with no filter bytes.
  ///
  /// Rows are packed at `row_stride` bytes each, and unused bits at the end
  /// of a row are zero.
  pub data: Vec<u8>,
  /// Bytes per row of `data`.
  pub row_stride: usize,
  /// Left edge of the frame on the canvas.
  pub x: u32,
  /// Top edge of the frame on the canvas.
  pub y: u32,
  /// Width of the frame, which may be less than the canvas.
  pub width: u32,
  /// Height of the frame, which may be less than the canvas.
  pub height: u32,
  /// How long to show this frame (0 for a still image).
  pub delay_ms: u32,
  #[allow(missing_docs)]
  pub dispose_op: DisposeOp,
  #[allow(missing_docs)]
  pub blend_op: BlendOp,
}

/// A step by step PNG and APNG decoder.
///
/// The first error is kept, along with the place in this module that raised
/// it, and every later call gives that error back.
#[derive(Debug, Clone)]
pub struct PngDecoder<'b> {
  rest: &'b [u8],
  state: PngDecoderState,
  header: Option<PngHeader>,
  palette: Vec<r8g8b8a8_Srgb>,
  transparent_key: Option<TransparentKey>,
  animation: Option<AnimationControl>,
  pending_frame: Option<FrameControl>,
  total_frames: u32,
  frames_decoded: u32,
  error: Option<(PngError, &'static Location<'static>)>,
}

impl<'b> PngDecoder<'b> {
  /// Makes a decoder over the full bytes of a PNG file.
  #[inline]
  #[must_use]
  pub const fn new(bytes: &'b [u8]) -> Self {
    Self {
      rest: bytes,
      state: PngDecoderState::New,
      header: None,
      palette: Vec::new(),
      transparent_key: None,
      animation: None,
      pending_frame: None,
      total_frames: 0,
      frames_decoded: 0,
      error: None,
    }
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn state(&self) -> PngDecoderState {
    self.state
  }

  /// The first error, and where it was raised.
  #[inline]
  #[must_use]
  pub fn last_error(&self) -> Option<(PngError, &'static Location<'static>)> {
    self.error
  }

  /// The palette, with `tRNS` alpha applied. Empty unless the image is
  /// indexed color.
  #[inline]
  #[must_use]
  pub fn palette(&self) -> &[r8g8b8a8_Srgb] {
    &self.palette
  }

  /// The transparent color key of a greyscale or RGB image.
  #[inline]
  #[must_use]
  pub fn transparent_key(&self) -> Option<TransparentKey> {
    self.transparent_key
  }

  /// The `acTL` info, if this is an APNG.
  #[inline]
  #[must_use]
  pub fn animation(&self) -> Option<AnimationControl> {
    self.animation
  }

  /// Frames that [`decode_image`](Self::decode_image) can still produce.
  ///
  /// This is `None` until the metadata has been decoded.
  #[must_use]
  pub fn frames_remaining(&self) -> Option<u32> {
    match self.state {
      PngDecoderState::Loaded | PngDecoderState::Decoded => {
        Some(self.total_frames.saturating_sub(self.frames_decoded))
      }
      _ => None,
    }
  }

  #[track_caller]
  fn fail<T>(&mut self, e: PngError) -> Result<T, PngError> {
    if self.error.is_none() {
      let location = Location::caller();
      warn!("PNG decode failed: {e} (at {location})");
      self.error = Some((e, location));
    }
    self.state = PngDecoderState::Error;
    Err(e)
  }

  #[track_caller]
  fn check<T>(&mut self, r: Result<T, PngError>) -> Result<T, PngError> {
    match r {
      Ok(t) => Ok(t),
      Err(e) => self.fail(e),
    }
  }

  fn retained_error(&self) -> PngError {
    self.error.map(|(e, _)| e).unwrap_or(PngError::Malformed)
  }

  #[track_caller]
  fn pull_chunk(&mut self) -> Result<PngChunk<'b>, PngError> {
    let (chunk, rest) = self.check(PngChunk::pull(self.rest))?;
    self.rest = rest;
    trace!("chunk {:?}, {} bytes", chunk.tag, chunk.data.len());
    Ok(chunk)
  }

  /// Checks the signature and reads the `IHDR` chunk.
  ///
  /// Calling this again after it succeeds just returns the header again.
  pub fn header(&mut self) -> Result<PngHeader, PngError> {
    match (self.state, self.header) {
      (PngDecoderState::Error, _) => return Err(self.retained_error()),
      (_, Some(header)) => return Ok(header),
      _ => (),
    }
    if !is_png(self.rest) {
      return self.fail(PngError::NotPng);
    }
    self.rest = &self.rest[8..];
    let chunk = self.pull_chunk()?;
    let header = self.check(PngHeader::from_chunk(chunk))?;
    debug!(
      "PNG {}x{}, {:?} at {} bits",
      header.width, header.height, header.color_type, header.bit_depth
    );
    self.header = Some(header);
    self.state = PngDecoderState::Header;
    Ok(header)
  }

  /// Reads the chunks between `IHDR` and the first image data.
  ///
  /// This gathers the palette, transparency, and animation info. Unknown
  /// ancillary chunks are skipped. Unknown critical chunks are an error.
  pub fn decode_metadata(&mut self) -> Result<(), PngError> {
    let header = match self.state {
      PngDecoderState::Error => return Err(self.retained_error()),
      PngDecoderState::Loaded | PngDecoderState::Decoded => return Ok(()),
      PngDecoderState::New | PngDecoderState::Header => self.header()?,
    };
    let mut default_image_is_frame = false;
    loop {
      let before = self.rest;
      let chunk = self.pull_chunk()?;
      match chunk.tag {
        Tag::PLTE => {
          let entries = chunk.data.len() / 3;
          if !self.palette.is_empty()
            || chunk.data.len() % 3 != 0
            || entries == 0
            || entries > 256
            || matches!(header.color_type, PngColorType::Y | PngColorType::YA)
          {
            return self.fail(PngError::Malformed);
          }
          if header.color_type == PngColorType::Index {
            let reserved = self.palette.try_reserve_exact(entries).map_err(PngError::from);
            self.check(reserved)?;
            self.palette.extend(
              chunk.data.chunks_exact(3).map(|c| r8g8b8a8_Srgb { r: c[0], g: c[1], b: c[2], a: 0xFF }),
            );
          }
        }
        Tag::tRNS => {
          let d = chunk.data;
          let be16 = |i: usize| u16::from_be_bytes([d[i], d[i + 1]]);
          match header.color_type {
            PngColorType::Index if !self.palette.is_empty() && d.len() <= self.palette.len() => {
              self.palette.iter_mut().zip(d).for_each(|(p, a)| p.a = *a);
            }
            PngColorType::Y if d.len() == 2 => {
              self.transparent_key = Some(TransparentKey::Y(be16(0)));
            }
            PngColorType::RGB if d.len() == 6 => {
              self.transparent_key = Some(TransparentKey::RGB([be16(0), be16(2), be16(4)]));
            }
            _ => return self.fail(PngError::Malformed),
          }
        }
        Tag::acTL => {
          let animation = self.check(AnimationControl::from_chunk(chunk))?;
          self.animation = Some(animation);
        }
        Tag::fcTL => {
          let frame = self.check(FrameControl::from_chunk(chunk, header.width, header.height))?;
          if (frame.x_offset, frame.y_offset, frame.width, frame.height)
            != (0, 0, header.width, header.height)
          {
            // the frame control for the default image must cover all of it
            return self.fail(PngError::Malformed);
          }
          self.pending_frame = Some(frame);
          default_image_is_frame = true;
        }
        Tag::IDAT => {
          self.rest = before;
          break;
        }
        Tag::IHDR | Tag::IEND | Tag::fdAT => return self.fail(PngError::Malformed),
        tag if tag.is_ancillary() => trace!("skipping {tag:?}"),
        _ => return self.fail(PngError::UnsupportedChunk),
      }
    }
    if header.color_type == PngColorType::Index && self.palette.is_empty() {
      return self.fail(PngError::Malformed);
    }
    if self.pending_frame.is_some() && self.animation.is_none() {
      return self.fail(PngError::Malformed);
    }
    self.total_frames = match self.animation {
      Some(a) if default_image_is_frame => a.num_frames,
      Some(a) => a.num_frames.saturating_add(1),
      None => 1,
    };
    self.state = PngDecoderState::Loaded;
    Ok(())
  }

  /// Decodes the next frame.
  ///
  /// The first call gives the `IDAT` image. For an APNG each later call gives
  /// the next `fdAT` frame.
  ///
  /// ## Failure
  /// * `EndOfStream` once every frame has been decoded. This doesn't put the
  ///   decoder into the error state.
  /// * Any other error stops the decoder.
  pub fn decode_image(&mut self) -> Result<PngFrame, PngError> {
    match self.state {
      PngDecoderState::Error => return Err(self.retained_error()),
      PngDecoderState::New | PngDecoderState::Header => self.decode_metadata()?,
      PngDecoderState::Loaded | PngDecoderState::Decoded => (),
    }
    let header = match self.header {
      Some(header) => header,
      None => return self.fail(PngError::BadParameter),
    };
    if self.frames_decoded >= self.total_frames {
      return Err(PngError::EndOfStream);
    }
    loop {
      let before = self.rest;
      let chunk = self.pull_chunk()?;
      match chunk.tag {
        Tag::IDAT if self.frames_decoded == 0 => {
          self.rest = before;
          break;
        }
        Tag::fdAT if self.frames_decoded > 0 && self.pending_frame.is_some() => {
          self.rest = before;
          break;
        }
        Tag::fcTL if self.animation.is_some() && self.pending_frame.is_none() => {
          let frame = self.check(FrameControl::from_chunk(chunk, header.width, header.height))?;
          self.pending_frame = Some(frame);
        }
        Tag::IEND => {
          debug!("PNG ended after {} frames", self.frames_decoded);
          self.total_frames = self.frames_decoded;
          return Err(PngError::EndOfStream);
        }
        Tag::IHDR | Tag::PLTE | Tag::tRNS | Tag::acTL | Tag::fcTL | Tag::IDAT | Tag::fdAT => {
          return self.fail(PngError::Malformed)
        }
        tag if tag.is_ancillary() => trace!("skipping {tag:?}"),
        _ => return self.fail(PngError::UnsupportedChunk),
      }
    }
    let frame = self.pending_frame.take();
    let (x, y, width, height) = match frame {
      Some(f) => (f.x_offset, f.y_offset, f.width, f.height),
      None => (0, 0, header.width, header.height),
    };
    let run = self.take_data_run()?;
    let row_stride = match header.row_stride(width) {
      Some(stride) => stride,
      None => return self.fail(PngError::OutOfMemory),
    };
    let lines = row_stride.checked_add(1).and_then(|line| line.checked_mul(height as usize));
    let mut data = match lines {
      Some(len) => self.check(try_zeroed_vec(len).map_err(PngError::from))?,
      None => return self.fail(PngError::OutOfMemory),
    };
    self.check(inflate_zlib_exact(&mut data, run).map_err(PngError::from))?;
    self.check(unfilter_in_place(&mut data, row_stride, header.filter_unit()))?;
    strip_filter_bytes(&mut data, row_stride);
    clear_padding_bits(&mut data, row_stride, header.bits_per_pixel() * width as usize);
    self.frames_decoded += 1;
    self.state = PngDecoderState::Decoded;
    trace!("decoded frame {} ({x},{y} {width}x{height})", self.frames_decoded);
    Ok(PngFrame {
      data,
      row_stride,
      x,
      y,
      width,
      height,
      delay_ms: frame.map_or(0, |f| f.delay_ms()),
      dispose_op: frame.map_or(DisposeOp::None, |f| f.dispose_op),
      blend_op: frame.map_or(BlendOp::Source, |f| f.blend_op),
    })
  }

  /// Moves past a run of consecutive image data chunks, returning an
  /// iterator over their payloads.
  fn take_data_run(&mut self) -> Result<DataRun<'b>, PngError> {
    let start = self.rest;
    let (first, _) = self.check(PngChunk::pull(start))?;
    let tag = first.tag;
    let mut rest = start;
    while let Ok((chunk, after)) = PngChunk::pull(rest) {
      if chunk.tag != tag {
        break;
      }
      if tag == Tag::fdAT && chunk.data.len() < 4 {
        return self.fail(PngError::Malformed);
      }
      rest = after;
    }
    self.rest = rest;
    Ok(DataRun { rest: start, tag })
  }
}

/// Payloads of consecutive `IDAT` (or `fdAT`) chunks, which together make up
/// one zlib stream.
struct DataRun<'b> {
  rest: &'b [u8],
  tag: Tag,
}
impl<'b> Iterator for DataRun<'b> {
  type Item = &'b [u8];
  fn next(&mut self) -> Option<&'b [u8]> {
    let (chunk, after) = PngChunk::pull(self.rest).ok()?;
    if chunk.tag != self.tag {
      return None;
    }
    self.rest = after;
    if self.tag == Tag::fdAT {
      // skip the sequence number
      chunk.data.get(4..)
    } else {
      Some(chunk.data)
    }
  }
}
