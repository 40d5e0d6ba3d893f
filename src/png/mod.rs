//! Module for PNG and APNG support.
//!
//! * [Portable Network Graphics Specification (Third Edition)][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/png-3/
//!
//! ## Decoding
//!
//! A [`PngDecoder`] works in steps, each of which can be called directly or
//! implied by the step after it:
//!
//! 1. [`header`](PngDecoder::header) checks the signature and reads `IHDR`.
//! 2. [`decode_metadata`](PngDecoder::decode_metadata) reads `PLTE`, `tRNS`,
//!    `acTL`, and `fcTL` up to the first image data chunk.
//! 3. [`decode_image`](PngDecoder::decode_image) inflates and unfilters one
//!    frame. For an APNG, call it again for each following frame.
//!
//! Only non-interlaced images with 8 bits per channel or less are supported.
//! Chunk CRCs are not checked.

use core::fmt;

use crate::DecodeError;

mod chunk;
pub use chunk::*;

mod header;
pub use header::*;

mod apng;
pub use apng::*;

mod unfilter;
pub use unfilter::*;

mod decoder;
pub use decoder::*;

/// Things that can go wrong while decoding a PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PngError {
  /// The data doesn't start with the PNG signature.
  NotPng,
  /// The data is structurally invalid.
  Malformed,
  /// A critical chunk type we don't know how to handle.
  UnsupportedChunk,
  /// Interlaced images aren't supported.
  UnsupportedInterlacing,
  /// The color type and bit depth combination isn't supported.
  UnsupportedColorFormat,
  /// An allocation failed.
  OutOfMemory,
  /// A method was called at the wrong time, or with a bad argument.
  BadParameter,
  /// There are no more frames to decode.
  EndOfStream,
}

impl fmt::Display for PngError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::NotPng => "not a PNG",
      Self::Malformed => "malformed PNG data",
      Self::UnsupportedChunk => "unsupported critical chunk",
      Self::UnsupportedInterlacing => "interlaced PNGs are not supported",
      Self::UnsupportedColorFormat => "unsupported color type or bit depth",
      Self::OutOfMemory => "out of memory",
      Self::BadParameter => "bad parameter",
      Self::EndOfStream => "no more frames",
    })
  }
}

impl From<PngError> for DecodeError {
  #[inline]
  fn from(e: PngError) -> Self {
    match e {
      PngError::NotPng => Self::NotThisFormat,
      PngError::Malformed => Self::Malformed,
      PngError::UnsupportedChunk
      | PngError::UnsupportedInterlacing
      | PngError::UnsupportedColorFormat => Self::UnsupportedFeature,
      PngError::OutOfMemory => Self::OutOfMemory,
      PngError::BadParameter => Self::BadParameter,
      PngError::EndOfStream => Self::StreamComplete,
    }
  }
}

impl From<DecodeError> for PngError {
  #[inline]
  fn from(e: DecodeError) -> Self {
    match e {
      DecodeError::OutOfMemory => Self::OutOfMemory,
      DecodeError::NotThisFormat => Self::NotPng,
      DecodeError::UnsupportedFeature => Self::UnsupportedColorFormat,
      DecodeError::BadParameter => Self::BadParameter,
      DecodeError::StreamComplete => Self::EndOfStream,
      DecodeError::NotFound | DecodeError::Malformed => Self::Malformed,
    }
  }
}

impl From<alloc::collections::TryReserveError> for PngError {
  #[inline]
  fn from(_: alloc::collections::TryReserveError) -> Self {
    Self::OutOfMemory
  }
}
