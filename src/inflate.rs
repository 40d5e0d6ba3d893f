//! Zlib decompression of image payloads.
//!
//! PNG pixel data is a zlib stream, possibly split across several chunks.
//! This drives the `miniz_oxide` core decompressor across the chunk slices
//! directly, so they never have to be joined into one buffer first. Both
//! stored (uncompressed) and Huffman compressed deflate blocks are handled.

use log::{trace, warn};
use miniz_oxide::inflate::{
  core::{
    decompress,
    inflate_flags::{
      TINFL_FLAG_HAS_MORE_INPUT, TINFL_FLAG_IGNORE_ADLER32, TINFL_FLAG_PARSE_ZLIB_HEADER,
      TINFL_FLAG_USING_NON_WRAPPING_OUTPUT_BUF,
    },
    DecompressorOxide,
  },
  TINFLStatus,
};

use crate::DecodeError;

/// Decompresses a zlib stream into `out`, which must be exactly the size of
/// the decompressed data.
///
/// The Adler-32 checksum at the end of the stream isn't checked.
///
/// ## Failure
/// * `Malformed` if the stream is invalid, or if it decompresses to more or
///   fewer bytes than `out` holds.
pub fn inflate_zlib_exact<'i, I>(out: &mut [u8], input: I) -> Result<(), DecodeError>
where
  I: Iterator<Item = &'i [u8]>,
{
  let mut r = DecompressorOxide::new();
  let mut out_pos = 0;
  let mut slices = input.peekable();
  let base_flags = TINFL_FLAG_USING_NON_WRAPPING_OUTPUT_BUF
    | TINFL_FLAG_PARSE_ZLIB_HEADER
    | TINFL_FLAG_IGNORE_ADLER32;
  while let Some(in_buf) = slices.next() {
    let more = slices.peek().is_some();
    let flags = if more { base_flags | TINFL_FLAG_HAS_MORE_INPUT } else { base_flags };
    let (status, read, written) = decompress(&mut r, in_buf, out, out_pos, flags);
    out_pos += written;
    match status {
      TINFLStatus::Done if out_pos == out.len() => {
        trace!("inflated {out_pos} bytes");
        return Ok(());
      }
      TINFLStatus::Done => {
        warn!("zlib stream gave {out_pos} bytes, expected {}", out.len());
        return Err(DecodeError::Malformed);
      }
      TINFLStatus::NeedsMoreInput => continue,
      // A full buffer at the end of a slice is reported as more output even
      // when the decoder only wants the next slice. That's only real excess
      // output if input was left unread or there's no next slice.
      TINFLStatus::HasMoreOutput if more && out_pos == out.len() && read == in_buf.len() => {
        continue
      }
      TINFLStatus::HasMoreOutput => {
        warn!("zlib stream is larger than the expected {} bytes", out.len());
        return Err(DecodeError::Malformed);
      }
      status => {
        warn!("zlib stream failed: {status:?}");
        return Err(DecodeError::Malformed);
      }
    }
  }
  warn!("zlib stream ended early after {out_pos} of {} bytes", out.len());
  Err(DecodeError::Malformed)
}
