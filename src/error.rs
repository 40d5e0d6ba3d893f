use core::{fmt, num::TryFromIntError};

/// An error from decoding a bitmap, PNG, or draw command resource.
///
/// Every decode either completes or fails as a whole. There's no partial
/// result on the error path, and any resource acquired along the way has
/// already been released by the time you see one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DecodeError {
  /// The allocator couldn't give us enough space.
  OutOfMemory,

  /// The resource doesn't exist (or is empty).
  NotFound,

  /// The signature bytes don't match the format being decoded.
  NotThisFormat,

  /// The data is structurally invalid.
  Malformed,

  /// The data is recognized, but uses a feature that isn't implemented
  /// (interlacing, 16-bit channels, an unknown critical PNG chunk, etc).
  UnsupportedFeature,

  /// The caller asked for something impossible (a size the platform can't
  /// hold, a format the compatibility mode forbids, etc).
  BadParameter,

  /// A multi-step decoder has nothing left to produce.
  StreamComplete,
}

impl fmt::Display for DecodeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::OutOfMemory => "out of memory",
      Self::NotFound => "resource not found",
      Self::NotThisFormat => "signature does not match this format",
      Self::Malformed => "malformed data",
      Self::UnsupportedFeature => "unsupported feature",
      Self::BadParameter => "bad parameter",
      Self::StreamComplete => "stream complete",
    })
  }
}

impl From<alloc::collections::TryReserveError> for DecodeError {
  #[inline]
  fn from(_: alloc::collections::TryReserveError) -> Self {
    Self::OutOfMemory
  }
}
impl From<TryFromIntError> for DecodeError {
  #[inline]
  fn from(_: TryFromIntError) -> Self {
    Self::Malformed
  }
}
