//! Per-platform settings that bitmap construction depends on.
//!
//! Nothing here is global: a [`PlatformConfig`] is handed to every
//! constructor that needs one.

use crate::GSize;

/// Which generation of the bitmap API the calling app was built against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompatMode {
  /// All formats are available.
  #[default]
  Current,
  /// Apps built for the original 1-bit API.
  ///
  /// Only `Format1Bit` bitmaps can be created; PBI resources in any other
  /// format are rejected and PNG resources are reduced to 1 bit.
  Legacy2,
}

/// The physical shape of the display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DisplayShape {
  #[default]
  #[allow(missing_docs)]
  Rect,
  /// A circle inscribed in the display's size.
  Round,
}

/// Describes what the current platform is able to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformConfig {
  /// Size of the framebuffer in pixels.
  pub display_size: GSize,
  /// Shape of the visible area.
  pub display_shape: DisplayShape,
  /// When set, `Format8BitCircular` bitmaps must be exactly `display_size`.
  pub circular_requires_display_size: bool,
  /// If read-only resources can be used in place instead of copied to RAM.
  pub mappable_flash: bool,
  /// API generation of the calling app.
  pub compat: CompatMode,
}

impl PlatformConfig {
  /// A rectangular display with memory-mappable flash.
  #[inline]
  #[must_use]
  pub const fn rect(w: i16, h: i16) -> Self {
    Self {
      display_size: GSize { w, h },
      display_shape: DisplayShape::Rect,
      circular_requires_display_size: false,
      mappable_flash: true,
      compat: CompatMode::Current,
    }
  }

  /// A round display of the given diameter.
  ///
  /// Circular bitmaps on round platforms are restricted to the display size.
  #[inline]
  #[must_use]
  pub const fn round(diameter: i16) -> Self {
    Self {
      display_size: GSize { w: diameter, h: diameter },
      display_shape: DisplayShape::Round,
      circular_requires_display_size: true,
      mappable_flash: true,
      compat: CompatMode::Current,
    }
  }

  /// The original 144x168 monochrome platform, running a legacy app.
  #[inline]
  #[must_use]
  pub const fn legacy2() -> Self {
    Self {
      display_size: GSize { w: 144, h: 168 },
      display_shape: DisplayShape::Rect,
      circular_requires_display_size: false,
      mappable_flash: false,
      compat: CompatMode::Legacy2,
    }
  }

  /// Same platform, different compatibility mode.
  #[inline]
  #[must_use]
  pub const fn with_compat(self, compat: CompatMode) -> Self {
    Self { compat, ..self }
  }
}

impl Default for PlatformConfig {
  #[inline]
  fn default() -> Self {
    Self::rect(144, 168)
  }
}
