//! Single draw commands.
//!
//! Each command is a 9 byte header followed by its points:
//!
//! ```text
//! type:          u8    1 path, 2 circle, 3 precise path
//! flags:         u8    bit 0 hidden
//! stroke_color:  GColor8
//! stroke_width:  u8
//! fill_color:    GColor8
//! open / radius: u16   bit 0 is "path open" for paths, the radius for circles
//! num_points:    u16
//! points:        [(i16, i16); num_points]
//! ```
//!
//! Precise path points are 13.3 fixed point, the other types use whole
//! pixels. Everything is little-endian.

use alloc::vec::Vec;

use log::trace;
use pack1::U16LE;

use crate::{
  parser_helpers::{try_pull_pod, try_split_at},
  DecodeError, GColor8, GPoint, GPointPrecise,
};

#[derive(Debug, Clone, Copy, bytemuck::Zeroable, bytemuck::Pod)]
#[repr(C)]
pub(crate) struct CommandHeader {
  pub ty: u8,
  pub flags: u8,
  pub stroke_color: GColor8,
  pub stroke_width: u8,
  pub fill_color: GColor8,
  pub open_or_radius: U16LE,
  pub num_points: U16LE,
}

/// Size of a command's header in bytes.
pub const COMMAND_HEADER_SIZE: usize = core::mem::size_of::<CommandHeader>();

/// Size of each stored point in bytes.
pub const POINT_SIZE: usize = 4;

const FLAG_HIDDEN: u8 = 1 << 0;
const PATH_OPEN_BIT: u16 = 1 << 0;

/// Byte offsets within the header, for the in-place setters.
const FLAGS_OFFSET: usize = 1;
const STROKE_COLOR_OFFSET: usize = 2;
const STROKE_WIDTH_OFFSET: usize = 3;
const FILL_COLOR_OFFSET: usize = 4;
const OPEN_OR_RADIUS_OFFSET: usize = 5;

/// The kinds of draw command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DrawCommandType {
  /// Never valid in a resource.
  Invalid = 0,
  /// A polyline or polygon in whole pixels.
  Path = 1,
  /// A circle around a single center point.
  Circle = 2,
  /// A polyline or polygon in 13.3 fixed point.
  PrecisePath = 3,
}
impl From<u8> for DrawCommandType {
  #[inline]
  fn from(value: u8) -> Self {
    match value {
      1 => Self::Path,
      2 => Self::Circle,
      3 => Self::PrecisePath,
      _ => Self::Invalid,
    }
  }
}

/// Checks the command at the start of `bytes`, returning its size.
///
/// ## Failure
/// * `Malformed` if the type is invalid, the point count doesn't suit the
///   type (a circle has exactly one point, paths have more than one), or the
///   points run past the end of `bytes`.
pub fn command_size(bytes: &[u8]) -> Result<usize, DecodeError> {
  let (header, rest) = try_pull_pod::<CommandHeader>(bytes)?;
  let num_points = header.num_points.get() as usize;
  let points_ok = match DrawCommandType::from(header.ty) {
    DrawCommandType::Circle => num_points == 1,
    DrawCommandType::Path | DrawCommandType::PrecisePath => num_points > 1,
    DrawCommandType::Invalid => false,
  };
  if !points_ok {
    trace!("command type {} can't have {num_points} points", header.ty);
    return Err(DecodeError::Malformed);
  }
  try_split_at(rest, num_points * POINT_SIZE)?;
  Ok(COMMAND_HEADER_SIZE + num_points * POINT_SIZE)
}

#[inline]
fn read_point(points: &[u8], index: usize) -> Option<(i16, i16)> {
  let start = index.checked_mul(POINT_SIZE)?;
  match points.get(start..start + POINT_SIZE)? {
    [x0, x1, y0, y1] => Some((i16::from_le_bytes([*x0, *x1]), i16::from_le_bytes([*y0, *y1]))),
    _ => None,
  }
}

/// A read-only view of one command, stored in place.
#[derive(Clone, Copy)]
pub struct DrawCommandView<'d> {
  header: CommandHeader,
  points: &'d [u8],
}
impl<'d> DrawCommandView<'d> {
  /// Views the command at the start of `bytes`, returning it and the bytes
  /// after it.
  pub fn parse(bytes: &'d [u8]) -> Result<(Self, &'d [u8]), DecodeError> {
    let size = command_size(bytes)?;
    let (this, rest) = bytes.split_at(size);
    let (header, points) = try_pull_pod::<CommandHeader>(this)?;
    Ok((Self { header, points }, rest))
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn command_type(&self) -> DrawCommandType {
    DrawCommandType::from(self.header.ty)
  }
  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn hidden(&self) -> bool {
    self.header.flags & FLAG_HIDDEN != 0
  }
  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn stroke_color(&self) -> GColor8 {
    self.header.stroke_color
  }
  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn stroke_width(&self) -> u8 {
    self.header.stroke_width
  }
  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn fill_color(&self) -> GColor8 {
    self.header.fill_color
  }
  /// If a path is left open (not joined back to its first point).
  ///
  /// Always false for circles.
  #[inline]
  #[must_use]
  pub fn path_open(&self) -> bool {
    self.command_type() != DrawCommandType::Circle
      && self.header.open_or_radius.get() & PATH_OPEN_BIT != 0
  }
  /// The radius of a circle, 0 for paths.
  #[inline]
  #[must_use]
  pub fn radius(&self) -> u16 {
    if self.command_type() == DrawCommandType::Circle {
      self.header.open_or_radius.get()
    } else {
      0
    }
  }
  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn num_points(&self) -> u16 {
    self.header.num_points.get()
  }
  /// Bytes this command takes up, header included.
  #[inline]
  #[must_use]
  pub fn size(&self) -> usize {
    COMMAND_HEADER_SIZE + self.points.len()
  }

  /// A point, in whole pixels.
  ///
  /// For precise paths the stored value is converted down to whole pixels.
  #[must_use]
  pub fn point(&self, index: u16) -> Option<GPoint> {
    let (x, y) = read_point(self.points, index as usize)?;
    Some(if self.command_type() == DrawCommandType::PrecisePath {
      GPointPrecise::new(x, y).to_gpoint()
    } else {
      GPoint::new(x, y)
    })
  }

  /// A point, in 13.3 fixed point.
  ///
  /// For circles and plain paths the stored value is converted up.
  #[must_use]
  pub fn precise_point(&self, index: u16) -> Option<GPointPrecise> {
    let (x, y) = read_point(self.points, index as usize)?;
    Some(if self.command_type() == DrawCommandType::PrecisePath {
      GPointPrecise::new(x, y)
    } else {
      GPointPrecise::from(GPoint::new(x, y))
    })
  }

  /// Copies the command out into an editable value.
  pub fn to_command(&self) -> Result<DrawCommand, DecodeError> {
    let n = self.num_points();
    let kind = match self.command_type() {
      DrawCommandType::Circle => DrawCommandKind::Circle {
        center: self.point(0).ok_or(DecodeError::Malformed)?,
        radius: self.radius(),
      },
      DrawCommandType::Path => {
        let mut points = Vec::new();
        points.try_reserve_exact(n as usize)?;
        points.extend((0..n).filter_map(|i| self.point(i)));
        DrawCommandKind::Path { open: self.path_open(), points }
      }
      DrawCommandType::PrecisePath => {
        let mut points = Vec::new();
        points.try_reserve_exact(n as usize)?;
        points.extend((0..n).filter_map(|i| self.precise_point(i)));
        DrawCommandKind::PrecisePath { open: self.path_open(), points }
      }
      DrawCommandType::Invalid => return Err(DecodeError::Malformed),
    };
    Ok(DrawCommand {
      hidden: self.hidden(),
      stroke_color: self.stroke_color(),
      stroke_width: self.stroke_width(),
      fill_color: self.fill_color(),
      kind,
    })
  }
}
impl core::fmt::Debug for DrawCommandView<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("DrawCommandView")
      .field("type", &self.command_type())
      .field("hidden", &self.hidden())
      .field("stroke_color", &self.stroke_color())
      .field("stroke_width", &self.stroke_width())
      .field("fill_color", &self.fill_color())
      .field("num_points", &self.num_points())
      .finish()
  }
}

/// A writable view of one command, stored in place.
///
/// Only the values can be changed, never the type or the number of points,
/// so the layout of the surrounding container always stays valid.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct DrawCommandMut<'d> {
  bytes: &'d mut [u8],
}
impl<'d> DrawCommandMut<'d> {
  /// Views the command at the start of `bytes`, returning it and the bytes
  /// after it.
  pub fn parse(bytes: &'d mut [u8]) -> Result<(Self, &'d mut [u8]), DecodeError> {
    let size = command_size(bytes)?;
    let (this, rest) = bytes.split_at_mut(size);
    Ok((Self { bytes: this }, rest))
  }

  /// Reads the current values.
  #[inline]
  #[must_use]
  pub fn as_view(&self) -> DrawCommandView<'_> {
    // the layout was checked when this was made
    let header: CommandHeader =
      bytemuck::pod_read_unaligned(&self.bytes[..COMMAND_HEADER_SIZE]);
    DrawCommandView { header, points: &self.bytes[COMMAND_HEADER_SIZE..] }
  }

  #[allow(missing_docs)]
  pub fn set_hidden(&mut self, hidden: bool) {
    let flags = &mut self.bytes[FLAGS_OFFSET];
    if hidden {
      *flags |= FLAG_HIDDEN;
    } else {
      *flags &= !FLAG_HIDDEN;
    }
  }
  #[allow(missing_docs)]
  pub fn set_stroke_color(&mut self, color: GColor8) {
    self.bytes[STROKE_COLOR_OFFSET] = color.0;
  }
  #[allow(missing_docs)]
  pub fn set_stroke_width(&mut self, width: u8) {
    self.bytes[STROKE_WIDTH_OFFSET] = width;
  }
  #[allow(missing_docs)]
  pub fn set_fill_color(&mut self, color: GColor8) {
    self.bytes[FILL_COLOR_OFFSET] = color.0;
  }

  fn open_or_radius(&self) -> u16 {
    let at = OPEN_OR_RADIUS_OFFSET;
    u16::from_le_bytes([self.bytes[at], self.bytes[at + 1]])
  }
  fn set_open_or_radius(&mut self, value: u16) {
    let at = OPEN_OR_RADIUS_OFFSET;
    self.bytes[at..at + 2].copy_from_slice(&value.to_le_bytes());
  }

  /// Sets if a path is open. Fails on a circle.
  pub fn set_path_open(&mut self, open: bool) -> Result<(), DecodeError> {
    if self.as_view().command_type() == DrawCommandType::Circle {
      return Err(DecodeError::BadParameter);
    }
    let bits = self.open_or_radius() & !PATH_OPEN_BIT;
    self.set_open_or_radius(if open { bits | PATH_OPEN_BIT } else { bits });
    Ok(())
  }

  /// Sets the radius of a circle. Fails on a path.
  pub fn set_radius(&mut self, radius: u16) -> Result<(), DecodeError> {
    if self.as_view().command_type() != DrawCommandType::Circle {
      return Err(DecodeError::BadParameter);
    }
    self.set_open_or_radius(radius);
    Ok(())
  }

  /// Sets a point in whole pixels, converting for precise paths.
  pub fn set_point(&mut self, index: u16, point: GPoint) -> Result<(), DecodeError> {
    let raw = if self.as_view().command_type() == DrawCommandType::PrecisePath {
      let p = GPointPrecise::from(point);
      (p.x, p.y)
    } else {
      (point.x, point.y)
    };
    self.write_point(index, raw)
  }

  /// Sets a point in 13.3 fixed point. The fraction is dropped for
  /// anything but a precise path.
  pub fn set_precise_point(&mut self, index: u16, point: GPointPrecise) -> Result<(), DecodeError> {
    let raw = if self.as_view().command_type() == DrawCommandType::PrecisePath {
      (point.x, point.y)
    } else {
      let p = point.to_gpoint();
      (p.x, p.y)
    };
    self.write_point(index, raw)
  }

  fn write_point(&mut self, index: u16, (x, y): (i16, i16)) -> Result<(), DecodeError> {
    let start = COMMAND_HEADER_SIZE + index as usize * POINT_SIZE;
    let slot = self.bytes.get_mut(start..start + POINT_SIZE).ok_or(DecodeError::BadParameter)?;
    slot[..2].copy_from_slice(&x.to_le_bytes());
    slot[2..].copy_from_slice(&y.to_le_bytes());
    Ok(())
  }
}

/// The shape part of a [`DrawCommand`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum DrawCommandKind {
  Circle { center: GPoint, radius: u16 },
  Path { open: bool, points: Vec<GPoint> },
  PrecisePath { open: bool, points: Vec<GPointPrecise> },
}

/// An editable copy of a draw command.
///
/// This is what a draw processor gets to change before each command is
/// drawn. Changing it has no effect on the stored command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct DrawCommand {
  pub hidden: bool,
  pub stroke_color: GColor8,
  pub stroke_width: u8,
  pub fill_color: GColor8,
  pub kind: DrawCommandKind,
}
