//! Handing draw commands to a renderer.

use log::trace;

use super::{
  command::{DrawCommand, DrawCommandKind, DrawCommandView},
  frame::FrameView,
  list::CommandListView,
};
use crate::{DecodeError, GColor8, GPoint, GPointPrecise};

/// A drawing target.
///
/// The actual rasterizing lives outside of this crate. Positions given here
/// already have the caller's offset applied.
pub trait GContext {
  #[allow(missing_docs)]
  fn set_fill_color(&mut self, color: GColor8);
  #[allow(missing_docs)]
  fn set_stroke_color(&mut self, color: GColor8);
  #[allow(missing_docs)]
  fn set_stroke_width(&mut self, width: u8);
  #[allow(missing_docs)]
  fn fill_circle(&mut self, center: GPoint, radius: u16);
  #[allow(missing_docs)]
  fn draw_circle(&mut self, center: GPoint, radius: u16);
  /// Fills the polygon through `points`.
  fn fill_path(&mut self, points: &[GPoint]);
  /// Strokes the line through `points`, joined back to the start unless
  /// `open`.
  fn draw_path(&mut self, points: &[GPoint], open: bool);
  #[allow(missing_docs)]
  fn fill_path_precise(&mut self, points: &[GPointPrecise]);
  #[allow(missing_docs)]
  fn draw_path_precise(&mut self, points: &[GPointPrecise], open: bool);
}

/// Gets to change each command right before it's drawn.
///
/// The processor sees a copy, so the stored command is never affected. Any
/// `FnMut(&mut DrawCommand)` closure is a processor.
pub trait DrawCommandProcessor {
  /// `index` is the command's 1-based position in its list.
  fn process(&mut self, index: u16, command: &mut DrawCommand);
}
impl<F: FnMut(&mut DrawCommand)> DrawCommandProcessor for F {
  #[inline]
  fn process(&mut self, _index: u16, command: &mut DrawCommand) {
    self(command)
  }
}

/// Draws one command, moved by `offset`.
///
/// Hidden commands draw nothing. Otherwise the fill goes first, unless the
/// fill color is fully transparent, then the stroke, unless the stroke color
/// is fully transparent or the width is 0.
pub fn draw_command<C: GContext + ?Sized>(ctx: &mut C, mut command: DrawCommand, offset: GPoint) {
  if command.hidden {
    return;
  }
  let fill = !command.fill_color.is_transparent();
  let stroke = !command.stroke_color.is_transparent() && command.stroke_width > 0;
  if fill {
    ctx.set_fill_color(command.fill_color);
  }
  if stroke {
    ctx.set_stroke_color(command.stroke_color);
    ctx.set_stroke_width(command.stroke_width);
  }
  match &mut command.kind {
    DrawCommandKind::Circle { center, radius } => {
      let center = *center + offset;
      if fill {
        ctx.fill_circle(center, *radius);
      }
      if stroke {
        ctx.draw_circle(center, *radius);
      }
    }
    DrawCommandKind::Path { open, points } => {
      points.iter_mut().for_each(|p| *p = *p + offset);
      if fill {
        ctx.fill_path(points);
      }
      if stroke {
        ctx.draw_path(points, *open);
      }
    }
    DrawCommandKind::PrecisePath { open, points } => {
      points.iter_mut().for_each(|p| *p = p.offset_by(offset));
      if fill {
        ctx.fill_path_precise(points);
      }
      if stroke {
        ctx.draw_path_precise(points, *open);
      }
    }
  }
}

/// Copies out one stored command and draws it.
fn draw_view<C: GContext + ?Sized>(
  ctx: &mut C, index: u16, view: DrawCommandView<'_>, offset: GPoint,
  processor: Option<&mut (dyn DrawCommandProcessor + '_)>,
) -> Result<(), DecodeError> {
  if processor.is_none() && view.hidden() {
    return Ok(());
  }
  let mut command = view.to_command()?;
  if let Some(processor) = processor {
    processor.process(index, &mut command);
  }
  draw_command(ctx, command, offset);
  Ok(())
}

impl CommandListView<'_> {
  /// Draws every command in order, moved by `offset`.
  ///
  /// ## Failure
  /// * `OutOfMemory` if a command's points couldn't be copied out. Commands
  ///   before it will already have been drawn.
  pub fn draw<C: GContext + ?Sized>(&self, ctx: &mut C, offset: GPoint) -> Result<(), DecodeError> {
    self.draw_inner(ctx, offset, None)
  }

  /// Draws every command in order, letting `processor` edit a copy of each one
  /// first.
  pub fn draw_processed<C: GContext + ?Sized, P: DrawCommandProcessor>(
    &self, ctx: &mut C, offset: GPoint, processor: &mut P,
  ) -> Result<(), DecodeError> {
    self.draw_inner(ctx, offset, Some(processor as &mut dyn DrawCommandProcessor))
  }

  fn draw_inner<C: GContext + ?Sized>(
    &self, ctx: &mut C, offset: GPoint, mut processor: Option<&mut (dyn DrawCommandProcessor + '_)>,
  ) -> Result<(), DecodeError> {
    trace!("drawing {} commands at {offset:?}", self.num_commands());
    for (i, view) in self.iter().enumerate() {
      let each = match processor {
        Some(ref mut p) => Some(&mut **p),
        None => None,
      };
      draw_view(ctx, i as u16 + 1, view, offset, each)?;
    }
    Ok(())
  }
}

impl FrameView<'_> {
  /// Draws this frame's commands, moved by `offset`.
  #[inline]
  pub fn draw<C: GContext + ?Sized>(&self, ctx: &mut C, offset: GPoint) -> Result<(), DecodeError> {
    self.command_list().draw(ctx, offset)
  }

  /// Draws this frame's commands, letting `processor` edit a copy of each
  /// one first.
  #[inline]
  pub fn draw_processed<C: GContext + ?Sized, P: DrawCommandProcessor>(
    &self, ctx: &mut C, offset: GPoint, processor: &mut P,
  ) -> Result<(), DecodeError> {
    self.command_list().draw_processed(ctx, offset, processor)
  }
}
