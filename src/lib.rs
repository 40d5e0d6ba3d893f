#![no_std]
#![cfg_attr(docs_rs, feature(doc_cfg))]
#![warn(missing_docs)]

//! Image decoding for a small-RAM watch graphics stack.
//!
//! Resources come out of flash as plain bytes. This crate turns them into
//! either a raster [`GBitmap`] (from a PBI or PNG resource) or a vector
//! [`DrawCommandImage`](pdc::DrawCommandImage) /
//! [`DrawCommandSequence`](pdc::DrawCommandSequence), without copying the
//! bytes out of flash whenever that's possible.
//!
//! * [`ResourceMap`] hands out resource bytes, mapped in place or copied to
//!   the heap, and keeps count of the live mappings.
//! * [`GBitmap`] is a raster image in one of the display's pixel formats.
//! * [`png`] has the PNG/APNG decoder (with the `png` feature).
//! * [`pdc`] has the draw command containers (with the `pdc` feature).
//!
//! Everything that depends on the platform goes through a
//! [`PlatformConfig`] value, there's no global state other than the mapping
//! counts.

extern crate alloc;

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

mod error;
pub use error::*;

mod parser_helpers;

mod geometry;
pub use geometry::*;

mod color;
pub use color::*;

mod platform;
pub use platform::*;

mod sniff;
pub use sniff::*;

mod resource;
pub use resource::*;

mod bitmap;
pub use bitmap::*;

#[cfg(feature = "png")]
mod inflate;

#[cfg(feature = "png")]
#[cfg_attr(docs_rs, doc(cfg(feature = "png")))]
pub mod png;

#[cfg(feature = "pdc")]
#[cfg_attr(docs_rs, doc(cfg(feature = "pdc")))]
pub mod pdc;
