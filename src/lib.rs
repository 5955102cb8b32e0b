//! Layered raster images: an ordered stack of opacity-weighted layers over a
//! packed 7-bit-alpha pixel buffer, flattened by pluggable composers with
//! linear or gamma-correct blending.
//!
//! ```no_run
//! use rasterlayers::{Color, Image, PaintMode, Rect};
//!
//! # fn main() -> rasterlayers::Result<()> {
//! let mut image = Image::new(100, 50)?;
//! let top = image.new_layer_named("ink");
//! top.set_opacity(25.0);
//! top.surface_mut().fill_rect(Rect::new(5, 25, 90, 20), Color::rgb(0, 0, 255), PaintMode::Replace);
//! let url = image.data_url_png()?;
//! # Ok(())
//! # }
//! ```

#![allow(clippy::too_many_arguments)]

#[macro_use]
pub mod logger;

pub mod cli;
pub mod composer;
pub mod error;
pub mod image;
pub mod io;
pub mod layer;
pub mod ops;
pub mod raster;
pub mod reorder;
pub mod selection;
pub mod settings;
pub mod stack;

pub use crate::composer::{Composer, DefaultComposer, TiledComposer};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::image::{Image, ImageId};
pub use crate::io::{ExportFormat, ImageExporter};
pub use crate::layer::{Layer, LayerGenerator, LayerId, ParentLink};
pub use crate::ops::blend::BlendMode;
pub use crate::ops::transform::Interpolation;
pub use crate::raster::{Color, PaintMode, Raster, Rect, Size};
pub use crate::reorder::LayerReorder;
pub use crate::selection::{Anchor, Clip, Selection};
pub use crate::settings::{ComposerKind, Settings};
pub use crate::stack::LayerStack;
