// ============================================================================
// SELECTION – transformable working copy of a layer region, plus clips
// ============================================================================

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::layer::Layer;
use crate::ops::transform::{self, Interpolation};
use crate::raster::{self, Color, PaintMode, Raster, Rect, Size};

// ---------------------------------------------------------------------------
//  Clip
// ---------------------------------------------------------------------------

/// Standalone pixel snapshot used for copy/paste between selections.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clip {
    raster: Raster,
}

impl Clip {
    pub fn from_raster(raster: Raster) -> Self {
        Self { raster }
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn into_raster(self) -> Raster {
        self.raster
    }

    pub fn size(&self) -> Size {
        self.raster.size()
    }
}

// ---------------------------------------------------------------------------
//  Anchor
// ---------------------------------------------------------------------------

/// Which edges of the parent a move is measured from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Anchor {
    pub right: bool,
    pub bottom: bool,
}

impl Anchor {
    pub const TOP_LEFT: Anchor = Anchor { right: false, bottom: false };
    pub const TOP_RIGHT: Anchor = Anchor { right: true, bottom: false };
    pub const BOTTOM_LEFT: Anchor = Anchor { right: false, bottom: true };
    pub const BOTTOM_RIGHT: Anchor = Anchor { right: true, bottom: true };
}

impl FromStr for Anchor {
    type Err = Error;

    /// Parse whitespace-separated tokens such as `"bottom right"`.
    fn from_str(s: &str) -> Result<Self> {
        let mut anchor = Anchor::TOP_LEFT;
        for token in s.split_whitespace() {
            match token.to_ascii_lowercase().as_str() {
                "top" | "left" => {}
                "right" => anchor.right = true,
                "bottom" => anchor.bottom = true,
                other => return Err(Error::invalid(format!("unknown anchor token '{other}'"))),
            }
        }
        Ok(anchor)
    }
}

// ---------------------------------------------------------------------------
//  Selection
// ---------------------------------------------------------------------------

/// Rectangular region of a layer. The pixels are copied out lazily on the
/// first mutating call and written back by [`Selection::apply`].
///
/// A selection with zero width or height is empty: edits land in a scratch
/// buffer and `apply` never writes them to the layer.
#[derive(Debug)]
pub struct Selection<'a> {
    layer: &'a mut Layer,
    original: Rect,
    current: Rect,
    working: Option<Raster>,
}

impl<'a> Selection<'a> {
    pub(crate) fn new(layer: &'a mut Layer, rect: Rect) -> Self {
        Self { layer, original: rect, current: rect, working: None }
    }

    /// Where the selection currently sits on the layer.
    pub fn current_rect(&self) -> Rect {
        self.current
    }

    /// The region the pixels were copied from.
    pub fn original_rect(&self) -> Rect {
        self.original
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    pub fn is_materialized(&self) -> bool {
        self.working.is_some()
    }

    fn working(&mut self) -> &mut Raster {
        let original = self.original;
        let layer = &*self.layer;
        self.working.get_or_insert_with(|| layer.surface().sub_raster(original))
    }

    // ---- paint access -------------------------------------------------------

    /// Working buffer for drawing tools and filters.
    pub fn surface_mut(&mut self) -> &mut Raster {
        self.working()
    }

    /// Blend `color` over the whole selection.
    pub fn fill(&mut self, color: Color) -> &mut Self {
        let buf = self.working();
        let rect = buf.rect();
        buf.fill_rect(rect, color, PaintMode::Blend);
        self
    }

    /// Overwrite the whole selection with `color`, alpha included.
    pub fn fill_overwrite(&mut self, color: Color) -> &mut Self {
        self.working().fill(color);
        self
    }

    /// Blend-fill the region connected to `(x, y)` (selection coordinates).
    pub fn flood_fill(&mut self, x: i32, y: i32, color: Color) -> &mut Self {
        self.working().flood_fill(x, y, color, PaintMode::Blend);
        self
    }

    pub fn flood_fill_overwrite(&mut self, x: i32, y: i32, color: Color) -> &mut Self {
        self.working().flood_fill(x, y, color, PaintMode::Replace);
        self
    }

    // ---- geometry -----------------------------------------------------------

    /// Place the selection at `(x, y)` measured from the anchored edges of
    /// the layer buffer.
    pub fn move_to(&mut self, x: i32, y: i32, anchor: Anchor) -> &mut Self {
        self.working();
        let parent = self.layer.dimensions();
        let mut nx = x;
        let mut ny = y;
        if anchor.right {
            nx += parent.width as i32 - self.current.width as i32;
        }
        if anchor.bottom {
            ny += parent.height as i32 - self.current.height as i32;
        }
        self.current.x = nx;
        self.current.y = ny;
        self
    }

    pub fn move_offset(&mut self, dx: i32, dy: i32) -> &mut Self {
        self.working();
        self.current = self.current.translate(dx, dy);
        self
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<&mut Self> {
        self.resize_with(width, height, Interpolation::default())
    }

    /// Resample the working buffer to `width` × `height`.
    pub fn resize_with(&mut self, width: u32, height: u32, interp: Interpolation) -> Result<&mut Self> {
        raster::check_dimensions(width, height)?;
        if self.is_empty() {
            return Err(Error::invalid("cannot resize an empty selection"));
        }
        let buf = self.working();
        *buf = transform::resample(buf, width, height, interp);
        self.current.width = width;
        self.current.height = height;
        Ok(self)
    }

    /// Rotate about the centre; the offset moves so the centre stays put.
    pub fn rotate(&mut self, degrees: f32) -> Result<&mut Self> {
        if self.is_empty() {
            return Ok(self);
        }
        let buf = self.working();
        let rotated = transform::rotate(buf, degrees)?;
        let (old_w, old_h) = (self.current.width as i32, self.current.height as i32);
        let (new_w, new_h) = (rotated.width(), rotated.height());
        self.working = Some(rotated);
        self.current.x += (old_w - new_w as i32) / 2;
        self.current.y += (old_h - new_h as i32) / 2;
        self.current.width = new_w;
        self.current.height = new_h;
        Ok(self)
    }

    // ---- clips --------------------------------------------------------------

    pub fn copy_clip(&mut self) -> Clip {
        Clip::from_raster(self.working().clone())
    }

    /// Blit clip content into the working buffer at `(x, y)`, no blending.
    pub fn paste_clip(&mut self, clip: &Clip, x: i32, y: i32) -> &mut Self {
        let src = clip.raster();
        self.working().copy_from(src, src.rect(), x, y, PaintMode::Replace);
        self
    }

    // ---- commit -------------------------------------------------------------

    /// Write the working buffer back: blank the original region, paste at
    /// the current one. A selection that was never touched is left alone.
    pub fn apply(&mut self) -> &mut Self {
        let Some(buf) = self.working.take() else { return self };
        if self.is_empty() {
            return self;
        }
        let surface = self.layer.surface_mut();
        surface.fill_rect(self.original, Color::TRANSPARENT, PaintMode::Replace);
        surface.copy_from(&buf, buf.rect(), self.current.x, self.current.y, PaintMode::Blend);
        let size = surface.size();
        self.layer.set_surface_dimensions(size.width, size.height, 0, 0);
        self.current = Rect::new(self.current.x, self.current.y, buf.width(), buf.height());
        self.original = self.current;
        self
    }
}
