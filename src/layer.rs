// ============================================================================
// LAYER – one named, opacity-weighted surface of an image
// ============================================================================

use std::fmt;
use std::path::Path;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::image::ImageId;
use crate::raster::{Color, PaintMode, Raster, Rect, Size};
use crate::selection::{Clip, Selection};
use crate::{io, log_info};

/// Stable identity of a layer, independent of its stack position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerId(Uuid);

impl LayerId {
    fn new() -> Self {
        LayerId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Non-owning link from a layer to the image it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParentLink {
    pub image: ImageId,
    /// Canvas size of the parent image, refreshed on every resize.
    pub canvas: Size,
}

/// Content generator invoked once per merge before the layer is read,
/// e.g. a text renderer painting into the layer.
pub trait LayerGenerator {
    fn apply(&mut self, surface: &mut Raster);
}

pub struct Layer {
    id: LayerId,
    pub name: String,
    opacity: f32,
    buffer: Raster,
    /// Logical placement on the canvas; may differ from the buffer until
    /// the next permanent transform.
    surface: Rect,
    parent: Option<ParentLink>,
    generator: Option<Box<dyn LayerGenerator>>,
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("opacity", &self.opacity)
            .field("buffer", &self.buffer)
            .field("surface", &self.surface)
            .field("parent", &self.parent)
            .field("generator", &self.generator.is_some())
            .finish()
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer {
    // ---- construction -------------------------------------------------------

    /// Detached layer with a 1×1 placeholder buffer.
    pub fn new() -> Self {
        Self::from_raster(Raster::new(1, 1))
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        let mut layer = Self::new();
        layer.name = name.into();
        layer
    }

    /// Detached layer adopting `buffer` as its content.
    pub fn from_raster(buffer: Raster) -> Self {
        Self {
            id: LayerId::new(),
            name: String::from("Layer"),
            opacity: 100.0,
            surface: buffer.rect(),
            buffer,
            parent: None,
            generator: None,
        }
    }

    /// Detached copy of this layer's pixels, name and opacity under a new id.
    pub fn duplicate(&self) -> Layer {
        Layer {
            id: LayerId::new(),
            name: self.name.clone(),
            opacity: self.opacity,
            buffer: self.buffer.clone(),
            surface: self.surface,
            parent: None,
            generator: None,
        }
    }

    // ---- properties ---------------------------------------------------------

    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Opacity in percent, always within [0, 100].
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, pct: f32) -> &mut Self {
        self.opacity = crate::ops::blend::clamp_opacity(pct);
        self
    }

    /// Physical buffer rectangle, always anchored at the origin.
    pub fn dimensions(&self) -> Rect {
        self.buffer.rect()
    }

    /// Logical placement rectangle on the canvas.
    pub fn surface_dimensions(&self) -> Rect {
        self.surface
    }

    /// Record logical placement. The buffer is not touched.
    pub fn set_surface_dimensions(&mut self, width: u32, height: u32, offset_x: i32, offset_y: i32) -> &mut Self {
        self.surface = Rect::new(offset_x, offset_y, width, height);
        self
    }

    pub fn parent(&self) -> Option<ParentLink> {
        self.parent
    }

    pub fn is_attached(&self) -> bool {
        self.parent.is_some()
    }

    /// Read access to the paint surface.
    pub fn surface(&self) -> &Raster {
        &self.buffer
    }

    /// Mutable paint surface for drawing tools.
    pub fn surface_mut(&mut self) -> &mut Raster {
        &mut self.buffer
    }

    pub fn into_raster(self) -> Raster {
        self.buffer
    }

    // ---- pixel edits --------------------------------------------------------

    /// Overwrite every pixel with `color`, alpha included.
    pub fn fill(&mut self, color: Color) -> &mut Self {
        self.buffer.fill(color);
        self
    }

    pub fn clear(&mut self) -> &mut Self {
        self.fill(Color::TRANSPARENT)
    }

    /// Blit clip content into the buffer at `(x, y)` without blending.
    pub fn paste_clip(&mut self, clip: &Clip, x: i32, y: i32) -> &mut Self {
        let src = clip.raster();
        self.buffer.copy_from(src, src.rect(), x, y, PaintMode::Replace);
        self
    }

    // ---- lifecycle ----------------------------------------------------------

    pub(crate) fn attach(&mut self, link: ParentLink) {
        self.parent = Some(link);
        self.reconcile_to(link.canvas);
    }

    pub(crate) fn detach(&mut self) {
        self.parent = None;
    }

    /// Refresh the cached canvas size and reconcile the buffer to it.
    pub(crate) fn canvas_resized(&mut self, canvas: Size) {
        if let Some(link) = self.parent.as_mut() {
            link.canvas = canvas;
            self.reconcile_to(canvas);
        }
    }

    /// Reconcile the buffer with the parent canvas: the new buffer is canvas
    /// sized and transparent, with the old content copied in at the surface
    /// offset. Afterwards the surface covers the canvas from the origin.
    pub fn transform_permanently(&mut self) -> Result<&mut Self> {
        let canvas = self.parent.ok_or(Error::NotAttached)?.canvas;
        self.reconcile_to(canvas);
        Ok(self)
    }

    fn reconcile_to(&mut self, canvas: Size) {
        let (x, y) = (self.surface.x, self.surface.y);
        if self.buffer.size() != canvas || (x, y) != (0, 0) {
            log_info!(
                "Layer '{}': reconciling buffer {} at ({}, {}) to canvas {}",
                self.name,
                self.buffer.size(),
                x,
                y,
                canvas
            );
            let mut fresh = Raster::new(canvas.width, canvas.height);
            fresh.copy_from(&self.buffer, self.buffer.rect(), x, y, PaintMode::Replace);
            fresh.set_save_alpha(self.buffer.save_alpha());
            self.buffer = fresh;
        }
        self.surface = Rect::new(0, 0, canvas.width, canvas.height);
    }

    // ---- import -------------------------------------------------------------

    /// Adopt `buffer` as this layer's content. Attached layers reconcile to
    /// the canvas immediately.
    pub fn import_from_raster(&mut self, buffer: Raster) -> Result<&mut Self> {
        self.surface = buffer.rect();
        self.buffer = buffer;
        if self.parent.is_some() {
            self.transform_permanently()?;
        }
        Ok(self)
    }

    /// Decode an image file into this layer and name the layer after it.
    pub fn import_from_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        let raster = io::decode_file(path)?;
        if let Some(base) = path.file_name() {
            self.name = base.to_string_lossy().into_owned();
        }
        self.import_from_raster(raster)
    }

    // ---- selections ---------------------------------------------------------

    pub fn select(&mut self, x: i32, y: i32, width: u32, height: u32) -> Selection<'_> {
        Selection::new(self, Rect::new(x, y, width, height))
    }

    /// Select the entire buffer.
    pub fn select_whole(&mut self) -> Selection<'_> {
        let rect = self.dimensions();
        Selection::new(self, rect)
    }

    /// Select the logical placement rectangle.
    pub fn select_surface(&mut self) -> Selection<'_> {
        let rect = self.surface;
        Selection::new(self, rect)
    }

    // ---- content generator --------------------------------------------------

    pub fn set_generator(&mut self, generator: Box<dyn LayerGenerator>) -> &mut Self {
        self.generator = Some(generator);
        self
    }

    pub fn take_generator(&mut self) -> Option<Box<dyn LayerGenerator>> {
        self.generator.take()
    }

    /// Run the attached generator against the paint surface. Returns whether
    /// one was present.
    pub fn render(&mut self) -> bool {
        match self.generator.as_mut() {
            Some(generator) => {
                generator.apply(&mut self.buffer);
                true
            }
            None => false,
        }
    }
}
