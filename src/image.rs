// ============================================================================
// IMAGE – canvas size + layer stack + composer
// ============================================================================

use std::fmt;
use std::path::Path;

use uuid::Uuid;

use crate::composer::{Composer, DefaultComposer};
use crate::error::{Error, Result};
use crate::io::{self, ImageExporter};
use crate::layer::{Layer, LayerId, ParentLink};
use crate::log_info;
use crate::raster::{self, Raster, Size};
use crate::reorder::LayerReorder;
use crate::stack::LayerStack;

/// Stable identity of an image; layers record it as their parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageId(Uuid);

impl ImageId {
    pub(crate) fn new() -> Self {
        ImageId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A layered image: owns its layers and flattens them on demand.
#[derive(Debug)]
pub struct Image {
    id: ImageId,
    size: Size,
    stack: LayerStack,
    composer: Box<dyn Composer>,
}

impl Image {
    // ---- construction -------------------------------------------------------

    /// New image with a transparent "Background" layer.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let mut image = Self::blank(width, height)?;
        let mut background = Layer::new();
        background.name = String::from("Background");
        image.layer_put_top(background);
        Ok(image)
    }

    /// New image without any layers.
    pub fn blank(width: u32, height: u32) -> Result<Self> {
        raster::check_dimensions(width, height)?;
        Ok(Self {
            id: ImageId::new(),
            size: Size::new(width, height),
            stack: LayerStack::new(),
            composer: Box::new(DefaultComposer::new()),
        })
    }

    /// Wrap an existing buffer as a single-layer image of the same size.
    pub fn from_raster(raster: Raster) -> Result<Self> {
        let mut image = Self::blank(raster.width(), raster.height())?;
        image.layer_put_top(Layer::from_raster(raster));
        Ok(image)
    }

    /// Decode a file into a single-layer image named after the file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut layer = Layer::new();
        layer.import_from_file(path)?;
        let size = layer.dimensions().size();
        let mut image = Self::blank(size.width, size.height)?;
        image.layer_put_top(layer);
        Ok(image)
    }

    // ---- canvas -------------------------------------------------------------

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Change the canvas size without scaling content: every layer is
    /// cropped or extended with transparency.
    pub fn set_size(&mut self, width: u32, height: u32) -> Result<()> {
        raster::check_dimensions(width, height)?;
        self.size = Size::new(width, height);
        for layer in self.stack.iter_mut() {
            layer.canvas_resized(self.size);
        }
        Ok(())
    }

    fn link(&self) -> ParentLink {
        ParentLink { image: self.id, canvas: self.size }
    }

    // ---- layers -------------------------------------------------------------

    pub fn layer_count(&self) -> usize {
        self.stack.len()
    }

    pub fn layer_stack(&self) -> &LayerStack {
        &self.stack
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.stack.by_id(id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.stack.by_id_mut(id)
    }

    /// Layer at `index` (negative counts from the top); `None` when out of range.
    pub fn layer_by_index(&self, index: isize) -> Option<&Layer> {
        self.stack.get(index)
    }

    pub fn layer_by_index_mut(&mut self, index: isize) -> Option<&mut Layer> {
        self.stack.get_mut(index)
    }

    /// Create a cleared canvas-sized layer on top, named "Layer N".
    pub fn new_layer(&mut self) -> &mut Layer {
        let name = format!("Layer {}", self.stack.len());
        self.new_layer_named(name)
    }

    pub fn new_layer_named(&mut self, name: impl Into<String>) -> &mut Layer {
        let mut layer = Layer::with_name(name);
        layer.clear();
        let top = self.stack.len();
        let pos = self.insert_attached(top, layer);
        self.stack.at_mut(pos)
    }

    /// Attach `layer` above every other layer.
    pub fn layer_put_top(&mut self, layer: Layer) -> LayerId {
        let id = layer.id();
        let top = self.stack.len();
        self.insert_attached(top, layer);
        id
    }

    /// Attach `layer` below every other layer.
    pub fn layer_put_bottom(&mut self, layer: Layer) -> LayerId {
        let id = layer.id();
        self.insert_attached(0, layer);
        id
    }

    fn insert_attached(&mut self, index: usize, mut layer: Layer) -> usize {
        layer.attach(self.link());
        log_info!("Image {}: attaching layer '{}' at {}", self.id, layer.name, index);
        self.stack.insert(index, layer)
    }

    /// Detach and return a layer.
    pub fn remove_layer(&mut self, id: LayerId) -> Option<Layer> {
        let mut layer = self.stack.remove(id)?;
        layer.detach();
        Some(layer)
    }

    /// Z-order handle for an attached layer.
    pub fn reorder(&mut self, id: LayerId) -> Result<LayerReorder<'_>> {
        if !self.stack.contains(id) {
            return Err(Error::NotAttached);
        }
        Ok(LayerReorder::new(&mut self.stack, id))
    }

    // ---- composition --------------------------------------------------------

    pub fn composer(&self) -> &dyn Composer {
        self.composer.as_ref()
    }

    pub fn set_composer(&mut self, composer: impl Composer + 'static) {
        self.composer = Box::new(composer);
    }

    pub fn set_composer_boxed(&mut self, composer: Box<dyn Composer>) {
        self.composer = composer;
    }

    /// Flatten all layers with the current composer. The stack is left in
    /// place; the result is a detached copy.
    pub fn merged(&mut self) -> Result<Layer> {
        let link = self.link();
        self.composer.merge_all(&mut self.stack, link)
    }

    pub fn merged_raster(&mut self) -> Result<Raster> {
        Ok(self.merged()?.into_raster())
    }

    /// Flatten and hand the result to an exporter.
    pub fn export(&mut self) -> Result<ImageExporter> {
        Ok(ImageExporter::new(self.merged_raster()?))
    }

    pub fn data_url_png(&mut self) -> Result<String> {
        self.export()?.as_data_url(io::ExportFormat::Png, None)
    }

    pub fn data_url_jpeg(&mut self) -> Result<String> {
        self.export()?.as_data_url(io::ExportFormat::Jpeg, None)
    }
}
