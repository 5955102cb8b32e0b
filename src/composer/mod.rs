// ============================================================================
// COMPOSERS – strategies that flatten a layer stack into one layer
// ============================================================================

mod default;
pub mod label;
mod tiled;

pub use default::DefaultComposer;
pub use tiled::TiledComposer;

use std::fmt;

use crate::error::Result;
use crate::layer::{Layer, ParentLink};
use crate::stack::LayerStack;

/// Flattening strategy used by [`Image::merged`](crate::Image::merged).
pub trait Composer: fmt::Debug {
    fn name(&self) -> &'static str;

    /// Pre-processing pass run on every layer before any pixels are read.
    fn preprocess(&self, layer: &mut Layer) {
        layer.render();
    }

    /// Flatten `stack` onto a canvas. The result carries `canvas` as its
    /// parent but is not inserted into any stack.
    fn merge_all(&self, stack: &mut LayerStack, canvas: ParentLink) -> Result<Layer>;
}

/// Run the pre-processing hook over every layer, bottom to top.
pub(crate) fn preprocess_all<C: Composer + ?Sized>(composer: &C, stack: &mut LayerStack) {
    for layer in stack.iter_mut() {
        composer.preprocess(layer);
    }
}
