//! User-facing z-order moves for one attached layer.

use crate::error::{Error, Result};
use crate::layer::LayerId;
use crate::stack::LayerStack;

/// Handle for moving one layer within its image's stack. Obtained from
/// [`Image::reorder`](crate::Image::reorder); every method returns the
/// layer's new index.
#[derive(Debug)]
pub struct LayerReorder<'a> {
    stack: &'a mut LayerStack,
    id: LayerId,
}

impl<'a> LayerReorder<'a> {
    pub(crate) fn new(stack: &'a mut LayerStack, id: LayerId) -> Self {
        Self { stack, id }
    }

    pub fn layer(&self) -> LayerId {
        self.id
    }

    /// Move above every other layer.
    pub fn put_top(&mut self) -> Result<usize> {
        let top = self.stack.len() as isize;
        self.stack.move_to(top, self.id)
    }

    /// Move below every other layer.
    pub fn put_bottom(&mut self) -> Result<usize> {
        self.stack.move_to(0, self.id)
    }

    /// Move directly above `target`.
    pub fn put_over(&mut self, target: LayerId) -> Result<usize> {
        let idx = self.target_index(target)?;
        self.stack.move_behind(idx as isize + 1, self.id)
    }

    /// Move directly below `target`, pushing it up.
    pub fn put_behind(&mut self, target: LayerId) -> Result<usize> {
        let idx = self.target_index(target)?;
        self.stack.move_behind(idx as isize, self.id)
    }

    /// Move to `index`, counted after the layer leaves its current slot.
    pub fn put_at(&mut self, index: isize) -> Result<usize> {
        self.stack.move_to(index, self.id)
    }

    fn target_index(&self, target: LayerId) -> Result<usize> {
        self.stack
            .index_of(target)
            .ok_or_else(|| Error::invalid(format!("layer {target} is not in this stack")))
    }
}
