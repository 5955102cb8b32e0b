//! Bottom-to-top ordered layer collection.
//!
//! Index 0 is the bottom of the stack. Negative indices count from the top
//! (`-1` is the last layer) everywhere an index is accepted.

use crate::error::{Error, Result};
use crate::layer::{Layer, LayerId};

#[derive(Debug, Default)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// All layers, bottom to top.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Layer> {
        self.layers.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Layer> {
        self.layers.iter_mut()
    }

    pub fn ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(Layer::id).collect()
    }

    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id() == id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.index_of(id).is_some()
    }

    /// Resolve a possibly negative index; `None` when out of range.
    fn resolve_lookup(&self, index: isize) -> Option<usize> {
        let count = self.layers.len() as isize;
        let idx = if index < 0 { count + index } else { index };
        (0..count).contains(&idx).then_some(idx as usize)
    }

    pub fn get(&self, index: isize) -> Option<&Layer> {
        self.resolve_lookup(index).map(|i| &self.layers[i])
    }

    pub fn get_mut(&mut self, index: isize) -> Option<&mut Layer> {
        self.resolve_lookup(index).map(|i| &mut self.layers[i])
    }

    pub fn by_id(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    pub fn by_id_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id() == id)
    }

    /// Resolve an insertion index against the current count: negatives
    /// count from the top, anything past the end clamps to an append.
    fn resolve_insert(&self, index: isize) -> Result<usize> {
        let count = self.layers.len();
        let idx = if index < 0 { count as isize + index } else { index };
        if idx < 0 {
            return Err(Error::IndexOutOfBounds { index, count });
        }
        Ok((idx as usize).min(count))
    }

    /// Insert `layer` at `index`, replacing any entry with the same id.
    /// Returns the position the layer ended up at.
    pub fn put_at(&mut self, index: isize, layer: Layer) -> Result<usize> {
        let target = self.resolve_insert(index)?;
        Ok(self.insert(target, layer))
    }

    /// [`put_at`](Self::put_at) for an already resolved, non-negative index.
    pub fn insert(&mut self, index: usize, layer: Layer) -> usize {
        if let Some(old) = self.index_of(layer.id()) {
            self.layers.remove(old);
        }
        let pos = index.min(self.layers.len());
        self.layers.insert(pos, layer);
        pos
    }

    /// Like [`put_at`](Self::put_at), but `index` is read against the stack
    /// before the layer is taken out of it: moving up past the layer's own
    /// slot lands one lower to make up for the gap.
    pub fn put_behind(&mut self, index: isize, layer: Layer) -> Result<usize> {
        let mut target = self.resolve_insert(index)?;
        if let Some(old) = self.index_of(layer.id()) {
            if target > old {
                target -= 1;
            }
            self.layers.remove(old);
        }
        let pos = target.min(self.layers.len());
        self.layers.insert(pos, layer);
        Ok(pos)
    }

    /// Move an existing layer to `index` with [`put_at`](Self::put_at) rules.
    pub fn move_to(&mut self, index: isize, id: LayerId) -> Result<usize> {
        let target = self.resolve_insert(index)?;
        let old = self.index_of(id).ok_or(Error::NotAttached)?;
        let layer = self.layers.remove(old);
        let pos = target.min(self.layers.len());
        self.layers.insert(pos, layer);
        Ok(pos)
    }

    /// Move an existing layer to `index` with [`put_behind`](Self::put_behind) rules.
    pub fn move_behind(&mut self, index: isize, id: LayerId) -> Result<usize> {
        let mut target = self.resolve_insert(index)?;
        let old = self.index_of(id).ok_or(Error::NotAttached)?;
        if target > old {
            target -= 1;
        }
        let layer = self.layers.remove(old);
        let pos = target.min(self.layers.len());
        self.layers.insert(pos, layer);
        Ok(pos)
    }

    /// Take a layer out of the stack.
    pub fn remove(&mut self, id: LayerId) -> Option<Layer> {
        let idx = self.index_of(id)?;
        Some(self.layers.remove(idx))
    }

    pub(crate) fn at_mut(&mut self, pos: usize) -> &mut Layer {
        &mut self.layers[pos]
    }
}

impl<'a> IntoIterator for &'a LayerStack {
    type Item = &'a Layer;
    type IntoIter = std::slice::Iter<'a, Layer>;

    fn into_iter(self) -> Self::IntoIter {
        self.layers.iter()
    }
}
