use crate::composer::label::draw_text;
use crate::composer::{preprocess_all, Composer};
use crate::error::Result;
use crate::layer::{Layer, ParentLink};
use crate::log_info;
use crate::ops::transform::{resample, Interpolation};
use crate::raster::{Color, PaintMode, Raster, Rect};
use crate::stack::LayerStack;

const GRID_COLOR: Color = Color::RED;

/// Debug view: every layer shrunk into its own cell of a square grid,
/// labelled with its name and opacity. No blending between layers.
#[derive(Clone, Debug, Default)]
pub struct TiledComposer {
    pub interpolation: Interpolation,
}

impl TiledComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cells per row and column for `count` layers.
    pub fn grid_size(count: usize) -> u32 {
        (count as f64).sqrt().ceil() as u32
    }

    fn label_for(layer: &Layer) -> String {
        let opacity = layer.opacity();
        if opacity != 100.0 {
            format!("{} ({:.0}%)", layer.name, opacity)
        } else {
            layer.name.clone()
        }
    }
}

impl Composer for TiledComposer {
    fn name(&self) -> &'static str {
        "tiled"
    }

    fn merge_all(&self, stack: &mut LayerStack, canvas: ParentLink) -> Result<Layer> {
        preprocess_all(self, stack);
        let size = canvas.canvas;
        let mut acc = Raster::new(size.width, size.height);
        let count = stack.len();

        if count > 0 {
            let grid = Self::grid_size(count);
            let tile_w = size.width as f64 / grid as f64;
            let tile_h = size.height as f64 / grid as f64;

            for (i, layer) in stack.iter().enumerate() {
                let col = (i as u32 % grid) as f64;
                let row = (i as u32 / grid) as f64;
                let x = (col * tile_w).round() as i32;
                let y = (row * tile_h).round() as i32;

                let dims = layer.dimensions();
                let w = (dims.width as f64 / grid as f64).round().max(1.0) as u32;
                let h = (dims.height as f64 / grid as f64).round().max(1.0) as u32;
                let thumb = resample(layer.surface(), w, h, self.interpolation);
                acc.copy_from(&thumb, thumb.rect(), x, y, PaintMode::Blend);

                let label = Self::label_for(layer);
                let cell_bottom = y + tile_h.round() as i32;
                draw_text(&mut acc, x + 3, cell_bottom - 16, &label, Color::BLACK);
                draw_text(&mut acc, x + 2, cell_bottom - 17, &label, Color::WHITE);
            }

            for i in 1..grid {
                let gx = (i as f64 * tile_w).round() as i32;
                let gy = (i as f64 * tile_h).round() as i32;
                acc.fill_rect(Rect::new(gx, 0, 1, size.height), GRID_COLOR, PaintMode::Replace);
                acc.fill_rect(Rect::new(0, gy, size.width, 1), GRID_COLOR, PaintMode::Replace);
            }
            log_info!("TiledComposer: laid out {} layers on a {}×{} grid", count, grid, grid);
        }

        acc.set_save_alpha(true);
        let mut out = Layer::from_raster(acc);
        out.name = String::from("Tiled view");
        out.attach(canvas);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageId;
    use crate::raster::Size;

    fn stack_of(n: usize, canvas: ParentLink) -> LayerStack {
        let mut stack = LayerStack::new();
        for i in 0..n {
            let mut layer = Layer::with_name(format!("L{i}"));
            layer.attach(canvas);
            layer.fill(Color::rgb(0, 0, 200));
            stack.put_at(i as isize, layer).unwrap();
        }
        stack
    }

    #[test]
    fn grid_size_is_ceil_sqrt() {
        assert_eq!(TiledComposer::grid_size(1), 1);
        assert_eq!(TiledComposer::grid_size(4), 2);
        assert_eq!(TiledComposer::grid_size(5), 3);
        assert_eq!(TiledComposer::grid_size(9), 3);
        assert_eq!(TiledComposer::grid_size(10), 4);
    }

    #[test]
    fn labels_include_opacity_when_not_full() {
        let mut layer = Layer::with_name("ink");
        assert_eq!(TiledComposer::label_for(&layer), "ink");
        layer.set_opacity(25.0);
        assert_eq!(TiledComposer::label_for(&layer), "ink (25%)");
    }

    #[test]
    fn four_layers_make_a_two_by_two_grid() {
        let canvas = ParentLink { image: ImageId::new(), canvas: Size::new(100, 80) };
        let mut stack = stack_of(4, canvas);
        let out = TiledComposer::new().merge_all(&mut stack, canvas).unwrap();
        let s = out.surface();
        assert_eq!(s.size(), Size::new(100, 80));
        // separators
        assert_eq!(s.get_pixel(50, 5), Color::RED);
        assert_eq!(s.get_pixel(5, 40), Color::RED);
        // thumbnails fill each cell interior
        assert_eq!(s.get_pixel(10, 5), Color::rgb(0, 0, 200));
        assert_eq!(s.get_pixel(60, 45), Color::rgb(0, 0, 200));
        // white label text somewhere in the first cell's lower strip
        let lit = (0..50).any(|x| (23..40).any(|y| s.get_pixel(x, y) == Color::WHITE));
        assert!(lit);
    }

    #[test]
    fn empty_stack_is_blank() {
        let canvas = ParentLink { image: ImageId::new(), canvas: Size::new(10, 10) };
        let out = TiledComposer::new().merge_all(&mut LayerStack::new(), canvas).unwrap();
        assert!(out.surface().pixels().iter().all(|p| p.is_transparent()));
    }
}
