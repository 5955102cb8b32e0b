use std::time::Instant;

use crate::composer::{preprocess_all, Composer};
use crate::error::Result;
use crate::layer::{Layer, ParentLink};
use crate::log_info;
use crate::ops::blend::{merge_with_opacity, BlendMode};
use crate::raster::Raster;
use crate::stack::LayerStack;

/// Alpha-accurate blend-down compositor.
///
/// Layers are folded bottom to top onto a transparent canvas-sized
/// accumulator, each at its own opacity.
#[derive(Clone, Debug, Default)]
pub struct DefaultComposer {
    /// Blend in-between opacities in linear light instead of sRGB.
    pub gamma_blending: bool,
}

impl DefaultComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gamma_blending(gamma_blending: bool) -> Self {
        Self { gamma_blending }
    }

    pub fn blend_mode(&self) -> BlendMode {
        if self.gamma_blending { BlendMode::Gamma } else { BlendMode::Linear }
    }
}

impl Composer for DefaultComposer {
    fn name(&self) -> &'static str {
        "default"
    }

    fn merge_all(&self, stack: &mut LayerStack, canvas: ParentLink) -> Result<Layer> {
        let started = Instant::now();
        preprocess_all(self, stack);
        let size = canvas.canvas;

        // A lone layer is already the answer once it matches the canvas.
        if stack.len() == 1
            && let Some(only) = stack.get_mut(0)
        {
            if only.is_attached() && only.dimensions().size() != size {
                only.canvas_resized(size);
            }
            let mut out = only.duplicate();
            out.surface_mut().set_save_alpha(true);
            out.attach(canvas);
            return Ok(out);
        }

        let mode = self.blend_mode();
        let mut acc = Raster::new(size.width, size.height);
        for layer in stack.iter() {
            let src = layer.surface();
            merge_with_opacity(&mut acc, src, src.rect(), 0, 0, layer.opacity(), mode);
        }
        acc.set_save_alpha(true);

        log_info!(
            "DefaultComposer: merged {} layers onto {} ({:?}) in {:.1}ms",
            stack.len(),
            size,
            mode,
            started.elapsed().as_secs_f64() * 1000.0
        );

        let mut out = Layer::from_raster(acc);
        out.name = String::from("Merged");
        out.attach(canvas);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageId;
    use crate::layer::LayerGenerator;
    use crate::raster::{Color, PaintMode, Rect, Size};

    fn link(w: u32, h: u32) -> ParentLink {
        ParentLink { image: ImageId::new(), canvas: Size::new(w, h) }
    }

    fn push(stack: &mut LayerStack, canvas: ParentLink, fill: Color, opacity: f32) {
        let mut layer = Layer::new();
        layer.attach(canvas);
        layer.fill(fill).set_opacity(opacity);
        stack.put_at(stack.len() as isize, layer).unwrap();
    }

    #[test]
    fn empty_stack_gives_transparent_canvas() {
        let canvas = link(6, 4);
        let out = DefaultComposer::new().merge_all(&mut LayerStack::new(), canvas).unwrap();
        assert_eq!(out.dimensions(), Rect::new(0, 0, 6, 4));
        assert!(out.surface().pixels().iter().all(|p| p.is_transparent()));
        assert_eq!(out.parent(), Some(canvas));
    }

    #[test]
    fn single_layer_is_returned_unchanged() {
        let canvas = link(5, 5);
        let mut stack = LayerStack::new();
        push(&mut stack, canvas, Color::from_argb(0x2011_2233), 30.0);
        let out = DefaultComposer::new().merge_all(&mut stack, canvas).unwrap();
        assert_eq!(out.surface(), stack.layers()[0].surface());
        assert_ne!(out.id(), stack.layers()[0].id());
    }

    #[test]
    fn single_layer_is_reconciled_first() {
        let mut stack = LayerStack::new();
        push(&mut stack, link(5, 5), Color::RED, 100.0);
        let bigger = link(8, 8);
        let out = DefaultComposer::new().merge_all(&mut stack, bigger).unwrap();
        assert_eq!(out.dimensions().size(), Size::new(8, 8));
        assert_eq!(stack.layers()[0].dimensions().size(), Size::new(8, 8));
        assert_eq!(out.surface().get_pixel(4, 4), Color::RED);
        assert!(out.surface().get_pixel(6, 6).is_transparent());
    }

    #[test]
    fn zero_opacity_layer_is_invisible() {
        let canvas = link(4, 4);
        let mut with = LayerStack::new();
        push(&mut with, canvas, Color::RED, 100.0);
        push(&mut with, canvas, Color::WHITE, 0.0);
        push(&mut with, canvas, Color::from_argb(0x4000_00FF), 60.0);

        let mut without = LayerStack::new();
        push(&mut without, canvas, Color::RED, 100.0);
        push(&mut without, canvas, Color::from_argb(0x4000_00FF), 60.0);

        let composer = DefaultComposer::new();
        let a = composer.merge_all(&mut with, canvas).unwrap();
        let b = composer.merge_all(&mut without, canvas).unwrap();
        assert_eq!(a.surface(), b.surface());
    }

    #[test]
    fn full_opacity_stack_matches_plain_copies() {
        let canvas = link(4, 4);
        let mut stack = LayerStack::new();
        push(&mut stack, canvas, Color::RED, 100.0);
        push(&mut stack, canvas, Color::from_argb(0x3F00_00FF), 100.0);
        let out = DefaultComposer::new().merge_all(&mut stack, canvas).unwrap();

        let mut expected = Raster::new(4, 4);
        for layer in stack.iter() {
            expected.copy_from(layer.surface(), layer.dimensions(), 0, 0, PaintMode::Blend);
        }
        assert_eq!(out.surface(), &expected);
        assert_eq!(out.name, "Merged");
    }

    #[test]
    fn gamma_flag_switches_blend_mode() {
        let canvas = link(2, 2);
        let build = || {
            let mut stack = LayerStack::new();
            push(&mut stack, canvas, Color::RED, 100.0);
            push(&mut stack, canvas, Color::rgb(0, 255, 0), 50.0);
            stack
        };
        let lin = DefaultComposer::new().merge_all(&mut build(), canvas).unwrap();
        let gam = DefaultComposer::with_gamma_blending(true).merge_all(&mut build(), canvas).unwrap();
        assert!(gam.surface().get_pixel(0, 0).red() > lin.surface().get_pixel(0, 0).red());
        assert_eq!(DefaultComposer::with_gamma_blending(true).blend_mode(), BlendMode::Gamma);
    }

    #[derive(Debug)]
    struct Corner;

    impl LayerGenerator for Corner {
        fn apply(&mut self, surface: &mut Raster) {
            surface.put_pixel(0, 0, Color::WHITE);
        }
    }

    #[test]
    fn generators_run_before_merge() {
        let canvas = link(3, 3);
        let mut stack = LayerStack::new();
        push(&mut stack, canvas, Color::TRANSPARENT, 100.0);
        push(&mut stack, canvas, Color::TRANSPARENT, 100.0);
        stack.get_mut(-1).unwrap().set_generator(Box::new(Corner));
        let out = DefaultComposer::new().merge_all(&mut stack, canvas).unwrap();
        assert_eq!(out.surface().get_pixel(0, 0), Color::WHITE);
    }
}
