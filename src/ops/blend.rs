// ============================================================================
// OPACITY MERGE – top-over-bottom compositing of one layer onto an accumulator
// ============================================================================

use crate::ops::gamma::GammaLut;
use crate::raster::{alpha_blend, Color, PaintMode, Raster, Rect, ALPHA_TRANSPARENT};

/// Colour space the in-between opacities are blended in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Scale the source alpha, then blend in encoded sRGB.
    #[default]
    Linear,
    /// Blend in linear light through the shared gamma tables.
    Gamma,
}

/// Clamp a percent opacity into [0, 100]; NaN counts as 0.
pub fn clamp_opacity(opacity: f32) -> f32 {
    if opacity.is_nan() { 0.0 } else { opacity.clamp(0.0, 100.0) }
}

/// Merge `src_rect` of `src` onto `dst` at `(dst_x, dst_y)` with a percent
/// opacity.
///
/// * `0` leaves `dst` untouched.
/// * `100` is a plain alpha-blended copy.
/// * Anything in between goes through `mode`.
pub fn merge_with_opacity(
    dst: &mut Raster,
    src: &Raster,
    src_rect: Rect,
    dst_x: i32,
    dst_y: i32,
    opacity: f32,
    mode: BlendMode,
) {
    let pct = clamp_opacity(opacity);
    if pct <= 0.0 {
        return;
    }
    if pct >= 100.0 {
        dst.copy_from(src, src_rect, dst_x, dst_y, PaintMode::Blend);
        return;
    }
    let frac = pct / 100.0;

    let Some(clipped) = src_rect.intersect(&src.rect()) else { return };
    let shift_x = dst_x - src_rect.x;
    let shift_y = dst_y - src_rect.y;
    let Some(target) = clipped.translate(shift_x, shift_y).intersect(&dst.rect()) else { return };

    let lut = match mode {
        BlendMode::Linear => None,
        BlendMode::Gamma => Some(GammaLut::shared()),
    };
    let width = dst.width() as usize;
    let x0 = target.x as usize;
    let sx0 = (target.x - shift_x) as usize;
    let run = target.width as usize;
    let first_row = target.y as usize;

    let blend_row = |ty: usize, row: &mut [Color]| {
        let sy = (ty as i32 - shift_y) as u32;
        let src_row = &src.row(sy)[sx0..sx0 + run];
        let dst_row = &mut row[x0..x0 + run];
        match lut {
            None => {
                for (dp, sp) in dst_row.iter_mut().zip(src_row) {
                    *dp = alpha_blend(*dp, scale_alpha(*sp, frac));
                }
            }
            Some(lut) => {
                for (dp, sp) in dst_row.iter_mut().zip(src_row) {
                    *dp = gamma_blend(*dp, *sp, frac, lut);
                }
            }
        }
    };

    let rows = &mut dst.pixels_mut()[first_row * width..target.bottom() as usize * width];

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        rows.par_chunks_mut(width)
            .enumerate()
            .for_each(|(i, row)| blend_row(first_row + i, row));
    }
    #[cfg(not(feature = "parallel"))]
    for (i, row) in rows.chunks_mut(width).enumerate() {
        blend_row(first_row + i, row);
    }
}

/// Scale a pixel's coverage by `frac`, leaving RGB untouched.
#[inline]
pub fn scale_alpha(src: Color, frac: f32) -> Color {
    let coverage = (ALPHA_TRANSPARENT - src.alpha()) as f32 * frac;
    src.with_alpha(ALPHA_TRANSPARENT - coverage.round().clamp(0.0, 127.0) as u8)
}

/// Composite `src` at `frac` of its coverage over `dst` in linear light.
///
/// Alpha combines Porter-Duff "over": `o3 = o1 * (1 - o2) + o2`, where `o1`
/// is the destination coverage and `o2` the source coverage scaled by
/// `frac`. Each channel is weighted by its share of `o3`.
#[inline]
pub fn gamma_blend(dst: Color, src: Color, frac: f32, lut: &GammaLut) -> Color {
    if src.is_transparent() || frac <= 0.0 {
        return dst;
    }
    let o1 = dst.coverage();
    let o2 = src.coverage() * frac.min(1.0);
    let o3 = o1 * (1.0 - o2) + o2;
    let w_src = o2 / o3;
    let w_dst = o1 * (1.0 - o2) / o3;

    let mix = |d: u8, s: u8| lut.to_srgb(lut.to_linear(d) * w_dst + lut.to_linear(s) * w_src);
    let alpha = 127.0 - (o3 * 127.0).round();
    Color::rgba(
        mix(dst.red(), src.red()),
        mix(dst.green(), src.green()),
        mix(dst.blue(), src.blue()),
        alpha.clamp(0.0, 127.0) as u8,
    )
}
