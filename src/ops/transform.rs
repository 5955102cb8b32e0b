// ============================================================================
// TRANSFORM OPERATIONS — resample and rotate for selection buffers
// ============================================================================

use image::imageops;

use crate::error::Result;
use crate::raster::{self, Color, Raster};

/// Interpolation method for resize operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl Interpolation {
    pub fn name(&self) -> &'static str {
        match self {
            Interpolation::Nearest  => "nearest",
            Interpolation::Bilinear => "bilinear",
            Interpolation::Bicubic  => "bicubic",
            Interpolation::Lanczos3 => "lanczos3",
        }
    }

    pub fn all() -> &'static [Interpolation] {
        &[
            Interpolation::Nearest,
            Interpolation::Bilinear,
            Interpolation::Bicubic,
            Interpolation::Lanczos3,
        ]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|i| i.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn to_filter(&self) -> imageops::FilterType {
        match self {
            Interpolation::Nearest  => imageops::FilterType::Nearest,
            Interpolation::Bilinear => imageops::FilterType::Triangle,
            Interpolation::Bicubic  => imageops::FilterType::CatmullRom,
            Interpolation::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

// ---------------------------------------------------------------------------
//  Resampling
// ---------------------------------------------------------------------------

/// Resample `src` to `new_w` × `new_h`.
pub fn resample(src: &Raster, new_w: u32, new_h: u32, interp: Interpolation) -> Raster {
    let new_w = new_w.max(1);
    let new_h = new_h.max(1);
    if src.width() == new_w && src.height() == new_h {
        return src.clone();
    }
    let resized = imageops::resize(&src.to_rgba_image(), new_w, new_h, interp.to_filter());
    let mut out = Raster::from_rgba_image(&resized);
    out.set_save_alpha(src.save_alpha());
    out
}

// ---------------------------------------------------------------------------
//  Rotation
// ---------------------------------------------------------------------------

/// Rotate `src` by `degrees` (clockwise on screen) about its centre.
///
/// The output buffer is the bounding box of the rotated rectangle; uncovered
/// corners are transparent. Fails when that box exceeds the pixel limit.
pub fn rotate(src: &Raster, degrees: f32) -> Result<Raster> {
    let (sin, cos) = (degrees as f64).to_radians().sin_cos();
    let w = src.width() as f64;
    let h = src.height() as f64;

    // Forward map: x' = x·cos − y·sin, y' = x·sin + y·cos
    let corners = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)]
        .map(|(x, y)| (x * cos - y * sin, x * sin + y * cos));
    let min_x = snap(corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min));
    let max_x = snap(corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max));
    let min_y = snap(corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min));
    let max_y = snap(corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max));

    let out_w = (max_x - min_x).ceil().clamp(1.0, u32::MAX as f64) as u32;
    let out_h = (max_y - min_y).ceil().clamp(1.0, u32::MAX as f64) as u32;
    raster::check_dimensions(out_w, out_h)?;
    let mut dst = Raster::new(out_w, out_h);
    dst.set_save_alpha(src.save_alpha());

    for dy in 0..out_h {
        let py = dy as f64 + 0.5 + min_y;
        let row = dst.row_mut(dy);
        for (dx, px_out) in row.iter_mut().enumerate() {
            let px = dx as f64 + 0.5 + min_x;
            // Inverse rotation back into source pixel-centre space.
            let sx = px * cos + py * sin - 0.5;
            let sy = -px * sin + py * cos - 0.5;
            if sx < -1.0 || sy < -1.0 || sx >= w || sy >= h {
                continue;
            }
            *px_out = bilinear_sample(src, sx as f32, sy as f32);
        }
    }
    Ok(dst)
}

/// Drop floating-point noise so exact multiples of 90° keep exact sizes.
fn snap(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

/// Bilinear interpolation sampling; outside the buffer reads as transparent.
/// Channels are premultiplied while interpolating so transparent neighbours
/// do not darken edges.
fn bilinear_sample(src: &Raster, x: f32, y: f32) -> Color {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let sample = |sx: i32, sy: i32| -> [f32; 4] {
        if !src.contains(sx, sy) {
            return [0.0; 4];
        }
        let [r, g, b, a] = src.get_pixel(sx, sy).to_rgba8().0.map(|c| c as f32);
        let k = a / 255.0;
        [r * k, g * k, b * k, a]
    };

    let tl = sample(x0, y0);
    let tr = sample(x0 + 1, y0);
    let bl = sample(x0, y0 + 1);
    let br = sample(x0 + 1, y0 + 1);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    let mut mixed = [0f32; 4];
    for c in 0..4 {
        mixed[c] = lerp(lerp(tl[c], tr[c], fx), lerp(bl[c], br[c], fx), fy);
    }
    let alpha = mixed[3];
    if alpha <= 0.0 {
        return Color::TRANSPARENT;
    }
    let unpremul = |v: f32| (v * 255.0 / alpha).round().clamp(0.0, 255.0) as u8;
    Color::from_rgba8(image::Rgba([
        unpremul(mixed[0]),
        unpremul(mixed[1]),
        unpremul(mixed[2]),
        alpha.round().clamp(0.0, 255.0) as u8,
    ]))
}
