// ============================================================================
// RASTER – packed 7-bit-alpha pixel buffer used by every layer
// ============================================================================

use std::collections::VecDeque;
use std::fmt;

use image::{Rgba, RgbaImage};

use crate::error::{Error, Result};
use crate::log_warn;

/// Largest buffer we are willing to allocate (~256 megapixels).
pub const MAX_PIXELS: u64 = 256_000_000;

/// Reject empty sizes and sizes above [`MAX_PIXELS`].
pub fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::invalid(format!("size must be positive, got {width}×{height}")));
    }
    if width as u64 * height as u64 > MAX_PIXELS {
        return Err(Error::invalid(format!(
            "{width}×{height} exceeds the {MAX_PIXELS} pixel limit"
        )));
    }
    Ok(())
}

// ============================================================================
// GEOMETRY
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}", self.width, self.height)
    }
}

/// Axis-aligned rectangle; `x`/`y` may be negative (partially off-canvas).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle of `size` anchored at the origin.
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width as i32)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height as i32)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Overlapping area of two rectangles, `None` when they do not touch.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        (x1 > x0 && y1 > y0).then(|| Rect::new(x0, y0, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

// ============================================================================
// COLOR
// ============================================================================

/// Highest 7-bit alpha value (fully transparent).
pub const ALPHA_TRANSPARENT: u8 = 127;

/// Packed ARGB pixel: 8-bit RGB, 7-bit alpha in bits 24..30.
///
/// Alpha runs the "wrong" way compared to most toolkits: `0` is opaque and
/// `127` is fully transparent. Bit 31 is always zero.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color(u32);

impl Color {
    /// The canonical fully-transparent sentinel.
    pub const TRANSPARENT: Color = Color(0x7F00_0000);
    pub const BLACK: Color = Color(0x0000_0000);
    pub const WHITE: Color = Color(0x00FF_FFFF);
    pub const RED: Color = Color(0x00FF_0000);

    pub const fn from_argb(packed: u32) -> Self {
        Color(packed & 0x7FFF_FFFF)
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Build a colour with a 7-bit alpha; values above 127 are clamped.
    pub const fn rgba(r: u8, g: u8, b: u8, alpha: u8) -> Self {
        let a = if alpha > ALPHA_TRANSPARENT { ALPHA_TRANSPARENT } else { alpha };
        Color(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub const fn argb(self) -> u32 {
        self.0
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// 7-bit alpha, 0 = opaque, 127 = transparent.
    pub const fn alpha(self) -> u8 {
        ((self.0 >> 24) & 0x7F) as u8
    }

    pub const fn with_alpha(self, alpha: u8) -> Self {
        Color::rgba(self.red(), self.green(), self.blue(), alpha)
    }

    pub const fn is_opaque(self) -> bool {
        self.alpha() == 0
    }

    pub const fn is_transparent(self) -> bool {
        self.alpha() == ALPHA_TRANSPARENT
    }

    /// Normalized coverage in [0, 1]: 1.0 for opaque, 0.0 for transparent.
    pub fn coverage(self) -> f32 {
        (ALPHA_TRANSPARENT - self.alpha()) as f32 / ALPHA_TRANSPARENT as f32
    }

    pub fn to_rgba8(self) -> Rgba<u8> {
        let a7 = self.alpha();
        let a8 = 255 - ((a7 << 1) + (a7 >> 6));
        Rgba([self.red(), self.green(), self.blue(), a8])
    }

    pub fn from_rgba8(px: Rgba<u8>) -> Self {
        let [r, g, b, a8] = px.0;
        Color::rgba(r, g, b, ALPHA_TRANSPARENT - (a8 >> 1))
    }
}

impl From<u32> for Color {
    fn from(packed: u32) -> Self {
        Color::from_argb(packed)
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color(0x{:08X})", self.0)
    }
}

/// How a painted colour combines with what is already in the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PaintMode {
    /// Alpha-blend the new colour over the existing pixel.
    #[default]
    Blend,
    /// Overwrite the pixel, alpha channel included.
    Replace,
}

/// Integer "source over" blend of `src` onto `dst` in 7-bit alpha space.
///
/// Fast paths: an opaque source wins outright, a transparent source leaves
/// the destination alone and a transparent destination takes the source.
#[inline]
pub fn alpha_blend(dst: Color, src: Color) -> Color {
    let sa = src.alpha() as i32;
    if sa == 0 {
        return src;
    }
    if sa == ALPHA_TRANSPARENT as i32 {
        return dst;
    }
    let da = dst.alpha() as i32;
    if da == ALPHA_TRANSPARENT as i32 {
        return src;
    }

    let src_weight = 127 - sa;
    let dst_weight = (127 - da) * sa / 127;
    let total = src_weight + dst_weight;
    let alpha = sa * da / 127;

    let mix = |s: u8, d: u8| ((s as i32 * src_weight + d as i32 * dst_weight) / total) as u8;
    Color::rgba(
        mix(src.red(), dst.red()),
        mix(src.green(), dst.green()),
        mix(src.blue(), dst.blue()),
        alpha as u8,
    )
}

// ============================================================================
// RASTER
// ============================================================================

/// Row-major grid of [`Color`] pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
    save_alpha: bool,
}

impl fmt::Debug for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("save_alpha", &self.save_alpha)
            .finish_non_exhaustive()
    }
}

impl Raster {
    // ---- construction -------------------------------------------------------

    /// Create a fully transparent raster.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Color::TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let (width, height) = {
            let total = width as u64 * height as u64;
            if total > MAX_PIXELS || width == 0 || height == 0 {
                log_warn!("Raster::new: dimensions {}×{} out of range, clamped to 1×1", width, height);
                (1, 1)
            } else {
                (width, height)
            }
        };
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
            save_alpha: true,
        }
    }

    /// Wrap an existing pixel vector; its length must equal `width * height`.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Color>) -> Result<Self> {
        if width == 0 || height == 0 || pixels.len() != width as usize * height as usize {
            return Err(Error::invalid(format!(
                "{} pixels do not describe a {}×{} raster",
                pixels.len(),
                width,
                height
            )));
        }
        Ok(Self { width, height, pixels, save_alpha: true })
    }

    pub fn from_rgba_image(src: &RgbaImage) -> Self {
        if src.width() == 0 || src.height() == 0 {
            return Self::new(1, 1);
        }
        let pixels = src.pixels().map(|px| Color::from_rgba8(*px)).collect();
        Self {
            width: src.width(),
            height: src.height(),
            pixels,
            save_alpha: true,
        }
    }

    /// Convert to an 8-bit RGBA image, alpha preserved.
    pub fn to_rgba_image(&self) -> RgbaImage {
        self.rgba_image(true)
    }

    /// Convert for encoding: when alpha saving is off every pixel comes out
    /// opaque.
    pub fn to_export_image(&self) -> RgbaImage {
        self.rgba_image(self.save_alpha)
    }

    fn rgba_image(&self, keep_alpha: bool) -> RgbaImage {
        let mut raw = Vec::with_capacity(self.pixels.len() * 4);
        for px in &self.pixels {
            let mut rgba = px.to_rgba8();
            if !keep_alpha {
                rgba.0[3] = 255;
            }
            raw.extend_from_slice(&rgba.0);
        }
        RgbaImage::from_raw(self.width, self.height, raw)
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    // ---- accessors ----------------------------------------------------------

    pub fn width(&self) -> u32 { self.width }

    pub fn height(&self) -> u32 { self.height }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// The full buffer rectangle `{0, 0, w, h}`.
    pub fn rect(&self) -> Rect {
        Rect::from_size(self.size())
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Color] {
        &mut self.pixels
    }

    pub fn row(&self, y: u32) -> &[Color] {
        let start = y as usize * self.width as usize;
        &self.pixels[start..start + self.width as usize]
    }

    pub fn row_mut(&mut self, y: u32) -> &mut [Color] {
        let start = y as usize * self.width as usize;
        let end = start + self.width as usize;
        &mut self.pixels[start..end]
    }

    pub fn save_alpha(&self) -> bool {
        self.save_alpha
    }

    pub fn set_save_alpha(&mut self, save: bool) {
        self.save_alpha = save;
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    // ---- pixel access -------------------------------------------------------

    /// Read a pixel; out-of-bounds reads are transparent.
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Color {
        if !self.contains(x, y) {
            return Color::TRANSPARENT;
        }
        self.pixels[self.index(x as u32, y as u32)]
    }

    /// Overwrite a pixel. Out-of-bounds writes are ignored.
    #[inline]
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Color) {
        self.paint_pixel(x, y, color, PaintMode::Replace);
    }

    /// Blend a colour over a pixel. Out-of-bounds writes are ignored.
    #[inline]
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Color) {
        self.paint_pixel(x, y, color, PaintMode::Blend);
    }

    #[inline]
    pub fn paint_pixel(&mut self, x: i32, y: i32, color: Color, mode: PaintMode) {
        if !self.contains(x, y) {
            return;
        }
        let idx = self.index(x as u32, y as u32);
        let slot = &mut self.pixels[idx];
        *slot = match mode {
            PaintMode::Replace => color,
            PaintMode::Blend => alpha_blend(*slot, color),
        };
    }

    // ---- bulk operations ----------------------------------------------------

    /// Set every pixel to `color`, alpha included.
    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Paint `color` into `rect`, clipped to the buffer.
    pub fn fill_rect(&mut self, rect: Rect, color: Color, mode: PaintMode) {
        let Some(clip) = rect.intersect(&self.rect()) else { return };
        for y in clip.y..clip.bottom() {
            let start = self.index(clip.x as u32, y as u32);
            let row = &mut self.pixels[start..start + clip.width as usize];
            match mode {
                PaintMode::Replace => row.fill(color),
                PaintMode::Blend => row.iter_mut().for_each(|px| *px = alpha_blend(*px, color)),
            }
        }
    }

    /// Paint the 4-connected region sharing the seed pixel's colour.
    pub fn flood_fill(&mut self, x: i32, y: i32, color: Color, mode: PaintMode) {
        if !self.contains(x, y) {
            return;
        }
        let seed = self.get_pixel(x, y);
        let target = match mode {
            PaintMode::Replace => color,
            PaintMode::Blend => alpha_blend(seed, color),
        };
        if target == seed {
            return;
        }

        let mut queue = VecDeque::new();
        queue.push_back((x, y));
        while let Some((px, py)) = queue.pop_front() {
            if !self.contains(px, py) {
                continue;
            }
            let idx = self.index(px as u32, py as u32);
            if self.pixels[idx] != seed {
                continue;
            }
            self.pixels[idx] = target;
            queue.push_back((px - 1, py));
            queue.push_back((px + 1, py));
            queue.push_back((px, py - 1));
            queue.push_back((px, py + 1));
        }
    }

    /// Copy `src_rect` of `src` to `(dst_x, dst_y)` in this buffer. Both
    /// sides are clipped; pixels that fall outside either buffer are skipped.
    pub fn copy_from(&mut self, src: &Raster, src_rect: Rect, dst_x: i32, dst_y: i32, mode: PaintMode) {
        let Some(clipped) = src_rect.intersect(&src.rect()) else { return };
        let shift_x = dst_x - src_rect.x;
        let shift_y = dst_y - src_rect.y;
        let Some(target) = clipped.translate(shift_x, shift_y).intersect(&self.rect()) else { return };

        let run = target.width as usize;
        for ty in target.y..target.bottom() {
            let s = src.index((target.x - shift_x) as u32, (ty - shift_y) as u32);
            let d = self.index(target.x as u32, ty as u32);
            let src_row = &src.pixels[s..s + run];
            let dst_row = &mut self.pixels[d..d + run];
            match mode {
                PaintMode::Replace => dst_row.copy_from_slice(src_row),
                PaintMode::Blend => {
                    for (dp, sp) in dst_row.iter_mut().zip(src_row) {
                        *dp = alpha_blend(*dp, *sp);
                    }
                }
            }
        }
    }

    /// Copy `rect` out into a new buffer of the same size. Parts of `rect`
    /// outside this buffer come out transparent.
    pub fn sub_raster(&self, rect: Rect) -> Raster {
        let mut out = Raster::new(rect.width, rect.height);
        out.copy_from(self, rect, 0, 0, PaintMode::Replace);
        out
    }
}
