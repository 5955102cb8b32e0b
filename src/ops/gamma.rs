// sRGB <-> linear-light lookup tables for gamma-correct blending.
// Built once per process and shared by every merge.

use std::sync::OnceLock;

/// Number of steps in the linear -> sRGB table (0.0001 resolution).
pub const LINEAR_STEPS: usize = 10_001;

pub struct GammaLut {
    // sRGB(0..255) -> linear (0..1)
    srgb_to_linear: [f32; 256],
    // linear(0..1) -> sRGB(0..255), index = (linear * 10000).round()
    linear_to_srgb: Box<[u8]>,
}

static SHARED: OnceLock<GammaLut> = OnceLock::new();

impl GammaLut {
    /// Build both tables.
    pub fn new() -> Self {
        let mut s2l = [0.0f32; 256];
        for (v, slot) in s2l.iter_mut().enumerate() {
            *slot = srgb_to_linear_exact(v as f32 / 255.0);
        }

        let scale = (LINEAR_STEPS - 1) as f32;
        let l2s: Box<[u8]> = (0..LINEAR_STEPS)
            .map(|i| {
                let s = linear_to_srgb_exact(i as f32 / scale);
                (s * 255.0).round().clamp(0.0, 255.0) as u8
            })
            .collect();

        Self { srgb_to_linear: s2l, linear_to_srgb: l2s }
    }

    /// Process-wide tables, built on first use.
    pub fn shared() -> &'static GammaLut {
        SHARED.get_or_init(GammaLut::new)
    }

    #[inline]
    pub fn to_linear(&self, v: u8) -> f32 {
        self.srgb_to_linear[v as usize]
    }

    #[inline]
    pub fn to_srgb(&self, l: f32) -> u8 {
        let idx = (l.clamp(0.0, 1.0) * (LINEAR_STEPS - 1) as f32).round() as usize;
        self.linear_to_srgb[idx]
    }
}

impl Default for GammaLut {
    fn default() -> Self {
        Self::new()
    }
}

fn srgb_to_linear_exact(c: f32) -> f32 {
    if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
}

fn linear_to_srgb_exact(l: f32) -> f32 {
    if l <= 0.003_130_8 { 12.92 * l } else { 1.055 * l.powf(1.0 / 2.4) - 0.055 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_round_trips() {
        let lut = GammaLut::shared();
        for v in 0..=255u8 {
            assert_eq!(lut.to_srgb(lut.to_linear(v)), v, "code {v}");
        }
    }

    #[test]
    fn endpoints_and_midpoint() {
        let lut = GammaLut::new();
        assert_eq!(lut.to_linear(0), 0.0);
        assert!((lut.to_linear(255) - 1.0).abs() < 1e-6);
        // sRGB 50% grey is roughly 21% linear light
        assert!((lut.to_linear(128) - 0.2158).abs() < 1e-3);
        assert_eq!(lut.to_srgb(-1.0), 0);
        assert_eq!(lut.to_srgb(2.0), 255);
    }

    #[test]
    fn tables_are_monotonic() {
        let lut = GammaLut::new();
        assert!((1..256).all(|v| lut.srgb_to_linear[v] > lut.srgb_to_linear[v - 1]));
        assert!(lut.linear_to_srgb.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(lut.linear_to_srgb.len(), LINEAR_STEPS);
    }
}
