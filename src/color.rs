//! RGBA colour shared by textures, materials and render commands.

use serde::{Deserialize, Serialize};
use std::fmt;

/// RGBA color representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Create new color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Opaque colour from `0xRRGGBB`.
    #[must_use]
    pub const fn from_hex(hex: u32) -> Self {
        Self::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// Colour with a fractional alpha, as in CSS `rgba()`.
    #[must_use]
    pub fn rgba(r: u8, g: u8, b: u8, alpha: f64) -> Self {
        Self::new(r, g, b, unit_to_byte(alpha))
    }

    /// Same colour with a new fractional alpha.
    #[must_use]
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self { a: unit_to_byte(alpha), ..self }
    }

    /// Alpha in `[0, 1]`.
    #[must_use]
    pub fn alpha(self) -> f64 {
        f64::from(self.a) / 255.0
    }

    /// `0xRRGGBB`, alpha dropped.
    #[must_use]
    pub const fn to_hex(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Channels as `[0, 1]` floats.
    #[must_use]
    pub fn to_unit(self) -> [f64; 4] {
        [
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
            self.alpha(),
        ]
    }

    /// Hue, saturation and lightness, each in `[0, 1]`.
    #[must_use]
    pub fn to_hsl(self) -> (f64, f64, f64) {
        let [r, g, b, _] = self.to_unit();
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        if (max - min).abs() < f64::EPSILON {
            return (0.0, 0.0, l);
        }

        let d = max - min;
        let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
        let h = if (max - r).abs() < f64::EPSILON {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if (max - g).abs() < f64::EPSILON {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };

        (h / 6.0, s, l)
    }

    /// Opaque colour from hue, saturation and lightness in `[0, 1]`.
    ///
    /// Hue wraps; saturation and lightness are clamped.
    #[must_use]
    pub fn from_hsl(h: f64, s: f64, l: f64) -> Self {
        let h = h.rem_euclid(1.0);
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);

        if s <= 0.0 {
            let v = unit_to_byte(l);
            return Self::rgb(v, v, v);
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Self::rgb(
            unit_to_byte(hue_to_channel(p, q, h + 1.0 / 3.0)),
            unit_to_byte(hue_to_channel(p, q, h)),
            unit_to_byte(hue_to_channel(p, q, h - 1.0 / 3.0)),
        )
    }

    /// Component-wise interpolation, alpha included.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    // Named scene colours
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const SOLAR_GOLD: Self = Self::from_hex(0xd4_af37);
    pub const SPINE: Self = Self::from_hex(0xff_cc00);
    pub const POLE: Self = Self::from_hex(0xff_3333);
    pub const RING: Self = Self::from_hex(0xcf_b53b);
    pub const MOON: Self = Self::from_hex(0x88_8888);
    pub const MOON_ORBIT: Self = Self::from_hex(0x55_5555);
    pub const FOG: Self = Self::from_hex(0x0f_1419);
    pub const AMBIENT: Self = Self::from_hex(0x40_4040);
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:06x}", self.to_hex())
        } else {
            write!(f, "rgba({}, {}, {}, {:.3})", self.r, self.g, self.b, self.alpha())
        }
    }
}

fn unit_to_byte(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        let c = Color::from_hex(0x3b_82f6);
        assert_eq!((c.r, c.g, c.b, c.a), (0x3b, 0x82, 0xf6, 255));
        assert_eq!(c.to_hex(), 0x3b_82f6);
    }

    #[test]
    fn test_rgba_alpha() {
        let c = Color::rgba(0, 0, 0, 0.3);
        assert_eq!(c.a, 77);
        assert!((c.alpha() - 0.3).abs() < 0.01);
        assert_eq!(Color::rgba(1, 2, 3, 7.0).a, 255);
    }

    #[test]
    fn test_hsl_roundtrip_primaries() {
        for hex in [0xff_0000, 0x00_ff00, 0x00_00ff, 0xd9_7706, 0x80_8080] {
            let c = Color::from_hex(hex);
            let (h, s, l) = c.to_hsl();
            let back = Color::from_hsl(h, s, l);
            assert!((i32::from(back.r) - i32::from(c.r)).abs() <= 1, "{c} → {back}");
            assert!((i32::from(back.g) - i32::from(c.g)).abs() <= 1, "{c} → {back}");
            assert!((i32::from(back.b) - i32::from(c.b)).abs() <= 1, "{c} → {back}");
        }
    }

    #[test]
    fn test_from_hsl_glow_hue() {
        // Hue 0.05 at full saturation is a red-orange.
        let c = Color::from_hsl(0.05, 1.0, 0.5);
        assert_eq!(c.r, 255);
        assert!(c.g > 40 && c.g < 100);
        assert_eq!(c.b, 0);
    }

    #[test]
    fn test_grey_has_no_saturation() {
        let (_, s, l) = Color::from_hex(0x99_9999).to_hsl();
        assert!(s.abs() < f64::EPSILON);
        assert!((l - 0.6).abs() < 0.01);
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Color::from_hex(0xe8_dcb5);
        let b = Color::from_hex(0xd6_b865);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
    }

    #[test]
    fn test_display() {
        assert_eq!(Color::from_hex(0xff_cc00).to_string(), "#ffcc00");
        assert!(Color::rgba(255, 255, 255, 0.5).to_string().starts_with("rgba("));
    }
}
