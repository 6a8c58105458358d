//! Backdrop textures: caustic plasma, nebula and the sun glow sprite.

use std::f64::consts::TAU;

use crate::color::Color;
use crate::engine::rng::SeededRng;
use crate::error::OrreryResult;

use super::canvas::{Canvas, CompositeOp, Paint};
use super::{Detail, Texture, TextureKind, TextureStats, Wrap};

/// Full-detail side of the caustic texture.
pub const CAUSTIC_SIZE: u32 = 512;
/// Full-detail side of the nebula texture.
pub const NEBULA_SIZE: u32 = 1024;
/// Full-detail side of the glow sprite.
pub const GLOW_SIZE: u32 = 128;

const CAUSTIC_STREAKS: usize = 40;
const CAUSTIC_STEP: f64 = 10.0;
const NEBULA_BLOBS_PER_LAYER: usize = 15;
const NEBULA_STARS: usize = 800;

/// Nebula colour layers: tint and radius scale.
const NEBULA_LAYERS: [((u8, u8, u8, f64), f64); 4] = [
    ((20, 25, 50, 0.4), 1.0),
    ((50, 30, 60, 0.2), 0.8),
    ((10, 40, 50, 0.2), 0.6),
    ((40, 20, 20, 0.15), 0.7),
];

/// Interference streaks in solar gold, additive on black, tiling.
///
/// # Errors
///
/// Propagates canvas failures.
pub fn caustic_texture(detail: Detail, rng: &mut SeededRng) -> OrreryResult<Texture> {
    let size = detail.side(CAUSTIC_SIZE);
    let s = f64::from(size);
    let k = detail.factor();
    let mut canvas = Canvas::filled(size, size, Color::BLACK)?;
    canvas.set_composite(CompositeOp::Lighter);

    let (r, g, b) = (212, 175, 55);
    for _ in 0..CAUSTIC_STREAKS {
        let amplitude = rng.gen_range_f64(20.0, 80.0) * k;
        // Period is per full-detail pixel; rescale so the wave count holds.
        let period = rng.gen_range_f64(0.01, 0.06) / k;
        let phase = rng.gen_range_f64(0.0, TAU);
        let y_base = rng.gen_range_f64(0.0, s);
        let peak = rng.gen_f64() * 0.1;

        let step = (CAUSTIC_STEP * k).max(1.0);
        let count = (s / step).floor() as usize;
        let points: Vec<(f64, f64)> = (0..=count)
            .map(|i| {
                let x = i as f64 * step;
                (x, y_base + (x * period + phase).sin() * amplitude)
            })
            .collect();

        let paint = Paint::LinearX {
            x0: 0.0,
            x1: s,
            stops: vec![
                (0.0, Color::rgba(r, g, b, 0.0)),
                (0.5, Color::rgba(r, g, b, peak)),
                (1.0, Color::rgba(r, g, b, 0.0)),
            ],
        };
        canvas.stroke_polyline(&points, 1.0, &paint);
    }

    let mut stats = TextureStats::default();
    stats.record("streaks", CAUSTIC_STREAKS);
    Ok(Texture {
        kind: TextureKind::Caustic,
        wrap: Wrap::Repeat,
        image: canvas.into_image(),
        stats,
    })
}

/// Deep-space backdrop: screened colour clouds and faint baked stars.
///
/// # Errors
///
/// Propagates canvas failures.
pub fn nebula_texture(detail: Detail, rng: &mut SeededRng) -> OrreryResult<Texture> {
    let size = detail.side(NEBULA_SIZE);
    let s = f64::from(size);
    let k = detail.factor();
    let mut canvas = Canvas::filled(size, size, Color::from_hex(0x02_0408))?;
    let mut stats = TextureStats::default();

    canvas.set_composite(CompositeOp::Screen);
    for ((r, g, b, a), scale) in NEBULA_LAYERS {
        for _ in 0..NEBULA_BLOBS_PER_LAYER {
            let x = rng.gen_range_f64(0.0, s);
            let y = rng.gen_range_f64(0.0, s);
            let radius = rng.gen_range_f64(100.0, 400.0) * scale * k;
            let paint = Paint::Radial {
                cx: x,
                cy: y,
                radius,
                stops: vec![(0.0, Color::rgba(r, g, b, a)), (1.0, Color::TRANSPARENT)],
            };
            canvas.fill_circle(x, y, radius, &paint);
        }
        stats.record("clouds", NEBULA_BLOBS_PER_LAYER);
    }

    canvas.set_composite(CompositeOp::SourceOver);
    let star = Paint::Solid(Color::WHITE);
    for _ in 0..NEBULA_STARS {
        let a = rng.gen_f64();
        canvas.set_global_alpha(a * a * a * 0.8);
        let (x, y) = (rng.gen_range_f64(0.0, s), rng.gen_range_f64(0.0, s));
        canvas.fill_rect(x, y, 1.0, 1.0, &star);
    }
    canvas.set_global_alpha(1.0);
    stats.record("stars", NEBULA_STARS);

    Ok(Texture {
        kind: TextureKind::Nebula,
        wrap: Wrap::Clamp,
        image: canvas.into_image(),
        stats,
    })
}

/// Soft radial glow for the sun sprite. Deterministic, no randomness.
///
/// # Errors
///
/// Propagates canvas failures.
pub fn glow_texture(detail: Detail) -> OrreryResult<Texture> {
    let size = detail.side(GLOW_SIZE);
    let c = f64::from(size) / 2.0;
    let mut canvas = Canvas::new(size, size)?;
    let stops = vec![
        (0.0, Color::WHITE),
        (0.2, Color::rgba(255, 255, 255, 0.8)),
        (0.5, Color::rgba(255, 200, 120, 0.25)),
        (1.0, Color::rgba(255, 160, 60, 0.0)),
    ];
    let paint = Paint::Radial {
        cx: c,
        cy: c,
        radius: c,
        stops,
    };
    canvas.fill_circle(c, c, c, &paint);

    let mut stats = TextureStats::default();
    stats.record("stops", 4);
    Ok(Texture {
        kind: TextureKind::Glow,
        wrap: Wrap::Clamp,
        image: canvas.into_image(),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caustic_tiles_and_stays_gold() {
        let mut rng = SeededRng::named(42, "texture/caustic");
        let t = caustic_texture(Detail::divisor(2), &mut rng).unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(t.wrap, Wrap::Repeat);
        assert_eq!(t.width(), 256);
        assert_eq!(t.stats.count("streaks"), 40);
        // Additive gold on black never produces blue above red.
        assert!(t.image.pixels().all(|p| p[2] <= p[0]));
        // Edges fade to nothing.
        assert!((0..t.height()).all(|y| t.image.get_pixel(0, y)[0] == 0));
    }

    #[test]
    fn test_nebula_structure() {
        let mut rng = SeededRng::named(42, "texture/nebula");
        let t = nebula_texture(Detail::divisor(8), &mut rng).unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(t.stats.count("clouds"), 60);
        assert_eq!(t.stats.count("stars"), 800);
        let mean = t.mean_color();
        // Dark backdrop.
        assert!(mean.r < 80 && mean.g < 80 && mean.b < 80, "mean {mean}");
        assert_eq!(mean.a, 255);
    }

    #[test]
    fn test_glow_is_radial() {
        let t = glow_texture(Detail::FULL).unwrap_or_else(|e| unreachable!("{e}"));
        let centre = t.sample(0.5, 0.5);
        let edge = t.sample(0.5, 0.0);
        let corner = t.sample(0.0, 0.0);
        assert!(centre.a > 200);
        assert!(edge.a < 5);
        assert_eq!(corner.a, 0);
    }
}
