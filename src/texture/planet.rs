//! Planet surface recipes.
//!
//! Equirectangular 1024×512 rasters, one recipe per body type. Pixel-space
//! sizes (crater radii, cloud streaks, cap height) scale with [`Detail`].

use crate::color::Color;
use crate::engine::rng::SeededRng;
use crate::error::OrreryResult;
use crate::orbit::elements::Planet;

use super::canvas::{Canvas, CompositeOp, Paint};
use super::{Detail, Texture, TextureKind, TextureStats, Wrap};

/// Full-detail width of a planet texture.
pub const PLANET_WIDTH: u32 = 1024;
/// Full-detail height of a planet texture.
pub const PLANET_HEIGHT: u32 = 512;

const MERCURY_SPECKS: usize = 10_000;
const MERCURY_CRATERS: usize = 150;
const VENUS_BANDS: usize = 20;
const VENUS_BLUR: f64 = 20.0;
const EARTH_CONTINENTS: usize = 40;
const EARTH_CLOUDS: usize = 400;
const MARS_BLOBS: usize = 50;
const MARS_CAP_HEIGHT: f64 = 15.0;
const STREAKS_PER_BAND: usize = 30;

/// Horizontal band count of a giant's surface.
#[must_use]
pub const fn band_count(planet: Planet) -> usize {
    match planet {
        Planet::Jupiter => 24,
        Planet::Saturn => 30,
        _ => 12,
    }
}

/// Generate the surface texture of one planet.
///
/// # Errors
///
/// Propagates canvas failures.
pub fn planet_texture(planet: Planet, detail: Detail, rng: &mut SeededRng) -> OrreryResult<Texture> {
    let (w, h) = (detail.side(PLANET_WIDTH), detail.side(PLANET_HEIGHT));
    let base = Color::from_hex(planet.elements().color);
    let mut canvas = Canvas::filled(w, h, base)?;
    let mut stats = TextureStats::default();
    let k = detail.factor();

    match planet {
        Planet::Mercury => mercury(&mut canvas, rng, k, &mut stats),
        Planet::Venus => venus(&mut canvas, rng, k, &mut stats)?,
        Planet::Earth => earth(&mut canvas, rng, k, &mut stats),
        Planet::Mars => mars(&mut canvas, rng, k, &mut stats),
        Planet::Jupiter | Planet::Saturn | Planet::Uranus | Planet::Neptune => {
            giant(&mut canvas, planet, base, rng, k, &mut stats);
        }
    }

    tracing::trace!(%planet, width = w, height = h, "planet texture generated");
    Ok(Texture {
        kind: TextureKind::Planet(planet),
        wrap: Wrap::Clamp,
        image: canvas.into_image(),
        stats,
    })
}

fn dims(canvas: &Canvas) -> (f64, f64) {
    (f64::from(canvas.width()), f64::from(canvas.height()))
}

fn mercury(canvas: &mut Canvas, rng: &mut SeededRng, k: f64, stats: &mut TextureStats) {
    let (w, h) = dims(canvas);
    canvas.fill_rect(0.0, 0.0, w, h, &Color::from_hex(0x99_9999).into());

    let dark = Paint::Solid(Color::from_hex(0x77_7777));
    let light = Paint::Solid(Color::from_hex(0xaa_aaaa));
    let speck = (2.0 * k).max(1.0);
    for _ in 0..MERCURY_SPECKS {
        let paint = if rng.gen_f64() > 0.5 { &dark } else { &light };
        let (x, y) = (rng.gen_range_f64(0.0, w), rng.gen_range_f64(0.0, h));
        canvas.fill_rect(x, y, speck, speck, paint);
    }
    stats.record("specks", MERCURY_SPECKS);

    let floor = Paint::Solid(Color::rgba(0, 0, 0, 0.3));
    let rim = Color::rgba(255, 255, 255, 0.1);
    for _ in 0..MERCURY_CRATERS {
        let (x, y) = (rng.gen_range_f64(0.0, w), rng.gen_range_f64(0.0, h));
        let r = rng.gen_range_f64(2.0, 12.0) * k;
        canvas.fill_circle(x, y, r, &floor);
        canvas.stroke_circle(x, y, r, 1.0, rim);
    }
    stats.record("craters", MERCURY_CRATERS);
}

fn venus(canvas: &mut Canvas, rng: &mut SeededRng, k: f64, stats: &mut TextureStats) -> OrreryResult<()> {
    let (w, h) = dims(canvas);
    let pale = Color::from_hex(0xe8_dcb5);
    let gradient = Paint::LinearY {
        y0: 0.0,
        y1: h,
        stops: vec![(0.0, pale), (0.5, Color::from_hex(0xd6_b865)), (1.0, pale)],
    };
    canvas.fill_rect(0.0, 0.0, w, h, &gradient);

    // Bands are drawn on their own layer so the blur only softens them.
    let mut layer = Canvas::new(canvas.width(), canvas.height())?;
    let swirl = Paint::Solid(Color::rgba(160, 120, 40, 0.2));
    for _ in 0..VENUS_BANDS {
        let y = rng.gen_range_f64(0.0, h);
        let ry = rng.gen_range_f64(50.0, 150.0) * k;
        layer.fill_ellipse(w / 2.0, y, w, ry, &swirl);
    }
    layer.box_blur((VENUS_BLUR * k).round() as u32);
    canvas.draw_canvas(&layer)?;
    stats.record("bands", VENUS_BANDS);
    Ok(())
}

fn earth(canvas: &mut Canvas, rng: &mut SeededRng, k: f64, stats: &mut TextureStats) {
    let (w, h) = dims(canvas);
    canvas.fill_rect(0.0, 0.0, w, h, &Color::from_hex(0x10_3060).into());

    let land = Paint::Solid(Color::from_hex(0x3a_6a3a));
    let highland = Paint::Solid(Color::from_hex(0x4a_7a4a));
    for _ in 0..EARTH_CONTINENTS {
        let x = rng.gen_range_f64(0.0, w);
        let y = rng.gen_range_f64(h * 0.1, h * 0.9);
        let r = rng.gen_range_f64(30.0, 100.0) * k;
        canvas.fill_circle(x, y, r, &land);
        canvas.fill_circle(x + 10.0 * k, y + 10.0 * k, r * 0.5, &highland);
    }
    stats.record("continents", EARTH_CONTINENTS);

    let cloud = Paint::Solid(Color::rgba(255, 255, 255, 0.7));
    for _ in 0..EARTH_CLOUDS {
        let (x, y) = (rng.gen_range_f64(0.0, w), rng.gen_range_f64(0.0, h));
        let cw = rng.gen_range_f64(20.0, 80.0) * k;
        let ch = rng.gen_range_f64(5.0, 15.0) * k;
        canvas.fill_rect(x, y, cw, ch, &cloud);
    }
    stats.record("clouds", EARTH_CLOUDS);
}

fn mars(canvas: &mut Canvas, rng: &mut SeededRng, k: f64, stats: &mut TextureStats) {
    let (w, h) = dims(canvas);
    canvas.fill_rect(0.0, 0.0, w, h, &Color::from_hex(0xc1_440e).into());

    let dark = Paint::Solid(Color::rgba(60, 20, 0, 0.2));
    for _ in 0..MARS_BLOBS {
        let (x, y) = (rng.gen_range_f64(0.0, w), rng.gen_range_f64(0.0, h));
        let r = rng.gen_range_f64(20.0, 80.0) * k;
        canvas.fill_circle(x, y, r, &dark);
    }
    stats.record("blobs", MARS_BLOBS);

    let ice = Paint::Solid(Color::from_hex(0xf0_f0f0));
    let cap = (MARS_CAP_HEIGHT * k).max(1.0);
    canvas.fill_rect(0.0, 0.0, w, cap, &ice);
    canvas.fill_rect(0.0, h - cap, w, cap, &ice);
    stats.record("polar_caps", 2);
}

fn giant(canvas: &mut Canvas, planet: Planet, base: Color, rng: &mut SeededRng, k: f64, stats: &mut TextureStats) {
    let (w, h) = dims(canvas);
    let bands = band_count(planet);
    let (hue, sat, light) = base.to_hsl();
    let band_h = h / bands as f64;
    let turbulence = Paint::Solid(Color::rgba(255, 255, 255, 0.03));

    for i in 0..bands {
        let y = i as f64 * band_h;
        let l_var = (i as f64 * 0.5).cos() * 0.1 + rng.gen_f64() * 0.05;
        let s_var = rng.gen_f64() * 0.1 - 0.05;
        let band = Color::from_hsl(hue, (sat + s_var).clamp(0.0, 1.0), (light + l_var).clamp(0.0, 1.0));
        canvas.fill_rect(0.0, y, w, band_h, &band.into());

        for _ in 0..STREAKS_PER_BAND {
            let x = rng.gen_range_f64(0.0, w);
            let sy = y + rng.gen_range_f64(0.0, band_h);
            let sw = rng.gen_range_f64(20.0, 60.0) * k;
            canvas.fill_rect(x, sy, sw, 1.0, &turbulence);
        }
    }
    stats.record("bands", bands);
    stats.record("streaks", bands * STREAKS_PER_BAND);

    if planet == Planet::Jupiter {
        canvas.set_composite(CompositeOp::SourceOver);
        canvas.fill_ellipse(w * 0.6, h * 0.65, 70.0 * k, 35.0 * k, &Color::from_hex(0xb0_5040).into());
        stats.record("red_spot", 1);
    }
}
