//! Procedural texture generation.
//!
//! Every raster the scene needs is synthesised on the CPU from a seeded
//! stream: eight planet surfaces, the caustic plasma pattern, the nebula
//! backdrop and the sun glow sprite. Nothing is fetched.
//!
//! Each [`Texture`] carries [`TextureStats`] describing what was drawn
//! (craters, bands, continents, stars) so callers and tests can check
//! structure without comparing pixels.

pub mod canvas;
pub mod planet;
pub mod sky;

use image::RgbaImage;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::engine::rng::SeededRng;
use crate::error::OrreryResult;
use crate::orbit::elements::Planet;

pub use canvas::{Canvas, CompositeOp, Paint};

/// What a texture depicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureKind {
    Planet(Planet),
    Caustic,
    Nebula,
    Glow,
}

/// Sampling behaviour outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Wrap {
    #[default]
    Clamp,
    Repeat,
}

/// Counts of the features a recipe drew.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureStats {
    features: IndexMap<String, usize>,
}

impl TextureStats {
    /// Record a feature count, adding to any earlier count.
    pub fn record(&mut self, feature: &str, count: usize) {
        *self.features.entry(feature.to_string()).or_insert(0) += count;
    }

    /// Count of a feature, zero if never drawn.
    #[must_use]
    pub fn count(&self, feature: &str) -> usize {
        self.features.get(feature).copied().unwrap_or(0)
    }

    /// All recorded features in drawing order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.features.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// A generated raster.
#[derive(Debug, Clone)]
pub struct Texture {
    pub kind: TextureKind,
    pub wrap: Wrap,
    pub image: RgbaImage,
    pub stats: TextureStats,
}

impl Texture {
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Nearest-texel sample at `(u, v)`, honouring the wrap mode.
    #[must_use]
    pub fn sample(&self, u: f64, v: f64) -> Color {
        let fold = |t: f64| match self.wrap {
            Wrap::Clamp => t.clamp(0.0, 1.0),
            Wrap::Repeat => t.rem_euclid(1.0),
        };
        let x = ((fold(u) * f64::from(self.width())) as u32).min(self.width() - 1);
        let y = ((fold(v) * f64::from(self.height())) as u32).min(self.height() - 1);
        let p = self.image.get_pixel(x, y);
        Color::new(p[0], p[1], p[2], p[3])
    }

    /// Average colour over all texels.
    #[must_use]
    pub fn mean_color(&self) -> Color {
        let n = u64::from(self.width()) * u64::from(self.height());
        let mut sum = [0u64; 4];
        for p in self.image.pixels() {
            for c in 0..4 {
                sum[c] += u64::from(p[c]);
            }
        }
        let avg = sum.map(|s| (s / n.max(1)) as u8);
        Color::new(avg[0], avg[1], avg[2], avg[3])
    }

    /// BLAKE3 digest of the raw texels, hex encoded.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        blake3::hash(self.image.as_raw()).to_hex().to_string()
    }
}

/// Resolution divisor applied to every recipe.
///
/// `1` is full detail; preview builds use larger divisors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detail(u32);

impl Detail {
    pub const FULL: Self = Self(1);

    /// Detail with the given divisor, at least 1.
    #[must_use]
    pub fn divisor(divisor: u32) -> Self {
        Self(divisor.max(1))
    }

    /// Scale a full-detail side length.
    #[must_use]
    pub const fn side(self, full: u32) -> u32 {
        let s = full / self.0;
        if s == 0 {
            1
        } else {
            s
        }
    }

    /// Scale factor applied to pixel-space lengths.
    #[must_use]
    pub fn factor(self) -> f64 {
        1.0 / f64::from(self.0)
    }
}

impl Default for Detail {
    fn default() -> Self {
        Self::FULL
    }
}

/// All textures used by one scene.
#[derive(Debug, Clone)]
pub struct TextureSet {
    pub planets: IndexMap<Planet, Texture>,
    pub caustic: Texture,
    pub nebula: Texture,
    pub glow: Texture,
}

impl TextureSet {
    /// Generate every texture, each from its own named stream.
    ///
    /// # Errors
    ///
    /// Propagates canvas failures.
    pub fn generate(seed: u64, detail: Detail) -> OrreryResult<Self> {
        let _span = tracing::debug_span!("textures", seed).entered();

        let mut planets = IndexMap::with_capacity(Planet::ALL.len());
        for p in Planet::ALL {
            let mut rng = SeededRng::named(seed, &format!("texture/{}", p.name()));
            planets.insert(p, planet::planet_texture(p, detail, &mut rng)?);
        }

        let caustic = sky::caustic_texture(detail, &mut SeededRng::named(seed, "texture/caustic"))?;
        let nebula = sky::nebula_texture(detail, &mut SeededRng::named(seed, "texture/nebula"))?;
        let glow = sky::glow_texture(detail)?;

        tracing::debug!(count = planets.len() + 3, "textures generated");
        Ok(Self {
            planets,
            caustic,
            nebula,
            glow,
        })
    }

    /// Texture of one planet.
    #[must_use]
    pub fn planet(&self, planet: Planet) -> Option<&Texture> {
        self.planets.get(&planet)
    }

    /// Every texture in generation order.
    pub fn iter(&self) -> impl Iterator<Item = &Texture> {
        self.planets
            .values()
            .chain([&self.caustic, &self.nebula, &self.glow])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(seed: u64) -> TextureSet {
        TextureSet::generate(seed, Detail::divisor(8)).unwrap_or_else(|e| unreachable!("{e}"))
    }

    #[test]
    fn test_stats_record_and_count() {
        let mut s = TextureStats::default();
        s.record("craters", 10);
        s.record("craters", 5);
        assert_eq!(s.count("craters"), 15);
        assert_eq!(s.count("bands"), 0);
        assert_eq!(s.iter().count(), 1);
    }

    #[test]
    fn test_detail_side() {
        assert_eq!(Detail::FULL.side(1024), 1024);
        assert_eq!(Detail::divisor(4).side(1024), 256);
        assert_eq!(Detail::divisor(0).side(10), 10);
        assert_eq!(Detail::divisor(4096).side(512), 1);
    }

    #[test]
    fn test_texture_set_is_complete() {
        let textures = set(1);
        assert_eq!(textures.planets.len(), 8);
        assert_eq!(textures.iter().count(), 11);
        assert_eq!(textures.caustic.wrap, Wrap::Repeat);
        assert_eq!(textures.nebula.kind, TextureKind::Nebula);
    }

    #[test]
    fn test_texture_set_deterministic() {
        let a = set(99);
        let b = set(99);
        for (ta, tb) in a.iter().zip(b.iter()) {
            assert_eq!(ta.fingerprint(), tb.fingerprint(), "{:?}", ta.kind);
        }
    }

    #[test]
    fn test_seed_changes_output() {
        let a = set(1);
        let b = set(2);
        let ea = a.planet(Planet::Earth).map(Texture::fingerprint);
        let eb = b.planet(Planet::Earth).map(Texture::fingerprint);
        assert_ne!(ea, eb);
    }

    #[test]
    fn test_sample_wrap_modes() {
        let textures = set(3);
        let caustic = &textures.caustic;
        assert_eq!(caustic.sample(0.25, 0.5), caustic.sample(1.25, 0.5));

        let earth = textures.planet(Planet::Earth);
        assert!(earth.is_some_and(|t| t.sample(-5.0, 0.5) == t.sample(0.0, 0.5)));
    }
}
