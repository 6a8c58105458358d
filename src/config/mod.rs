//! Configuration system with YAML schema and validation.
//!
//! Every visual tuning constant of the orrery lives here rather than in the
//! solver: the barycentric exaggeration, the display-radius exponent, the
//! time-axis stretch and the sampling resolutions. Loading goes through
//! three gates:
//! - Type-safe structs (`serde`, unknown fields rejected)
//! - Declarative range checks (`validator`)
//! - Semantic cross-field checks

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::{OrreryError, OrreryResult};
use crate::orbit::elements::Planet;

/// Default configuration shipped with the crate.
pub const DEFAULT_CONFIG_YAML: &str = include_str!("../../assets/orrery.yaml");

/// Top-level orrery configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct OrreryConfig {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Epoch handling: initial year, easing and snapping.
    #[validate(nested)]
    #[serde(default)]
    pub time: TimeConfig,

    /// Display projection constants.
    #[validate(nested)]
    #[serde(default)]
    pub projection: ProjectionConfig,

    /// One-time scene construction parameters.
    #[validate(nested)]
    #[serde(default)]
    pub scene: SceneConfig,

    /// Camera and orbit controls.
    #[validate(nested)]
    #[serde(default)]
    pub camera: CameraConfig,

    /// Reproducibility settings.
    #[serde(default)]
    pub reproducibility: ReproducibilityConfig,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl OrreryConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> OrreryResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> OrreryResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        config.validate_semantic()?;
        Ok(config)
    }

    /// The configuration embedded in the crate, or the compiled-in
    /// defaults if the embedded document does not parse.
    #[must_use]
    pub fn embedded() -> Self {
        match Self::from_yaml(DEFAULT_CONFIG_YAML) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(%err, "embedded configuration rejected, using defaults");
                Self::default()
            }
        }
    }

    /// Serialize back to YAML.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_yaml(&self) -> OrreryResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> OrreryConfigBuilder {
        OrreryConfigBuilder::default()
    }

    /// Validate semantic constraints beyond schema.
    fn validate_semantic(&self) -> OrreryResult<()> {
        if self.time.snap_exact >= self.time.snap_window {
            return Err(OrreryError::config(format!(
                "snap_exact ({}) must be narrower than snap_window ({})",
                self.time.snap_exact, self.time.snap_window
            )));
        }

        if !self.time.initial_year.is_finite() {
            return Err(OrreryError::config("initial_year must be finite"));
        }

        if self.camera.min_distance >= self.camera.max_distance {
            return Err(OrreryError::config(format!(
                "camera min_distance {} must be below max_distance {}",
                self.camera.min_distance, self.camera.max_distance
            )));
        }

        if self.camera.near >= self.camera.far {
            return Err(OrreryError::config("camera near plane must be before far plane"));
        }

        if self.scene.spine_points > self.scene.spine_samples {
            return Err(OrreryError::config(format!(
                "spine_points ({}) cannot exceed spine_samples ({})",
                self.scene.spine_points, self.scene.spine_samples
            )));
        }

        Ok(())
    }
}

impl Default for OrreryConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            time: TimeConfig::default(),
            projection: ProjectionConfig::default(),
            scene: SceneConfig::default(),
            camera: CameraConfig::default(),
            reproducibility: ReproducibilityConfig::default(),
        }
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct OrreryConfigBuilder {
    seed: Option<u64>,
    initial_year: Option<f64>,
    trail_steps: Option<usize>,
    spine_samples: Option<usize>,
    star_count: Option<usize>,
    z_scale: Option<f64>,
    exaggeration: Option<f64>,
    distance_exponent: Option<f64>,
    texture_divisor: Option<u32>,
}

impl OrreryConfigBuilder {
    /// Set the random seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the year shown on mount.
    #[must_use]
    pub const fn initial_year(mut self, year: f64) -> Self {
        self.initial_year = Some(year);
        self
    }

    /// Set the number of samples per planet trail.
    #[must_use]
    pub const fn trail_steps(mut self, steps: usize) -> Self {
        self.trail_steps = Some(steps);
        self
    }

    /// Set the number of barycentric samples behind the spine curve.
    ///
    /// The resampled spine point count is capped to this value.
    #[must_use]
    pub const fn spine_samples(mut self, samples: usize) -> Self {
        self.spine_samples = Some(samples);
        self
    }

    /// Set the starfield size.
    #[must_use]
    pub const fn star_count(mut self, count: usize) -> Self {
        self.star_count = Some(count);
        self
    }

    /// Set the time-axis stretch.
    #[must_use]
    pub const fn z_scale(mut self, z_scale: f64) -> Self {
        self.z_scale = Some(z_scale);
        self
    }

    /// Set the barycentric exaggeration factor.
    #[must_use]
    pub const fn exaggeration(mut self, factor: f64) -> Self {
        self.exaggeration = Some(factor);
        self
    }

    /// Set the display-radius compression exponent.
    #[must_use]
    pub const fn distance_exponent(mut self, exponent: f64) -> Self {
        self.distance_exponent = Some(exponent);
        self
    }

    /// Set the procedural texture resolution divisor.
    #[must_use]
    pub const fn texture_divisor(mut self, divisor: u32) -> Self {
        self.texture_divisor = Some(divisor);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> OrreryConfig {
        let mut config = OrreryConfig::default();

        if let Some(seed) = self.seed {
            config.reproducibility.seed = seed;
        }
        if let Some(year) = self.initial_year {
            config.time.initial_year = year;
        }
        if let Some(steps) = self.trail_steps {
            config.scene.trail_steps = steps.max(1);
        }
        if let Some(samples) = self.spine_samples {
            config.scene.spine_samples = samples.max(2);
            config.scene.spine_points = config.scene.spine_points.min(config.scene.spine_samples);
        }
        if let Some(count) = self.star_count {
            config.scene.star_count = count;
        }
        if let Some(z_scale) = self.z_scale {
            config.projection.z_scale = z_scale.clamp(MIN_Z_SCALE, MAX_Z_SCALE);
        }
        if let Some(factor) = self.exaggeration {
            config.projection.exaggeration = factor;
        }
        if let Some(exponent) = self.distance_exponent {
            config.projection.distance_exponent = exponent;
        }
        if let Some(divisor) = self.texture_divisor {
            config.scene.texture_divisor = divisor.clamp(1, 16);
        }

        config
    }
}

/// Lower bound of the time-axis stretch slider.
pub const MIN_Z_SCALE: f64 = 1.0;
/// Upper bound of the time-axis stretch slider.
pub const MAX_Z_SCALE: f64 = 20.0;

/// Epoch handling.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct TimeConfig {
    /// Year shown on mount.
    #[serde(default = "default_initial_year")]
    pub initial_year: f64,
    /// Fraction of the remaining distance covered each frame.
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    #[serde(default = "default_easing_factor")]
    pub easing_factor: f64,
    /// Below this distance the render year jumps to the target.
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_easing_epsilon")]
    pub easing_epsilon: f64,
    /// Window (years) in which a notable epoch's metadata is surfaced.
    #[validate(range(exclusive_min = 0.0, max = 5.0))]
    #[serde(default = "default_snap_window")]
    pub snap_window: f64,
    /// Window (years) in which the target snaps onto the epoch exactly.
    #[validate(range(exclusive_min = 0.0, max = 5.0))]
    #[serde(default = "default_snap_exact")]
    pub snap_exact: f64,
    /// Index into the time-step presets selected on mount.
    #[validate(range(max = 5))]
    #[serde(default = "default_step_index")]
    pub default_step_index: usize,
}

const fn default_initial_year() -> f64 {
    2024.0
}

const fn default_easing_factor() -> f64 {
    0.1
}

const fn default_easing_epsilon() -> f64 {
    0.001
}

const fn default_snap_window() -> f64 {
    0.2
}

const fn default_snap_exact() -> f64 {
    0.05
}

const fn default_step_index() -> usize {
    4
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            initial_year: default_initial_year(),
            easing_factor: default_easing_factor(),
            easing_epsilon: default_easing_epsilon(),
            snap_window: default_snap_window(),
            snap_exact: default_snap_exact(),
            default_step_index: default_step_index(),
        }
    }
}

/// Display projection constants.
///
/// None of these carry physical meaning; they make a 30 AU system and a
/// sub-AU barycentric wobble legible in the same frame.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProjectionConfig {
    /// Multiplier applied after radius compression.
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_orbit_scale")]
    pub orbit_scale: f64,
    /// Exponent of the radius compression `r^exponent`.
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    #[serde(default = "default_distance_exponent")]
    pub distance_exponent: f64,
    /// Amplification of the Sun's barycentric offset.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_exaggeration")]
    pub exaggeration: f64,
    /// Scene units per year along the time axis before stretching.
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_base_visual_scale")]
    pub base_visual_scale: f64,
    /// Time-axis stretch.
    #[validate(range(min = 1.0, max = 20.0))]
    #[serde(default = "default_z_scale")]
    pub z_scale: f64,
}

const fn default_orbit_scale() -> f64 {
    22.0
}

const fn default_distance_exponent() -> f64 {
    0.45
}

const fn default_exaggeration() -> f64 {
    200.0
}

const fn default_base_visual_scale() -> f64 {
    1.0
}

const fn default_z_scale() -> f64 {
    6.0
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            orbit_scale: default_orbit_scale(),
            distance_exponent: default_distance_exponent(),
            exaggeration: default_exaggeration(),
            base_visual_scale: default_base_visual_scale(),
            z_scale: default_z_scale(),
        }
    }
}

/// One-time scene construction parameters.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SceneConfig {
    /// Samples per planet trail across the full year range.
    #[validate(range(min = 1, max = 500_000))]
    #[serde(default = "default_trail_steps")]
    pub trail_steps: usize,
    /// Barycentric samples behind the spine curve.
    #[validate(range(min = 2, max = 200_000))]
    #[serde(default = "default_spine_samples")]
    pub spine_samples: usize,
    /// Points of the resampled spine curve.
    #[validate(range(min = 2))]
    #[serde(default = "default_spine_points")]
    pub spine_points: usize,
    /// Initial trail opacity.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_trail_opacity")]
    pub trail_opacity: f64,
    /// Number of background stars.
    #[validate(range(max = 100_000))]
    #[serde(default = "default_star_count")]
    pub star_count: usize,
    /// Planets whose trails start hidden.
    #[serde(default)]
    pub hidden_trails: Vec<Planet>,
    /// Resolution divisor for procedural textures; 1 is full detail.
    #[validate(range(min = 1, max = 16))]
    #[serde(default = "default_texture_divisor")]
    pub texture_divisor: u32,
}

const fn default_trail_steps() -> usize {
    60_000
}

const fn default_spine_samples() -> usize {
    10_000
}

const fn default_spine_points() -> usize {
    3_000
}

const fn default_trail_opacity() -> f64 {
    0.15
}

const fn default_star_count() -> usize {
    3_000
}

const fn default_texture_divisor() -> u32 {
    1
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            trail_steps: default_trail_steps(),
            spine_samples: default_spine_samples(),
            spine_points: default_spine_points(),
            trail_opacity: default_trail_opacity(),
            star_count: default_star_count(),
            hidden_trails: Vec::new(),
            texture_divisor: default_texture_divisor(),
        }
    }
}

/// Camera and orbit controls.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    #[validate(range(min = 1.0, max = 170.0))]
    #[serde(default = "default_fov")]
    pub fov_deg: f64,
    /// Near clip plane.
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_near")]
    pub near: f64,
    /// Far clip plane.
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_far")]
    pub far: f64,
    /// Closest zoom distance from the look target.
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_min_distance")]
    pub min_distance: f64,
    /// Farthest zoom distance from the look target.
    #[serde(default = "default_max_distance")]
    pub max_distance: f64,
    /// Damping factor of the orbit controls.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_damping")]
    pub damping: f64,
    /// Camera offset from the Sun on the first frame.
    #[serde(default = "default_initial_offset")]
    pub initial_offset: [f64; 3],
}

const fn default_fov() -> f64 {
    45.0
}

const fn default_near() -> f64 {
    0.1
}

const fn default_far() -> f64 {
    30_000.0
}

const fn default_min_distance() -> f64 {
    20.0
}

const fn default_max_distance() -> f64 {
    2_500.0
}

const fn default_damping() -> f64 {
    0.05
}

const fn default_initial_offset() -> [f64; 3] {
    [60.0, 40.0, -100.0]
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: default_fov(),
            near: default_near(),
            far: default_far(),
            min_distance: default_min_distance(),
            max_distance: default_max_distance(),
            damping: default_damping(),
            initial_offset: default_initial_offset(),
        }
    }
}

/// Reproducibility settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReproducibilityConfig {
    /// Master seed for every procedural generator.
    pub seed: u64,
}

impl Default for ReproducibilityConfig {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OrreryConfig::default();

        assert_eq!(config.schema_version, "1.0");
        assert_eq!(config.reproducibility.seed, 42);
        assert!((config.time.initial_year - 2024.0).abs() < f64::EPSILON);
        assert!((config.projection.orbit_scale - 22.0).abs() < f64::EPSILON);
        assert!((config.projection.distance_exponent - 0.45).abs() < f64::EPSILON);
        assert!((config.projection.exaggeration - 200.0).abs() < f64::EPSILON);
        assert_eq!(config.scene.trail_steps, 60_000);
        assert_eq!(config.time.default_step_index, 4);
    }

    #[test]
    fn test_embedded_config_matches_defaults() {
        let embedded = OrreryConfig::from_yaml(DEFAULT_CONFIG_YAML);
        assert!(embedded.is_ok(), "embedded yaml rejected: {embedded:?}");

        let config = OrreryConfig::embedded();
        let defaults = OrreryConfig::default();
        assert_eq!(config.scene.trail_steps, defaults.scene.trail_steps);
        assert!((config.projection.z_scale - defaults.projection.z_scale).abs() < f64::EPSILON);
        assert!((config.camera.max_distance - defaults.camera.max_distance).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_builder() {
        let config = OrreryConfig::builder()
            .seed(12345)
            .trail_steps(500)
            .z_scale(40.0)
            .build();

        assert_eq!(config.reproducibility.seed, 12345);
        assert_eq!(config.scene.trail_steps, 500);
        // Clamped to the slider range
        assert!((config.projection.z_scale - MAX_Z_SCALE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_builder_caps_spine_points() {
        let config = OrreryConfig::builder().spine_samples(100).build();
        assert_eq!(config.scene.spine_samples, 100);
        assert_eq!(config.scene.spine_points, 100);
    }

    #[test]
    fn test_builder_clamps_texture_divisor() {
        assert_eq!(OrreryConfig::builder().texture_divisor(0).build().scene.texture_divisor, 1);
        assert_eq!(OrreryConfig::builder().texture_divisor(64).build().scene.texture_divisor, 16);
        assert_eq!(OrreryConfig::default().scene.texture_divisor, 1);
    }

    #[test]
    fn test_config_yaml_parse() {
        let yaml = r"
time:
  initial_year: 1859.0
projection:
  z_scale: 3.5
reproducibility:
  seed: 7
";
        let config = OrreryConfig::from_yaml(yaml);
        assert!(config.is_ok());

        let config = config.ok();
        assert_eq!(config.as_ref().map(|c| c.reproducibility.seed), Some(7));
        assert_eq!(config.as_ref().map(|c| c.time.initial_year), Some(1859.0));
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        let yaml = r"
projection:
  warp_factor: 9
";
        assert!(OrreryConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_config_validation_fails_z_scale_range() {
        let yaml = r"
projection:
  z_scale: 50.0
";
        let config = OrreryConfig::from_yaml(yaml);
        assert!(matches!(config, Err(OrreryError::Validation(_))));
    }

    #[test]
    fn test_config_validation_fails_inverted_snap_windows() {
        let yaml = r"
time:
  snap_window: 0.05
  snap_exact: 0.2
";
        let config = OrreryConfig::from_yaml(yaml);
        assert!(matches!(config, Err(OrreryError::Config { .. })));
    }

    #[test]
    fn test_config_validation_fails_inverted_camera_range() {
        let yaml = r"
camera:
  min_distance: 3000.0
";
        assert!(OrreryConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_hidden_trails_parse() {
        let yaml = r"
scene:
  hidden_trails: [Uranus, Neptune]
";
        let config = OrreryConfig::from_yaml(yaml);
        let hidden = config.map(|c| c.scene.hidden_trails).unwrap_or_default();
        assert_eq!(hidden, vec![Planet::Uranus, Planet::Neptune]);
    }

    #[test]
    fn test_config_yaml_roundtrip_keeps_tuning() {
        let config = OrreryConfig::builder().exaggeration(150.0).build();
        let yaml = config.to_yaml();
        assert!(yaml.is_ok());
        let back = yaml.and_then(|y| OrreryConfig::from_yaml(&y));
        assert_eq!(back.map(|c| c.projection.exaggeration).ok(), Some(150.0));
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = tempfile::tempdir();
        assert!(dir.is_ok());
        let Ok(dir) = dir else { return };
        let path = dir.path().join("orrery.yaml");
        assert!(std::fs::write(&path, "reproducibility:\n  seed: 99\n").is_ok());

        let config = OrreryConfig::load(&path);
        assert_eq!(config.map(|c| c.reproducibility.seed).ok(), Some(99));
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = OrreryConfig::load("/definitely/not/here.yaml");
        assert!(matches!(config, Err(OrreryError::Io(_))));
    }
}
