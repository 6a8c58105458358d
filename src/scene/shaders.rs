//! Sun shader programs.
//!
//! Three programs dress the Sun: the turbulent surface, the Fresnel corona
//! shell and the polar magnetic-field overlay. Each is shipped as GLSL for
//! GPU hosts, and the scalar parts of each fragment stage are mirrored here
//! on the CPU so the 2D renderers and the tests see the same response to
//! the torque index.

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// A shader program used by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderProgram {
    SunSurface,
    Corona,
    MagneticField,
}

impl ShaderProgram {
    /// Vertex stage source.
    #[must_use]
    pub const fn vertex_source(self) -> &'static str {
        match self {
            Self::SunSurface => SUN_VERTEX,
            Self::Corona => CORONA_VERTEX,
            Self::MagneticField => MAGNETIC_VERTEX,
        }
    }

    /// Fragment stage source.
    #[must_use]
    pub const fn fragment_source(self) -> &'static str {
        match self {
            Self::SunSurface => SUN_FRAGMENT,
            Self::Corona => CORONA_FRAGMENT,
            Self::MagneticField => MAGNETIC_FRAGMENT,
        }
    }

    /// Colour uniforms and their initial values. `time` and `torque` are
    /// always present as floats.
    #[must_use]
    pub fn color_uniforms(self) -> &'static [(&'static str, Color)] {
        match self {
            Self::SunSurface => &SUN_COLORS,
            Self::Corona => &CORONA_COLORS,
            Self::MagneticField => &MAGNETIC_COLORS,
        }
    }
}

static SUN_COLORS: [(&str, Color); 3] = [
    ("coreColor", Color::from_hex(0x33_2200)),
    ("surfaceColor", Color::from_hex(0x55_0011)),
    ("glowColor", Color::from_hex(0xff_cc00)),
];
static CORONA_COLORS: [(&str, Color); 1] = [("baseColor", Color::from_hex(0xff_aa00))];
static MAGNETIC_COLORS: [(&str, Color); 1] = [("color", Color::from_hex(0xff_cc00))];

/// Hermite step between two edges, as GLSL `smoothstep`.
#[must_use]
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Noise level above which the surface flares. Falls as torque rises.
#[must_use]
pub fn flare_threshold(torque: f64) -> f64 {
    0.5 - torque * 0.2
}

/// Strength of the surface rim glow.
#[must_use]
pub fn rim_gain(torque: f64) -> f64 {
    0.4 + torque * 0.3
}

/// Surface colour for a noise sample, without the rim term.
#[must_use]
pub fn surface_color(noise: f64, torque: f64) -> Color {
    let core = Color::from_hex(0x33_2200);
    let surface = Color::from_hex(0x55_0011);
    let glow = Color::from_hex(0xff_cc00);
    let base = core.lerp(surface, smoothstep(-0.3, 0.2, noise));
    let threshold = flare_threshold(torque);
    base.lerp(glow, smoothstep(threshold, threshold + 0.2, noise))
}

/// Corona alpha for a view-facing factor `n·v`.
#[must_use]
pub fn corona_alpha(n_dot_v: f64, time: f64, torque: f64) -> f64 {
    let fresnel = (1.0 - n_dot_v.max(0.0)).powi(2);
    let pulse = (time * 3.0).sin() * 0.1 + 0.9;
    fresnel * (0.3 + torque * 0.5) * pulse
}

/// Band-limits field lines to the polar caps; `v` is the texture row.
#[must_use]
pub fn pole_mask(v: f64) -> f64 {
    smoothstep(0.0, 0.3, v) * smoothstep(1.0, 0.7, v)
}

/// Magnetic overlay alpha for a field-line intensity at row `v`.
#[must_use]
pub fn magnetic_alpha(line: f64, v: f64, torque: f64) -> f64 {
    line * pole_mask(v) * 0.4 * (0.5 + torque)
}

const SUN_VERTEX: &str = r"
varying vec2 vUv;
varying vec3 vNormal;

void main() {
    vUv = uv;
    vNormal = normalize(normalMatrix * normal);
    gl_Position = projectionMatrix * modelViewMatrix * vec4(position, 1.0);
}
";

const SUN_FRAGMENT: &str = r"
uniform float time;
uniform float torque;
uniform vec3 coreColor;
uniform vec3 surfaceColor;
uniform vec3 glowColor;
varying vec2 vUv;
varying vec3 vNormal;

float hash(vec3 p) {
    p = fract(p * 0.3183099 + 0.1);
    p *= 17.0;
    return fract(p.x * p.y * p.z * (p.x + p.y + p.z));
}

float valueNoise(vec3 x) {
    vec3 i = floor(x);
    vec3 f = fract(x);
    f = f * f * (3.0 - 2.0 * f);
    return mix(mix(mix(hash(i + vec3(0, 0, 0)), hash(i + vec3(1, 0, 0)), f.x),
                   mix(hash(i + vec3(0, 1, 0)), hash(i + vec3(1, 1, 0)), f.x), f.y),
               mix(mix(hash(i + vec3(0, 0, 1)), hash(i + vec3(1, 0, 1)), f.x),
                   mix(hash(i + vec3(0, 1, 1)), hash(i + vec3(1, 1, 1)), f.x), f.y), f.z) * 2.0 - 1.0;
}

void main() {
    float n = valueNoise(vNormal * 2.5 + time * 0.15);
    vec3 base = mix(coreColor, surfaceColor, smoothstep(-0.3, 0.2, n));
    float threshold = 0.5 - torque * 0.2;
    vec3 color = mix(base, glowColor, smoothstep(threshold, threshold + 0.2, n));
    float rim = pow(1.0 - dot(vNormal, vec3(0.0, 0.0, 1.0)), 2.5);
    color += glowColor * rim * (0.4 + torque * 0.3);
    gl_FragColor = vec4(color, 1.0);
}
";

const CORONA_VERTEX: &str = r"
varying vec3 vNormal;
varying vec3 vViewPosition;

void main() {
    vNormal = normalize(normalMatrix * normal);
    vec4 mv = modelViewMatrix * vec4(position, 1.0);
    vViewPosition = -mv.xyz;
    gl_Position = projectionMatrix * mv;
}
";

const CORONA_FRAGMENT: &str = r"
uniform float time;
uniform float torque;
uniform vec3 baseColor;
varying vec3 vNormal;
varying vec3 vViewPosition;

void main() {
    float facing = 1.0 - max(0.0, dot(normalize(vNormal), normalize(vViewPosition)));
    float pulse = sin(time * 3.0) * 0.1 + 0.9;
    gl_FragColor = vec4(baseColor, facing * facing * (0.3 + torque * 0.5) * pulse);
}
";

const MAGNETIC_VERTEX: &str = r"
varying vec2 vUv;

void main() {
    vUv = uv;
    gl_Position = projectionMatrix * modelViewMatrix * vec4(position, 1.0);
}
";

const MAGNETIC_FRAGMENT: &str = r"
uniform float time;
uniform float torque;
uniform vec3 color;
varying vec2 vUv;

float hash(vec2 p) {
    return fract(sin(dot(p, vec2(127.1, 311.7))) * 43758.5453);
}

float valueNoise(vec2 x) {
    vec2 i = floor(x);
    vec2 f = fract(x);
    f = f * f * (3.0 - 2.0 * f);
    return mix(mix(hash(i), hash(i + vec2(1, 0)), f.x),
               mix(hash(i + vec2(0, 1)), hash(i + vec2(1, 1)), f.x), f.y) * 2.0 - 1.0;
}

void main() {
    float n = valueNoise(vec2(vUv.x * 10.0, vUv.y * 5.0 + time * 0.5));
    float flow = sin(vUv.x * 60.0 + time * 2.0 + n * 5.0 * torque);
    float mask = smoothstep(0.0, 0.3, vUv.y) * smoothstep(1.0, 0.7, vUv.y);
    float lines = smoothstep(0.95, 1.0, flow);
    gl_FragColor = vec4(color, lines * mask * 0.4 * (0.5 + torque));
}
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_declare_uniforms() {
        for program in [ShaderProgram::SunSurface, ShaderProgram::Corona, ShaderProgram::MagneticField] {
            let frag = program.fragment_source();
            assert!(frag.contains("uniform float time;"), "{program:?}");
            assert!(frag.contains("uniform float torque;"), "{program:?}");
            for (name, _) in program.color_uniforms() {
                assert!(frag.contains(name), "{program:?} missing {name}");
            }
            assert!(program.vertex_source().contains("gl_Position"));
        }
    }

    #[test]
    fn test_smoothstep_edges() {
        assert!(smoothstep(0.0, 1.0, -1.0).abs() < f64::EPSILON);
        assert!((smoothstep(0.0, 1.0, 2.0) - 1.0).abs() < f64::EPSILON);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < f64::EPSILON);
        // Reversed edges fall instead of rise.
        assert!((smoothstep(1.0, 0.7, 0.5) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_torque_lowers_flare_threshold() {
        assert!((flare_threshold(0.0) - 0.5).abs() < f64::EPSILON);
        assert!((flare_threshold(1.0) - 0.3).abs() < 1e-12);
        assert!(rim_gain(1.0) > rim_gain(0.0));
        // A mid-level noise flares only under high torque.
        let calm = surface_color(0.45, 0.0);
        let storm = surface_color(0.45, 1.0);
        assert!(storm.g > calm.g);
    }

    #[test]
    fn test_corona_is_edge_weighted() {
        let centre = corona_alpha(1.0, 0.0, 0.5);
        let limb = corona_alpha(0.0, 0.0, 0.5);
        assert!(centre.abs() < f64::EPSILON);
        assert!((limb - 0.55 * 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_pole_mask_vanishes_at_poles() {
        assert!(pole_mask(0.0).abs() < f64::EPSILON);
        assert!(pole_mask(1.0).abs() < f64::EPSILON);
        assert!((pole_mask(0.5) - 1.0).abs() < f64::EPSILON);
        assert!((magnetic_alpha(1.0, 0.5, 0.5) - 0.4).abs() < 1e-12);
    }
}
