//! Surface materials.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::color::Color;

use super::resources::TextureId;
use super::shaders::ShaderProgram;

/// How a fragment combines with what is already drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Blending {
    #[default]
    Normal,
    Additive,
}

/// Which faces are rasterised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// A shader uniform value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Uniform {
    Float(f64),
    Color(Color),
}

/// Lighting model and model-specific parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaterialKind {
    /// Unlit.
    Basic,
    /// Blinn–Phong with a self-illumination term.
    Phong {
        specular: Color,
        shininess: f64,
        emissive: Color,
        emissive_intensity: f64,
    },
    /// Physically based, metalness zero.
    Standard {
        roughness: f64,
        emissive: Color,
        emissive_intensity: f64,
    },
    LineBasic,
    Points { size: f64, size_attenuation: bool },
    Sprite,
    Shader {
        program: ShaderProgram,
        uniforms: IndexMap<String, Uniform>,
    },
}

/// A material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub kind: MaterialKind,
    pub color: Color,
    pub map: Option<TextureId>,
    pub opacity: f64,
    pub transparent: bool,
    pub blending: Blending,
    pub side: Side,
    pub depth_write: bool,
    /// Whether scene fog applies.
    pub fog: bool,
}

impl Material {
    fn with_kind(kind: MaterialKind, color: Color) -> Self {
        Self {
            kind,
            color,
            map: None,
            opacity: 1.0,
            transparent: false,
            blending: Blending::Normal,
            side: Side::Front,
            depth_write: true,
            fog: true,
        }
    }

    #[must_use]
    pub fn basic(color: Color) -> Self {
        Self::with_kind(MaterialKind::Basic, color)
    }

    #[must_use]
    pub fn line(color: Color) -> Self {
        Self::with_kind(MaterialKind::LineBasic, color)
    }

    #[must_use]
    pub fn sprite(color: Color) -> Self {
        Self::with_kind(MaterialKind::Sprite, color)
    }

    #[must_use]
    pub fn points(color: Color, size: f64) -> Self {
        Self::with_kind(
            MaterialKind::Points {
                size,
                size_attenuation: true,
            },
            color,
        )
    }

    #[must_use]
    pub fn phong(color: Color, emissive: Color, emissive_intensity: f64) -> Self {
        Self::with_kind(
            MaterialKind::Phong {
                specular: Color::from_hex(0x33_3333),
                shininess: 10.0,
                emissive,
                emissive_intensity,
            },
            color,
        )
    }

    #[must_use]
    pub fn standard(color: Color, roughness: f64) -> Self {
        Self::with_kind(
            MaterialKind::Standard {
                roughness,
                emissive: Color::BLACK,
                emissive_intensity: 0.0,
            },
            color,
        )
    }

    /// Shader material with `time` and `torque` zeroed and the program's
    /// colour uniforms at their defaults. Always transparent.
    #[must_use]
    pub fn shader(program: ShaderProgram) -> Self {
        let mut uniforms = IndexMap::new();
        uniforms.insert("time".to_string(), Uniform::Float(0.0));
        uniforms.insert("torque".to_string(), Uniform::Float(0.0));
        for (name, color) in program.color_uniforms() {
            uniforms.insert((*name).to_string(), Uniform::Color(*color));
        }
        let mut material = Self::with_kind(MaterialKind::Shader { program, uniforms }, Color::WHITE);
        material.transparent = true;
        material
    }

    // ===== Builder-style adjustments =====

    #[must_use]
    pub fn with_map(mut self, texture: TextureId) -> Self {
        self.map = Some(texture);
        self
    }

    /// Set opacity and mark the material transparent.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self.transparent = true;
        self
    }

    #[must_use]
    pub fn additive(mut self) -> Self {
        self.blending = Blending::Additive;
        self
    }

    #[must_use]
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    #[must_use]
    pub fn without_depth_write(mut self) -> Self {
        self.depth_write = false;
        self
    }

    #[must_use]
    pub fn without_fog(mut self) -> Self {
        self.fog = false;
        self
    }

    /// Replace the emissive term of a lit material.
    #[must_use]
    pub fn with_emissive(mut self, color: Color, intensity: f64) -> Self {
        match &mut self.kind {
            MaterialKind::Phong {
                emissive,
                emissive_intensity,
                ..
            }
            | MaterialKind::Standard {
                emissive,
                emissive_intensity,
                ..
            } => {
                *emissive = color;
                *emissive_intensity = intensity;
            }
            _ => {}
        }
        self
    }

    // ===== Uniforms =====

    /// Set a float uniform. Returns `false` if this is not a shader
    /// material or it has no such uniform.
    pub fn set_uniform(&mut self, name: &str, value: f64) -> bool {
        match &mut self.kind {
            MaterialKind::Shader { uniforms, .. } => match uniforms.get_mut(name) {
                Some(slot) if matches!(slot, Uniform::Float(_)) => {
                    *slot = Uniform::Float(value);
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Read a float uniform.
    #[must_use]
    pub fn uniform(&self, name: &str) -> Option<f64> {
        match &self.kind {
            MaterialKind::Shader { uniforms, .. } => match uniforms.get(name) {
                Some(Uniform::Float(v)) => Some(*v),
                _ => None,
            },
            _ => None,
        }
    }

    /// Shader program, if any.
    #[must_use]
    pub const fn program(&self) -> Option<ShaderProgram> {
        match &self.kind {
            MaterialKind::Shader { program, .. } => Some(*program),
            _ => None,
        }
    }

    /// Colour with opacity folded into alpha.
    #[must_use]
    pub fn effective_color(&self) -> Color {
        if self.transparent {
            self.color.with_alpha(self.opacity)
        } else {
            self.color
        }
    }
}
