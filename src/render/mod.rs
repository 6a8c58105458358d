//! Platform-agnostic render commands.
//!
//! The scene graph is flattened into a list of 2D drawing commands in
//! screen pixels, painter-ordered far to near. The same list drives the
//! canvas host in the browser, the terminal front-end and the headless
//! surface used in tests:
//!
//! ```text
//! Scene + camera → CommandRenderer → Vec<RenderCommand> → Surface
//! ```
//!
//! Projection goes through the perspective camera, so the result matches
//! what a GPU renderer would place on screen. Shading is reduced to one
//! colour per node; fog is folded into alpha.

pub mod surface;

use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::scene::builder::Scene;
use crate::scene::camera::PerspectiveCamera;
use crate::scene::geometry::Geometry;
use crate::scene::graph::{Fog, NodeKind};
use crate::scene::material::{Material, MaterialKind, Side};
use crate::scene::shaders::{corona_alpha, surface_color, ShaderProgram};

pub use surface::{HeadlessSurface, Surface};

/// A drawing command in screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Clear the screen.
    Clear { color: Color },

    /// Draw a disc or circle outline.
    DrawCircle {
        x: f64,
        y: f64,
        radius: f64,
        color: Color,
        filled: bool,
    },

    /// Draw a connected line strip.
    DrawPolyline { points: Vec<(f64, f64)>, color: Color },

    /// Draw square points.
    DrawPoints {
        points: Vec<(f64, f64)>,
        size: f64,
        color: Color,
    },

    /// Draw a soft radial sprite.
    DrawGlow {
        x: f64,
        y: f64,
        radius: f64,
        color: Color,
    },

    /// Draw text centred on a point.
    DrawText {
        x: f64,
        y: f64,
        text: String,
        color: Color,
    },
}

impl RenderCommand {
    /// Short name of the command, for logs and stats.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Clear { .. } => "clear",
            Self::DrawCircle { .. } => "circle",
            Self::DrawPolyline { .. } => "polyline",
            Self::DrawPoints { .. } => "points",
            Self::DrawGlow { .. } => "glow",
            Self::DrawText { .. } => "text",
        }
    }
}

/// Viewpoint of one frame.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    pub camera: &'a PerspectiveCamera,
    /// Look target of the orbit controls.
    pub target: DVec3,
    pub width: u32,
    pub height: u32,
}

/// Turns a scene into drawing commands.
pub trait Renderer {
    /// Render one frame.
    fn render(&mut self, scene: &Scene, view: &View<'_>) -> Vec<RenderCommand>;
}

/// Renderer options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRendererConfig {
    /// Longest polyline emitted; longer strips are decimated.
    pub max_polyline_points: usize,
    /// Smallest circle radius in pixels.
    pub min_radius: f64,
    /// Alpha below which a node is not drawn.
    pub alpha_cutoff: u8,
}

impl Default for CommandRendererConfig {
    fn default() -> Self {
        Self {
            max_polyline_points: 2_000,
            min_radius: 1.0,
            alpha_cutoff: 1,
        }
    }
}

/// Projects the scene through the camera.
#[derive(Debug, Clone, Default)]
pub struct CommandRenderer {
    config: CommandRendererConfig,
    last_count: usize,
}

impl CommandRenderer {
    #[must_use]
    pub fn new(config: CommandRendererConfig) -> Self {
        Self { config, last_count: 0 }
    }

    /// Commands emitted by the last frame.
    #[must_use]
    pub const fn last_count(&self) -> usize {
        self.last_count
    }
}

/// Screen mapping for one frame.
struct Projector {
    clip: DMat4,
    eye: DVec3,
    width: f64,
    height: f64,
    fov_tan: f64,
    fog: Option<Fog>,
}

impl Projector {
    fn new(view: &View<'_>, fog: Option<Fog>) -> Self {
        let camera = view.camera;
        Self {
            clip: camera.projection_matrix() * camera.view_matrix(view.target),
            eye: camera.position,
            width: f64::from(view.width.max(1)),
            height: f64::from(view.height.max(1)),
            fov_tan: (camera.fov_deg.to_radians() / 2.0).tan(),
            fog,
        }
    }

    /// Pixel position of a scene point, `None` if clipped.
    fn screen(&self, p: DVec3) -> Option<(f64, f64)> {
        let c = self.clip * p.extend(1.0);
        if c.w <= 0.0 {
            return None;
        }
        let ndc = c.truncate() / c.w;
        if !(-1.0..=1.0).contains(&ndc.z) {
            return None;
        }
        Some(((ndc.x + 1.0) * 0.5 * self.width, (1.0 - ndc.y) * 0.5 * self.height))
    }

    /// Whether a disc touches the viewport.
    fn overlaps(&self, x: f64, y: f64, radius: f64) -> bool {
        x + radius >= 0.0 && x - radius <= self.width && y + radius >= 0.0 && y - radius <= self.height
    }

    /// Pixels covered by `size` scene units at `p`.
    fn pixels(&self, p: DVec3, size: f64) -> f64 {
        let distance = self.eye.distance(p).max(1e-6);
        size * self.height / (2.0 * self.fov_tan * distance)
    }

    /// Colour after fog, for materials that take it.
    fn shade(&self, color: Color, material: &Material, p: DVec3) -> Color {
        match self.fog {
            Some(fog) if material.fog => {
                let keep = 1.0 - fog.factor(self.eye.distance(p));
                color.with_alpha(color.alpha() * keep)
            }
            _ => color,
        }
    }
}

impl CommandRenderer {
    fn decimate(&self, points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
        let max = self.config.max_polyline_points.max(2);
        if points.len() <= max {
            return points;
        }
        let stride = points.len().div_ceil(max);
        let last = points.last().copied();
        let mut out: Vec<(f64, f64)> = points.into_iter().step_by(stride).collect();
        if let Some(last) = last {
            if out.last() != Some(&last) {
                out.push(last);
            }
        }
        out
    }

    /// Split a projected strip at clipped points.
    fn strips(&self, projector: &Projector, world: &DMat4, points: &[DVec3], color: Color) -> Vec<RenderCommand> {
        let mut out = Vec::new();
        let mut current = Vec::new();
        for p in points {
            if let Some(s) = projector.screen(world.transform_point3(*p)) {
                current.push(s);
            } else if current.len() > 1 {
                out.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
        if current.len() > 1 {
            out.push(current);
        }
        out.into_iter()
            .map(|points| RenderCommand::DrawPolyline {
                points: self.decimate(points),
                color,
            })
            .collect()
    }

    fn mesh(&self, projector: &Projector, world: &DMat4, geometry: &Geometry, material: &Material) -> Option<RenderCommand> {
        // Inside-out shells (the sky) are the backdrop, not an object.
        if material.side == Side::Back {
            return None;
        }
        let (scale, _, centre) = world.to_scale_rotation_translation();
        let (x, y) = projector.screen(centre)?;
        let radius = projector.pixels(centre, geometry.bounding_radius() * scale.max_element());

        let (color, filled) = match material.program() {
            Some(ShaderProgram::SunSurface) => {
                let torque = material.uniform("torque").unwrap_or(0.0);
                (surface_color(0.3, torque), true)
            }
            Some(ShaderProgram::Corona) => {
                let torque = material.uniform("torque").unwrap_or(0.0);
                let time = material.uniform("time").unwrap_or(0.0);
                (Color::from_hex(0xff_aa00).with_alpha(corona_alpha(0.0, time, torque)), false)
            }
            Some(ShaderProgram::MagneticField) => return None,
            None => {
                let filled = matches!(geometry, Geometry::Sphere { .. } | Geometry::Cone { .. });
                (material.effective_color(), filled && material.opacity >= 0.5)
            }
        };
        let color = projector.shade(color, material, centre);
        let radius = radius.max(self.config.min_radius);
        if color.a < self.config.alpha_cutoff || !projector.overlaps(x, y, radius) {
            return None;
        }
        Some(RenderCommand::DrawCircle {
            x,
            y,
            radius,
            color,
            filled,
        })
    }
}

impl Renderer for CommandRenderer {
    fn render(&mut self, scene: &Scene, view: &View<'_>) -> Vec<RenderCommand> {
        let graph = &scene.graph;
        let resources = &scene.resources;
        let projector = Projector::new(view, graph.fog());

        // Parents precede children in the arena, so one pass resolves both.
        let mut world: Vec<DMat4> = Vec::with_capacity(graph.len());
        let mut visible: Vec<bool> = Vec::with_capacity(graph.len());
        let mut items: Vec<(f64, RenderCommand)> = Vec::new();

        for (id, node) in graph.iter() {
            let (parent_world, parent_visible) = node
                .parent
                .map_or((DMat4::IDENTITY, true), |p| (world[p.index()], visible[p.index()]));
            let w = parent_world * node.transform.matrix();
            let shown = parent_visible && node.visible;
            world.push(w);
            visible.push(shown);
            debug_assert_eq!(world.len(), id.index() + 1);
            if !shown {
                continue;
            }

            let origin = w.transform_point3(DVec3::ZERO);
            let depth = projector.eye.distance(origin);
            let material = node.kind.material().and_then(|m| resources.material(m).ok());
            let geometry = node.kind.geometry().and_then(|g| resources.geometry(g).ok());

            match (&node.kind, material, geometry) {
                (NodeKind::Mesh { .. }, Some(m), Some(g)) => {
                    if let Some(cmd) = self.mesh(&projector, &w, g, m) {
                        items.push((depth, cmd));
                    }
                }
                (NodeKind::Line { .. }, Some(m), Some(g)) => {
                    let points = g.points().unwrap_or_default();
                    // Long strips are fogged by their nearest vertex.
                    let nearest = points
                        .iter()
                        .map(|p| w.transform_point3(*p))
                        .min_by(|a, b| projector.eye.distance(*a).total_cmp(&projector.eye.distance(*b)))
                        .unwrap_or(origin);
                    let color = projector.shade(m.effective_color(), m, nearest);
                    if color.a >= self.config.alpha_cutoff {
                        let depth = projector.eye.distance(nearest);
                        for cmd in self.strips(&projector, &w, points, color) {
                            items.push((depth, cmd));
                        }
                    }
                }
                (NodeKind::Points { .. }, Some(m), Some(g)) => {
                    let points: Vec<(f64, f64)> = g
                        .points()
                        .unwrap_or_default()
                        .iter()
                        .filter_map(|p| projector.screen(w.transform_point3(*p)))
                        .collect();
                    let size = match m.kind {
                        MaterialKind::Points { size, .. } => size,
                        _ => 1.0,
                    };
                    if !points.is_empty() {
                        // Stars sit behind everything.
                        items.push((f64::INFINITY, RenderCommand::DrawPoints {
                            points,
                            size: (size / 10.0).max(1.0),
                            color: m.effective_color(),
                        }));
                    }
                }
                (NodeKind::Sprite { .. }, Some(m), _) => {
                    if let Some((x, y)) = projector.screen(origin) {
                        let (scale, _, _) = w.to_scale_rotation_translation();
                        let color = projector.shade(m.effective_color(), m, origin);
                        items.push((depth, RenderCommand::DrawGlow {
                            x,
                            y,
                            radius: projector.pixels(origin, scale.x * 0.5),
                            color,
                        }));
                    }
                }
                (NodeKind::Text { .. }, Some(m), Some(Geometry::Text { text, .. })) => {
                    if let Some((x, y)) = projector.screen(origin) {
                        items.push((depth, RenderCommand::DrawText {
                            x,
                            y,
                            text: text.clone(),
                            color: projector.shade(m.effective_color(), m, origin),
                        }));
                    }
                }
                _ => {}
            }
        }

        items.sort_by(|a, b| b.0.total_cmp(&a.0));
        let clear = graph.fog().map_or(Color::BLACK, |f| f.color);
        let mut commands = Vec::with_capacity(items.len() + 1);
        commands.push(RenderCommand::Clear { color: clear });
        commands.extend(items.into_iter().map(|(_, cmd)| cmd));

        self.last_count = commands.len();
        tracing::trace!(commands = commands.len(), "frame rendered");
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::SceneState;
    use crate::config::OrreryConfig;
    use crate::scene::builder::SceneBuilder;

    fn advanced_state() -> SceneState {
        let config = OrreryConfig::builder()
            .seed(11)
            .trail_steps(400)
            .spine_samples(100)
            .star_count(200)
            .texture_divisor(16)
            .build();
        let scene = SceneBuilder::new(&config).build().unwrap_or_else(|e| unreachable!("{e}"));
        let mut state = SceneState::new(scene, &config, 800, 600);
        state.advance(1.0 / 60.0, 2024.0);
        state
    }

    fn render(state: &SceneState, renderer: &mut CommandRenderer) -> Vec<RenderCommand> {
        let view = View {
            camera: state.camera(),
            target: state.controls().target,
            width: 800,
            height: 600,
        };
        renderer.render(state.scene(), &view)
    }

    #[test]
    fn test_frame_starts_with_fog_clear() {
        let state = advanced_state();
        let commands = render(&state, &mut CommandRenderer::default());
        assert_eq!(commands.first(), Some(&RenderCommand::Clear { color: Color::FOG }));
    }

    #[test]
    fn test_sun_is_drawn_at_screen_centre() {
        let state = advanced_state();
        let commands = render(&state, &mut CommandRenderer::default());
        let centred = commands.iter().any(|c| match c {
            RenderCommand::DrawCircle { x, y, filled: true, .. } => (x - 400.0).abs() < 1.0 && (y - 300.0).abs() < 1.0,
            _ => false,
        });
        assert!(centred);
    }

    #[test]
    fn test_labels_and_stars_present() {
        let state = advanced_state();
        let mut renderer = CommandRenderer::default();
        let commands = render(&state, &mut renderer);
        assert_eq!(renderer.last_count(), commands.len());
        assert!(commands.iter().any(|c| matches!(c, RenderCommand::DrawPoints { .. })));
        assert!(commands.iter().any(|c| matches!(c, RenderCommand::DrawPolyline { .. })));
        // Stars are painted first.
        assert!(matches!(commands.get(1), Some(RenderCommand::DrawPoints { .. })));
    }

    #[test]
    fn test_polylines_are_decimated() {
        let state = advanced_state();
        let mut renderer = CommandRenderer::new(CommandRendererConfig {
            max_polyline_points: 50,
            ..CommandRendererConfig::default()
        });
        let commands = render(&state, &mut renderer);
        for c in &commands {
            if let RenderCommand::DrawPolyline { points, .. } = c {
                assert!(points.len() <= 51, "{}", points.len());
            }
        }
    }

    #[test]
    fn test_hidden_trail_not_drawn() {
        let mut state = advanced_state();
        let before = render(&state, &mut CommandRenderer::default())
            .iter()
            .filter(|c| c.label() == "polyline")
            .count();
        for planet in crate::orbit::elements::Planet::ALL {
            assert!(state.set_trail_visible(planet, false).is_ok());
        }
        let after = render(&state, &mut CommandRenderer::default())
            .iter()
            .filter(|c| c.label() == "polyline")
            .count();
        assert!(after < before);
    }

    #[test]
    fn test_commands_serialize() {
        let cmd = RenderCommand::DrawText {
            x: 1.0,
            y: 2.0,
            text: "1859".to_string(),
            color: Color::WHITE,
        };
        let json = serde_json::to_string(&cmd).unwrap_or_default();
        assert!(json.contains("DrawText"));
        let back: Option<RenderCommand> = serde_json::from_str(&json).ok();
        assert_eq!(back, Some(cmd));
    }
}
