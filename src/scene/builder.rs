//! One-time scene assembly.
//!
//! [`SceneBuilder::build`] creates every node, geometry, material and
//! texture the view will ever use, and returns them with typed handles so
//! the frame loop can reach each animated node without searching. The
//! expensive parts are the precomputed paths:
//! - one trail per planet, sampled across the whole year range
//! - the Sun's barycentric spine, resampled through a Catmull–Rom curve

use glam::{DVec2, DVec3};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::color::Color;
use crate::config::OrreryConfig;
use crate::engine::epoch::{MAX_YEAR, MIN_YEAR};
use crate::engine::rng::SeededRng;
use crate::error::OrreryResult;
use crate::orbit::elements::Planet;
use crate::orbit::epochs::{NotableEpoch, NOTABLE_EPOCHS};
use crate::orbit::solver::{heliocentric_position, Projection};
use crate::texture::{Detail, Texture, TextureSet};

use super::geometry::{catmull_rom_centripetal, ellipse_points, Geometry};
use super::graph::{Fog, NodeId, NodeKind, SceneGraph, Transform};
use super::material::{Material, Side};
use super::resources::{GeometryId, MaterialId, ResourceLedger, TextureId};
use super::shaders::ShaderProgram;

/// Radii of the global plasma shells around the Sun.
pub const PLASMA_SHELL_SIZES: [f64; 4] = [100.0, 200.0, 350.0, 550.0];
/// Radius of the sky sphere.
pub const SKYBOX_RADIUS: f64 = 8_000.0;
/// Radius of the per-planet instantaneous orbit ring before scaling.
pub const ORBIT_RING_RADIUS: f64 = 10.0;
/// Radius of the Moon's display orbit.
pub const MOON_ORBIT_RADIUS: f64 = 6.0;
/// Base size of the Sun glow sprite.
pub const GLOW_BASE_SCALE: f64 = 70.0;
/// Marker label offset from the spine.
pub const MARKER_OFFSET: DVec2 = DVec2::new(50.0, 30.0);

const FOG_DENSITY: f64 = 0.0006;
const SPHERE_SEGMENTS: u32 = 64;
const FIELD_SEGMENTS: u32 = 32;
const FIELD_SHELLS: usize = 2;
const STAR_RADIUS: (f64, f64) = (4_000.0, 7_000.0);
const STAR_SIZE: f64 = 15.0;

/// One pulsing field shell around a planet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldShell {
    pub node: NodeId,
    pub material: MaterialId,
    pub base_scale: f64,
    /// Pulse frequency, from the planet's mean motion.
    pub freq: f64,
    /// Shell index; doubles as the pulse phase.
    pub phase: usize,
}

/// One of the slowly turning plasma shells around the Sun.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlasmaShell {
    pub node: NodeId,
    pub rot_speed: f64,
    pub pulse_speed: f64,
    pub base_scale: f64,
}

/// Nodes belonging to one planet.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanetNodes {
    pub planet: Planet,
    /// Positioned per frame.
    pub group: NodeId,
    /// Fixed axial tilt about `z`.
    pub tilt: NodeId,
    /// Spins about local `y`.
    pub body: NodeId,
    pub axis: NodeId,
    pub pole: NodeId,
    pub equator: Option<NodeId>,
    pub ring: Option<NodeId>,
    pub fields: Vec<FieldShell>,
    /// Instantaneous orbit ring, centred on the Sun.
    pub orbit_ring: NodeId,
    /// Precomputed path under the time axis.
    pub trail: NodeId,
    pub trail_material: MaterialId,
    pub moon: Option<NodeId>,
    pub moon_orbit: Option<NodeId>,
}

/// Label and leader line of a notable epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerNodes {
    pub epoch: &'static NotableEpoch,
    pub label: NodeId,
    pub leader: NodeId,
}

/// Typed access to every node the frame loop touches.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneHandles {
    pub background: NodeId,
    pub skybox: NodeId,
    pub stars: NodeId,
    pub sun_light: NodeId,
    pub ambient_light: NodeId,
    /// Stretched along `z` by the time-axis scale.
    pub time_axis: NodeId,
    pub spine: NodeId,
    pub marker_group: NodeId,
    /// Unstretched group holding everything that rides the current year.
    pub cursor: NodeId,
    pub sun: NodeId,
    pub sun_material: MaterialId,
    pub glow: NodeId,
    pub glow_material: MaterialId,
    pub corona: NodeId,
    pub corona_material: MaterialId,
    pub magnetic: NodeId,
    pub magnetic_material: MaterialId,
    pub plasma: NodeId,
    pub plasma_shells: Vec<PlasmaShell>,
    pub planets: Vec<PlanetNodes>,
    pub markers: Vec<MarkerNodes>,
}

impl SceneHandles {
    /// Nodes of one planet.
    #[must_use]
    pub fn planet(&self, planet: Planet) -> Option<&PlanetNodes> {
        self.planets.iter().find(|p| p.planet == planet)
    }
}

/// A built scene: graph, resources and handles.
#[derive(Debug)]
pub struct Scene {
    pub graph: SceneGraph,
    pub resources: ResourceLedger,
    pub handles: SceneHandles,
    pub projection: Projection,
}

impl Scene {
    /// Release every resource and drop the graph.
    pub fn dispose(&mut self) -> super::resources::ResourceCounts {
        let released = self.resources.dispose();
        self.graph.clear();
        released
    }
}

/// Trail points for every planet, in [`Planet::ALL`] order.
///
/// Each trail has `steps + 1` samples spaced evenly over the year range.
/// A point is the Sun's offset plus the planet's display offset, at the
/// unstretched time-axis depth of its year.
#[must_use]
pub fn precompute_trails(projection: &Projection, steps: usize) -> Vec<Vec<DVec3>> {
    let steps = steps.max(1);
    let step = (MAX_YEAR - MIN_YEAR) / steps as f64;
    let mut trails: Vec<Vec<DVec3>> = Planet::ALL.iter().map(|_| Vec::with_capacity(steps + 1)).collect();

    for i in 0..=steps {
        let year = MIN_YEAR + i as f64 * step;
        let helio = Planet::ALL.map(|p| heliocentric_position(p, year));
        let sun = sun_offset_from(&helio, projection.exaggeration);
        let z = projection.axis_z(year);
        for (trail, h) in trails.iter_mut().zip(helio) {
            let p = sun + projection.offset(h);
            trail.push(DVec3::new(p.x, p.y, z));
        }
    }
    trails
}

/// Sun offsets at `samples + 1` evenly spaced years, at unstretched depth.
#[must_use]
pub fn spine_samples(projection: &Projection, samples: usize) -> Vec<DVec3> {
    let samples = samples.max(1);
    (0..=samples)
        .map(|i| {
            let year = MIN_YEAR + (i as f64 / samples as f64) * (MAX_YEAR - MIN_YEAR);
            let sun = projection.sun_offset(year.into());
            DVec3::new(sun.x, sun.y, projection.axis_z(year))
        })
        .collect()
}

/// Same sum as the solver's barycentric offset, reusing positions already
/// computed for the trails.
fn sun_offset_from(helio: &[DVec2; 8], exaggeration: f64) -> DVec2 {
    let sum: DVec2 = Planet::ALL
        .into_iter()
        .zip(helio)
        .map(|(p, h)| *h * p.elements().mass)
        .sum();
    -sum * exaggeration
}

/// Graph and ledger under construction.
struct Assembly {
    graph: SceneGraph,
    resources: ResourceLedger,
}

impl Assembly {
    fn node(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        kind: NodeKind,
        transform: Transform,
    ) -> OrreryResult<NodeId> {
        self.graph.add_with(parent, name, kind, transform)
    }

    fn group(&mut self, parent: NodeId, name: impl Into<String>) -> OrreryResult<NodeId> {
        self.node(parent, name, NodeKind::Group, Transform::IDENTITY)
    }

    fn parts(&mut self, geometry: Geometry, material: Material) -> OrreryResult<(GeometryId, MaterialId)> {
        Ok((self.resources.add_geometry(geometry)?, self.resources.add_material(material)?))
    }

    fn mesh(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        geometry: Geometry,
        material: Material,
        transform: Transform,
    ) -> OrreryResult<(NodeId, MaterialId)> {
        let (geometry, material) = self.parts(geometry, material)?;
        let id = self.node(parent, name, NodeKind::Mesh { geometry, material }, transform)?;
        Ok((id, material))
    }

    fn line(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        points: Vec<DVec3>,
        material: Material,
        transform: Transform,
    ) -> OrreryResult<(NodeId, MaterialId)> {
        let (geometry, material) = self.parts(Geometry::Polyline { points }, material)?;
        let id = self.node(parent, name, NodeKind::Line { geometry, material }, transform)?;
        Ok((id, material))
    }
}

/// Transform lying a local XY shape flat in the XZ plane.
fn flat(position: DVec3) -> Transform {
    Transform {
        position,
        rotation: DVec3::new(FRAC_PI_2, 0.0, 0.0),
        scale: DVec3::ONE,
    }
}

/// Builds the scene from configuration.
#[derive(Debug)]
pub struct SceneBuilder<'a> {
    config: &'a OrreryConfig,
    projection: Projection,
}

impl<'a> SceneBuilder<'a> {
    #[must_use]
    pub fn new(config: &'a OrreryConfig) -> Self {
        Self {
            config,
            projection: Projection::from_config(&config.projection),
        }
    }

    /// Assemble the whole scene.
    ///
    /// # Errors
    ///
    /// Propagates texture synthesis failures.
    pub fn build(self) -> OrreryResult<Scene> {
        let seed = self.config.reproducibility.seed;
        let _span = tracing::debug_span!("scene_build", seed).entered();

        let textures = TextureSet::generate(seed, Detail::divisor(self.config.scene.texture_divisor))?;
        let mut asm = Assembly {
            graph: SceneGraph::new(),
            resources: ResourceLedger::new(),
        };
        asm.graph.set_fog(Some(Fog {
            color: Color::FOG,
            density: FOG_DENSITY,
        }));

        let TextureSet {
            planets: planet_textures,
            caustic,
            nebula,
            glow,
        } = textures;
        let nebula = asm.resources.add_texture(nebula)?;
        let caustic = asm.resources.add_texture(caustic)?;
        let glow = asm.resources.add_texture(glow)?;
        let mut surfaces: Vec<(Planet, TextureId)> = Vec::with_capacity(planet_textures.len());
        for (planet, texture) in planet_textures {
            surfaces.push((planet, asm.resources.add_texture(texture)?));
        }

        let root = asm.graph.root();
        let (background, skybox, stars) = self.background(&mut asm, root, nebula, seed)?;

        let sun_light = asm.node(
            root,
            "sun_light",
            NodeKind::PointLight {
                color: Color::WHITE,
                intensity: 3.0,
                range: 6_000.0,
            },
            Transform::IDENTITY,
        )?;
        let ambient_light = asm.node(
            root,
            "ambient_light",
            NodeKind::AmbientLight {
                color: Color::AMBIENT,
                intensity: 1.5,
            },
            Transform::IDENTITY,
        )?;

        let time_axis = asm.node(
            root,
            "time_axis",
            NodeKind::Group,
            Transform {
                scale: DVec3::new(1.0, 1.0, self.projection.z_scale),
                ..Transform::IDENTITY
            },
        )?;
        let spine = self.spine(&mut asm, time_axis)?;
        let trails = self.trails(&mut asm, time_axis)?;

        let cursor = asm.group(root, "cursor")?;
        let sun = self.sun(&mut asm, cursor, glow)?;
        let (plasma, plasma_shells) = self.plasma(&mut asm, cursor, caustic, seed)?;

        let mut planets = Vec::with_capacity(Planet::ALL.len());
        for ((planet, surface), (trail, trail_material)) in surfaces.into_iter().zip(trails) {
            planets.push(self.planet(&mut asm, cursor, planet, surface, trail, trail_material)?);
        }

        let marker_group = asm.group(time_axis, "markers")?;
        let markers = self.markers(&mut asm, marker_group)?;

        let live = asm.resources.live();
        tracing::info!(
            nodes = asm.graph.len(),
            geometries = live.geometries,
            materials = live.materials,
            textures = live.textures,
            "scene built"
        );

        Ok(Scene {
            graph: asm.graph,
            resources: asm.resources,
            handles: SceneHandles {
                background,
                skybox,
                stars,
                sun_light,
                ambient_light,
                time_axis,
                spine,
                marker_group,
                cursor,
                sun: sun.node,
                sun_material: sun.material,
                glow: sun.glow,
                glow_material: sun.glow_material,
                corona: sun.corona,
                corona_material: sun.corona_material,
                magnetic: sun.magnetic,
                magnetic_material: sun.magnetic_material,
                plasma,
                plasma_shells,
                planets,
                markers,
            },
            projection: self.projection,
        })
    }

    fn background(
        &self,
        asm: &mut Assembly,
        root: NodeId,
        nebula: TextureId,
        seed: u64,
    ) -> OrreryResult<(NodeId, NodeId, NodeId)> {
        let background = asm.group(root, "background")?;
        let sky = Material::basic(Color::WHITE)
            .with_map(nebula)
            .with_side(Side::Back)
            .without_fog()
            .without_depth_write();
        let (skybox, _) = asm.mesh(
            background,
            "skybox",
            Geometry::sphere(SKYBOX_RADIUS, SPHERE_SEGMENTS),
            sky,
            Transform::IDENTITY,
        )?;

        let mut rng = SeededRng::named(seed, "scene/starfield");
        let points: Vec<DVec3> = (0..self.config.scene.star_count)
            .map(|_| {
                let r = STAR_RADIUS.0 + rng.gen_f64() * (STAR_RADIUS.1 - STAR_RADIUS.0);
                let theta = rng.gen_f64() * TAU;
                let phi = (2.0 * rng.gen_f64() - 1.0).acos();
                DVec3::new(
                    r * phi.sin() * theta.cos(),
                    r * phi.sin() * theta.sin(),
                    r * phi.cos(),
                )
            })
            .collect();
        let star_material = Material::points(Color::WHITE, STAR_SIZE)
            .with_opacity(0.9)
            .without_fog()
            .additive();
        let (geometry, material) = asm.parts(Geometry::PointCloud { points }, star_material)?;
        let stars = asm.node(background, "stars", NodeKind::Points { geometry, material }, Transform::IDENTITY)?;

        Ok((background, skybox, stars))
    }

    fn spine(&self, asm: &mut Assembly, time_axis: NodeId) -> OrreryResult<NodeId> {
        let scene = &self.config.scene;
        let samples = spine_samples(&self.projection, scene.spine_samples);
        let curve = catmull_rom_centripetal(&samples, scene.spine_points);
        let material = Material::line(Color::SPINE).with_opacity(0.5);
        let (spine, _) = asm.line(time_axis, "spine", curve, material, Transform::IDENTITY)?;
        Ok(spine)
    }

    fn trails(&self, asm: &mut Assembly, time_axis: NodeId) -> OrreryResult<Vec<(NodeId, MaterialId)>> {
        let scene = &self.config.scene;
        let paths = precompute_trails(&self.projection, scene.trail_steps);
        let mut out = Vec::with_capacity(paths.len());
        for (planet, points) in Planet::ALL.into_iter().zip(paths) {
            let color = Color::from_hex(planet.elements().color);
            let material = Material::line(color).with_opacity(scene.trail_opacity);
            let (node, material) = asm.line(
                time_axis,
                format!("trail/{}", planet.name()),
                points,
                material,
                Transform::IDENTITY,
            )?;
            if scene.hidden_trails.contains(&planet) {
                asm.graph.node_mut(node)?.visible = false;
            }
            out.push((node, material));
        }
        Ok(out)
    }

    fn sun(&self, asm: &mut Assembly, cursor: NodeId, glow: TextureId) -> OrreryResult<SunNodes> {
        let (node, material) = asm.mesh(
            cursor,
            "sun",
            Geometry::sphere(4.0, SPHERE_SEGMENTS),
            Material::shader(ShaderProgram::SunSurface),
            Transform::IDENTITY,
        )?;

        // Child order is glow, corona, magnetic field.
        let glow_material = asm.resources.add_material(
            Material::sprite(Color::from_hex(0xff_4400))
                .with_map(glow)
                .with_opacity(0.8)
                .additive(),
        )?;
        let glow_node = asm.node(
            node,
            "sun/glow",
            NodeKind::Sprite {
                material: glow_material,
            },
            Transform {
                scale: DVec3::new(GLOW_BASE_SCALE, GLOW_BASE_SCALE, 1.0),
                ..Transform::IDENTITY
            },
        )?;

        let mut corona_material = Material::shader(ShaderProgram::Corona).additive().without_depth_write();
        corona_material.side = Side::Front;
        let (corona, corona_material) = asm.mesh(
            node,
            "sun/corona",
            Geometry::sphere(4.5, SPHERE_SEGMENTS),
            corona_material,
            Transform::IDENTITY,
        )?;

        let magnetic_material = Material::shader(ShaderProgram::MagneticField)
            .with_side(Side::Double)
            .without_depth_write()
            .additive();
        let (magnetic, magnetic_material) = asm.mesh(
            node,
            "sun/magnetic_field",
            Geometry::sphere(4.1, SPHERE_SEGMENTS),
            magnetic_material,
            Transform::IDENTITY,
        )?;

        Ok(SunNodes {
            node,
            material,
            glow: glow_node,
            glow_material,
            corona,
            corona_material,
            magnetic,
            magnetic_material,
        })
    }

    fn plasma(
        &self,
        asm: &mut Assembly,
        cursor: NodeId,
        caustic: TextureId,
        seed: u64,
    ) -> OrreryResult<(NodeId, Vec<PlasmaShell>)> {
        let group = asm.group(cursor, "plasma")?;
        let mut rng = SeededRng::named(seed, "scene/plasma");
        let mut shells = Vec::with_capacity(PLASMA_SHELL_SIZES.len());

        for (i, size) in PLASMA_SHELL_SIZES.into_iter().enumerate() {
            let material = Material::basic(Color::SOLAR_GOLD)
                .with_map(caustic)
                .with_opacity(0.01 + i as f64 * 0.005)
                .additive()
                .with_side(Side::Double)
                .without_depth_write();
            let rotation = DVec3::new(rng.gen_f64() * PI, rng.gen_f64() * PI, rng.gen_f64() * PI);
            let (node, _) = asm.mesh(
                group,
                format!("plasma/{i}"),
                Geometry::sphere(size, SPHERE_SEGMENTS),
                material,
                Transform {
                    rotation,
                    ..Transform::IDENTITY
                },
            )?;
            let direction = if i % 2 == 0 { 1.0 } else { -1.0 };
            shells.push(PlasmaShell {
                node,
                rot_speed: 0.0002 * direction,
                pulse_speed: 0.0005 + i as f64 * 0.0002,
                base_scale: 1.0,
            });
        }
        Ok((group, shells))
    }

    fn planet(
        &self,
        asm: &mut Assembly,
        cursor: NodeId,
        planet: Planet,
        surface: TextureId,
        trail: NodeId,
        trail_material: MaterialId,
    ) -> OrreryResult<PlanetNodes> {
        let el = planet.elements();
        let name = planet.name();
        let color = Color::from_hex(el.color);
        let size = el.size;

        let group = asm.group(cursor, format!("planet/{name}"))?;
        let tilt = asm.node(
            group,
            format!("planet/{name}/tilt"),
            NodeKind::Group,
            Transform {
                rotation: DVec3::new(0.0, 0.0, el.axial_tilt_deg.to_radians()),
                ..Transform::IDENTITY
            },
        )?;

        let surface_material = Material::phong(Color::WHITE, color, 0.2).with_map(surface);
        let (body, _) = asm.mesh(
            tilt,
            format!("planet/{name}/body"),
            Geometry::sphere(size, SPHERE_SEGMENTS),
            surface_material,
            Transform::IDENTITY,
        )?;

        let field_group = asm.group(group, format!("planet/{name}/fields"))?;
        let mut fields = Vec::with_capacity(FIELD_SHELLS);
        for f in 0..FIELD_SHELLS {
            let base_scale = 4.0 + f as f64 * 3.0;
            let material = Material::basic(color)
                .with_opacity(0.02)
                .additive()
                .with_side(Side::Double)
                .without_depth_write();
            let (node, material) = asm.mesh(
                field_group,
                format!("planet/{name}/field/{f}"),
                Geometry::sphere(size * base_scale, FIELD_SEGMENTS),
                material,
                Transform::IDENTITY,
            )?;
            fields.push(FieldShell {
                node,
                material,
                base_scale,
                freq: el.mean_motion_deg_per_day * 0.3 + 0.2,
                phase: f,
            });
        }

        let reach = size * 2.2;
        let (axis, _) = asm.line(
            tilt,
            format!("planet/{name}/axis"),
            vec![DVec3::new(0.0, reach, 0.0), DVec3::new(0.0, -reach, 0.0)],
            Material::line(Color::WHITE).with_opacity(0.5),
            Transform::IDENTITY,
        )?;
        let (pole, _) = asm.mesh(
            tilt,
            format!("planet/{name}/pole"),
            Geometry::cone(size * 0.1, size * 0.3, 8),
            Material::basic(Color::POLE),
            Transform::at(DVec3::new(0.0, reach, 0.0)),
        )?;

        let (equator, ring) = if planet.has_rings() {
            let material = Material::standard(Color::RING, 1.0)
                .with_side(Side::Double)
                .with_opacity(0.8);
            let (ring, _) = asm.mesh(
                tilt,
                format!("planet/{name}/ring"),
                Geometry::ring(size * 1.4, size * 2.5, 64),
                material,
                flat(DVec3::ZERO),
            )?;
            (None, Some(ring))
        } else {
            let (equator, _) = asm.line(
                tilt,
                format!("planet/{name}/equator"),
                ellipse_points(size * 1.2, size * 1.2, 64),
                Material::line(Color::WHITE).with_opacity(0.2),
                flat(DVec3::ZERO),
            )?;
            (Some(equator), None)
        };

        let ring_opacity = if planet == Planet::Earth { 0.8 } else { 0.5 };
        let (orbit_ring, _) = asm.line(
            cursor,
            format!("orbit/{name}"),
            ellipse_points(ORBIT_RING_RADIUS, ORBIT_RING_RADIUS, 128),
            Material::line(color).with_opacity(ring_opacity),
            flat(DVec3::ZERO),
        )?;

        let (moon, moon_orbit) = if planet.has_moon() {
            let material = Material::standard(Color::MOON, 0.9).with_emissive(Color::from_hex(0x22_2222), 0.1);
            let (moon, _) = asm.mesh(
                group,
                format!("planet/{name}/moon"),
                Geometry::sphere(size * 0.27, FIELD_SEGMENTS),
                material,
                Transform::IDENTITY,
            )?;
            let (orbit, _) = asm.line(
                group,
                format!("planet/{name}/moon_orbit"),
                ellipse_points(MOON_ORBIT_RADIUS, MOON_ORBIT_RADIUS, 64),
                Material::line(Color::MOON_ORBIT).with_opacity(0.5),
                flat(DVec3::ZERO),
            )?;
            (Some(moon), Some(orbit))
        } else {
            (None, None)
        };

        Ok(PlanetNodes {
            planet,
            group,
            tilt,
            body,
            axis,
            pole,
            equator,
            ring,
            fields,
            orbit_ring,
            trail,
            trail_material,
            moon,
            moon_orbit,
        })
    }

    fn markers(&self, asm: &mut Assembly, marker_group: NodeId) -> OrreryResult<Vec<MarkerNodes>> {
        let mut markers = Vec::with_capacity(NOTABLE_EPOCHS.len());
        for epoch in &NOTABLE_EPOCHS {
            let z = self.projection.axis_z(epoch.year);
            let sun = self.projection.sun_offset(epoch.year.into());
            let label_at = DVec3::new(sun.x + MARKER_OFFSET.x, sun.y + MARKER_OFFSET.y, z);

            let (geometry, material) = asm.parts(
                Geometry::text(format!("{}", epoch.year.round() as i64), 4.0, 0.2),
                Material::basic(Color::WHITE),
            )?;
            let label = asm.node(
                marker_group,
                format!("marker/{}", epoch.year.round() as i64),
                NodeKind::Text { geometry, material },
                Transform::at(label_at),
            )?;
            asm.graph.node_mut(label)?.billboard = true;

            let (leader, _) = asm.line(
                marker_group,
                format!("marker/{}/leader", epoch.year.round() as i64),
                vec![
                    DVec3::new(sun.x, sun.y, z),
                    DVec3::new(label_at.x - 2.0, label_at.y, z),
                ],
                Material::line(Color::WHITE).with_opacity(0.5),
                Transform::IDENTITY,
            )?;
            markers.push(MarkerNodes { epoch, label, leader });
        }
        Ok(markers)
    }
}

struct SunNodes {
    node: NodeId,
    material: MaterialId,
    glow: NodeId,
    glow_material: MaterialId,
    corona: NodeId,
    corona_material: MaterialId,
    magnetic: NodeId,
    magnetic_material: MaterialId,
}

/// Texture of a planet surface, for hosts that upload rasters themselves.
///
/// # Errors
///
/// Fails if the planet's node or material does not carry a texture.
pub fn surface_texture<'s>(scene: &'s Scene, planet: Planet) -> OrreryResult<&'s Texture> {
    let nodes = scene.handles.planet(planet).ok_or(crate::error::OrreryError::UnknownHandle {
        kind: "planet",
        index: planet.index(),
    })?;
    let material = scene
        .graph
        .node(nodes.body)?
        .kind
        .material()
        .ok_or_else(|| crate::error::OrreryError::texture(format!("{planet} body has no material")))?;
    let map = scene
        .resources
        .material(material)?
        .map
        .ok_or_else(|| crate::error::OrreryError::texture(format!("{planet} surface has no map")))?;
    scene.resources.texture(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::solver::barycentric_offset_scaled;
    use crate::texture::TextureKind;

    fn small_config() -> OrreryConfig {
        OrreryConfig::builder()
            .seed(7)
            .trail_steps(500)
            .spine_samples(200)
            .star_count(100)
            .texture_divisor(16)
            .build()
    }

    fn build(config: &OrreryConfig) -> Scene {
        SceneBuilder::new(config).build().unwrap_or_else(|e| unreachable!("{e}"))
    }

    #[test]
    fn test_trail_shape() {
        let trails = precompute_trails(&Projection::default(), 100);
        assert_eq!(trails.len(), 8);
        assert!(trails.iter().all(|t| t.len() == 101));
        // First sample sits at the start of the time axis, last at the end.
        assert!(trails[0][0].z.abs() < 1e-9);
        assert!((trails[0][100].z - (MAX_YEAR - MIN_YEAR)).abs() < 1e-9);
    }

    #[test]
    fn test_trail_matches_solver() {
        let projection = Projection::default();
        let trails = precompute_trails(&projection, 50);
        let year = MIN_YEAR + 10.0 * (MAX_YEAR - MIN_YEAR) / 50.0;
        let sun = barycentric_offset_scaled(year, projection.exaggeration);
        let mars = sun + projection.offset(heliocentric_position(Planet::Mars, year));
        let p = trails[Planet::Mars.index()][10];
        assert!((p.x - mars.x).abs() < 1e-9 && (p.y - mars.y).abs() < 1e-9);
    }

    #[test]
    fn test_spine_samples_follow_offset() {
        let projection = Projection::default();
        let spine = spine_samples(&projection, 20);
        assert_eq!(spine.len(), 21);
        let sun = barycentric_offset_scaled(MIN_YEAR, projection.exaggeration);
        assert!((spine[0].x - sun.x).abs() < 1e-9);
    }

    #[test]
    fn test_scene_structure() {
        let config = small_config();
        let scene = build(&config);
        let h = &scene.handles;

        assert_eq!(h.planets.len(), 8);
        assert_eq!(h.markers.len(), 6);
        assert_eq!(h.plasma_shells.len(), 4);
        assert!(h.planets.iter().all(|p| p.fields.len() == 2));

        let saturn = h.planet(Planet::Saturn);
        assert!(saturn.is_some_and(|s| s.ring.is_some() && s.equator.is_none()));
        let earth = h.planet(Planet::Earth);
        assert!(earth.is_some_and(|e| e.moon.is_some() && e.moon_orbit.is_some()));
        let mars = h.planet(Planet::Mars);
        assert!(mars.is_some_and(|m| m.moon.is_none() && m.equator.is_some()));

        // Sun children in glow, corona, magnetic order.
        let children = scene.graph.node(h.sun).map(|n| n.children.clone()).unwrap_or_default();
        assert_eq!(children, vec![h.glow, h.corona, h.magnetic]);
    }

    #[test]
    fn test_resources_registered() {
        let scene = build(&small_config());
        let live = scene.resources.live();
        assert_eq!(live.textures, 11);
        assert!(live.geometries > 50);
        assert!(live.materials > 50);

        let sun = scene.resources.material(scene.handles.sun_material);
        assert_eq!(sun.ok().and_then(|m| m.program()), Some(ShaderProgram::SunSurface));
    }

    #[test]
    fn test_trail_sizes_and_visibility() {
        let mut config = small_config();
        config.scene.hidden_trails = vec![Planet::Neptune];
        let scene = build(&config);

        for nodes in &scene.handles.planets {
            let trail = scene.graph.node(nodes.trail).unwrap_or_else(|e| unreachable!("{e}"));
            let geometry = trail.kind.geometry().and_then(|g| scene.resources.geometry(g).ok());
            assert_eq!(geometry.and_then(Geometry::points).map(<[DVec3]>::len), Some(501));
            assert_eq!(trail.visible, nodes.planet != Planet::Neptune);
        }
    }

    #[test]
    fn test_spine_resampled() {
        let config = small_config();
        let scene = build(&config);
        let spine = scene.graph.node(scene.handles.spine).unwrap_or_else(|e| unreachable!("{e}"));
        let len = spine
            .kind
            .geometry()
            .and_then(|g| scene.resources.geometry(g).ok())
            .and_then(Geometry::points)
            .map(<[DVec3]>::len);
        assert_eq!(len, Some(config.scene.spine_points + 1));
    }

    #[test]
    fn test_time_axis_stretch_and_markers() {
        let config = small_config();
        let scene = build(&config);
        let h = &scene.handles;
        let axis = scene.graph.node(h.time_axis).map(|n| n.transform.scale.z).ok();
        assert_eq!(axis, Some(config.projection.z_scale));

        let marker = h.markers[2];
        assert!((marker.epoch.year - 1859.0).abs() < f64::EPSILON);
        assert!(scene.graph.node(marker.label).is_ok_and(|n| n.billboard));
        // Labels live under the stretched axis.
        let world = scene.graph.world_position(marker.label).unwrap_or_default();
        assert!((world.z - (1859.0 - MIN_YEAR) * config.projection.z_scale).abs() < 1e-9);
    }

    #[test]
    fn test_starfield_radius() {
        let scene = build(&small_config());
        let stars = scene.graph.node(scene.handles.stars).unwrap_or_else(|e| unreachable!("{e}"));
        let points = stars
            .kind
            .geometry()
            .and_then(|g| scene.resources.geometry(g).ok())
            .and_then(Geometry::points)
            .map(<[DVec3]>::to_vec)
            .unwrap_or_default();
        assert_eq!(points.len(), 100);
        assert!(points.iter().all(|p| p.length() >= 4_000.0 - 1e-6 && p.length() <= 7_000.0 + 1e-6));
    }

    #[test]
    fn test_surface_texture_lookup() {
        let scene = build(&small_config());
        let tex = surface_texture(&scene, Planet::Jupiter);
        assert_eq!(tex.map(|t| t.kind).ok(), Some(TextureKind::Planet(Planet::Jupiter)));
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = small_config();
        let a = build(&config);
        let b = build(&config);
        assert_eq!(a.handles, b.handles);
        let pa = a.graph.node(a.handles.plasma_shells[0].node).map(|n| n.transform).ok();
        let pb = b.graph.node(b.handles.plasma_shells[0].node).map(|n| n.transform).ok();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_dispose_releases_all() {
        let mut scene = build(&small_config());
        let released = scene.dispose();
        assert!(released.total() > 100);
        assert_eq!(scene.resources.live().total(), 0);
        assert_eq!(scene.graph.len(), 1);
    }
}
