//! Retained scene description.
//!
//! The scene is built once from configuration and then only mutated in
//! place by the frame loop:
//! - [`graph`]: node hierarchy with local transforms and world resolution
//! - [`resources`]: typed handles for geometry, materials and textures,
//!   released together on dispose
//! - [`geometry`] and [`material`]: what a node draws and how
//! - [`shaders`]: the Sun's shader programs and their CPU mirrors
//! - [`camera`]: perspective camera and orbit controls
//! - [`builder`]: assembly of the full orrery scene
//!
//! No GPU API appears here. Renderers walk the graph and decide what to do
//! with each node.

pub mod builder;
pub mod camera;
pub mod geometry;
pub mod graph;
pub mod material;
pub mod resources;
pub mod shaders;

pub use builder::{
    precompute_trails, spine_samples, FieldShell, MarkerNodes, PlanetNodes, PlasmaShell, Scene,
    SceneBuilder, SceneHandles,
};
pub use camera::{OrbitControls, PerspectiveCamera};
pub use geometry::{catmull_rom_centripetal, ellipse_points, Geometry};
pub use graph::{Fog, Node, NodeId, NodeKind, SceneGraph, Transform};
pub use material::{Blending, Material, MaterialKind, Side, Uniform};
pub use resources::{GeometryId, MaterialId, ResourceCounts, ResourceLedger, TextureId};
pub use shaders::ShaderProgram;
