//! GPU-side resource bookkeeping.
//!
//! Geometries, materials and textures are owned by a [`ResourceLedger`] and
//! referenced from scene nodes by typed handles. The ledger is filled once
//! while the scene is built and released in one sweep on unmount; nothing
//! is allocated on the frame path.

use serde::{Deserialize, Serialize};

use crate::error::{OrreryError, OrreryResult};
use crate::texture::Texture;

use super::geometry::Geometry;
use super::material::Material;

macro_rules! handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(usize);

        impl $name {
            /// Position in the ledger.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0
            }

            /// Handle for a raw index. Only meaningful against the ledger
            /// that issued it.
            #[must_use]
            pub const fn from_index(index: usize) -> Self {
                Self(index)
            }
        }
    };
}

handle!(
    /// Handle of a [`Geometry`].
    GeometryId
);
handle!(
    /// Handle of a [`Material`].
    MaterialId
);
handle!(
    /// Handle of a [`Texture`].
    TextureId
);

/// Live resource counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCounts {
    pub geometries: usize,
    pub materials: usize,
    pub textures: usize,
}

impl ResourceCounts {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.geometries + self.materials + self.textures
    }
}

/// Owner of every geometry, material and texture in a scene.
#[derive(Debug, Default)]
pub struct ResourceLedger {
    geometries: Vec<Option<Geometry>>,
    materials: Vec<Option<Material>>,
    textures: Vec<Option<Texture>>,
    disposed: bool,
}

impl ResourceLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns [`OrreryError::Disposed`] after [`Self::dispose`].
    pub fn add_geometry(&mut self, geometry: Geometry) -> OrreryResult<GeometryId> {
        self.ensure_live("add geometry")?;
        self.geometries.push(Some(geometry));
        Ok(GeometryId(self.geometries.len() - 1))
    }

    /// # Errors
    ///
    /// Returns [`OrreryError::Disposed`] after [`Self::dispose`].
    pub fn add_material(&mut self, material: Material) -> OrreryResult<MaterialId> {
        self.ensure_live("add material")?;
        self.materials.push(Some(material));
        Ok(MaterialId(self.materials.len() - 1))
    }

    /// # Errors
    ///
    /// Returns [`OrreryError::Disposed`] after [`Self::dispose`].
    pub fn add_texture(&mut self, texture: Texture) -> OrreryResult<TextureId> {
        self.ensure_live("add texture")?;
        self.textures.push(Some(texture));
        Ok(TextureId(self.textures.len() - 1))
    }

    /// # Errors
    ///
    /// Fails for unknown or released handles.
    pub fn geometry(&self, id: GeometryId) -> OrreryResult<&Geometry> {
        lookup(&self.geometries, id.0, "geometry")
    }

    /// # Errors
    ///
    /// Fails for unknown or released handles.
    pub fn material(&self, id: MaterialId) -> OrreryResult<&Material> {
        lookup(&self.materials, id.0, "material")
    }

    /// # Errors
    ///
    /// Fails for unknown or released handles.
    pub fn material_mut(&mut self, id: MaterialId) -> OrreryResult<&mut Material> {
        self.materials
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(OrreryError::UnknownHandle {
                kind: "material",
                index: id.0,
            })
    }

    /// # Errors
    ///
    /// Fails for unknown or released handles.
    pub fn texture(&self, id: TextureId) -> OrreryResult<&Texture> {
        lookup(&self.textures, id.0, "texture")
    }

    /// Resources still held.
    #[must_use]
    pub fn live(&self) -> ResourceCounts {
        ResourceCounts {
            geometries: self.geometries.iter().flatten().count(),
            materials: self.materials.iter().flatten().count(),
            textures: self.textures.iter().flatten().count(),
        }
    }

    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Release everything. Returns what was released; a second call
    /// releases nothing.
    pub fn dispose(&mut self) -> ResourceCounts {
        let released = self.live();
        for slot in &mut self.geometries {
            *slot = None;
        }
        for slot in &mut self.materials {
            *slot = None;
        }
        for slot in &mut self.textures {
            *slot = None;
        }
        if !self.disposed {
            tracing::debug!(
                geometries = released.geometries,
                materials = released.materials,
                textures = released.textures,
                "scene resources released"
            );
        }
        self.disposed = true;
        released
    }

    fn ensure_live(&self, what: &str) -> OrreryResult<()> {
        if self.disposed {
            return Err(OrreryError::Disposed(what.to_string()));
        }
        Ok(())
    }
}

fn lookup<'a, T>(slots: &'a [Option<T>], index: usize, kind: &'static str) -> OrreryResult<&'a T> {
    slots
        .get(index)
        .and_then(Option::as_ref)
        .ok_or(OrreryError::UnknownHandle { kind, index })
}
