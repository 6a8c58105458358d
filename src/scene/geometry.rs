//! Geometry descriptions and curve sampling.
//!
//! Parametric shapes (spheres, rings, cones) are kept as parameters and
//! tessellated by whoever draws them. Polylines and point clouds carry their
//! vertices, since they are the product of the orbit precomputation.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// A shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Sphere {
        radius: f64,
        width_segments: u32,
        height_segments: u32,
    },
    /// Flat annulus in the local XY plane.
    Ring {
        inner: f64,
        outer: f64,
        segments: u32,
    },
    /// Cone along local `+y`, base centred on the origin.
    Cone {
        radius: f64,
        height: f64,
        segments: u32,
    },
    Polyline { points: Vec<DVec3> },
    PointCloud { points: Vec<DVec3> },
    /// Centred extruded text.
    Text { text: String, size: f64, depth: f64 },
}

impl Geometry {
    #[must_use]
    pub const fn sphere(radius: f64, segments: u32) -> Self {
        Self::Sphere {
            radius,
            width_segments: segments,
            height_segments: segments,
        }
    }

    #[must_use]
    pub const fn ring(inner: f64, outer: f64, segments: u32) -> Self {
        Self::Ring { inner, outer, segments }
    }

    #[must_use]
    pub const fn cone(radius: f64, height: f64, segments: u32) -> Self {
        Self::Cone {
            radius,
            height,
            segments,
        }
    }

    #[must_use]
    pub fn text(text: impl Into<String>, size: f64, depth: f64) -> Self {
        Self::Text {
            text: text.into(),
            size,
            depth,
        }
    }

    /// Vertices the tessellated shape would upload.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        match self {
            Self::Sphere {
                width_segments,
                height_segments,
                ..
            } => (*width_segments as usize + 1) * (*height_segments as usize + 1),
            Self::Ring { segments, .. } => (*segments as usize + 1) * 2,
            // Side strip plus the base cap fan.
            Self::Cone { segments, .. } => 4 * *segments as usize + 3,
            Self::Polyline { points } | Self::PointCloud { points } => points.len(),
            Self::Text { text, .. } => text.chars().filter(|c| !c.is_whitespace()).count() * 8,
        }
    }

    /// Radius of a sphere about the local origin containing the shape.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        match self {
            Self::Sphere { radius, .. } => *radius,
            Self::Ring { outer, .. } => *outer,
            Self::Cone { radius, height, .. } => radius.hypot(*height),
            Self::Polyline { points } | Self::PointCloud { points } => {
                points.iter().map(|p| p.length()).fold(0.0, f64::max)
            }
            Self::Text { text, size, .. } => (text.chars().count() as f64 * size * 0.6) / 2.0,
        }
    }

    /// Stored vertices of line and point geometry.
    #[must_use]
    pub fn points(&self) -> Option<&[DVec3]> {
        match self {
            Self::Polyline { points } | Self::PointCloud { points } => Some(points),
            _ => None,
        }
    }
}

/// Evenly spaced points on an axis-aligned ellipse in the XY plane.
///
/// Returns `divisions + 1` points; the last coincides with the first.
#[must_use]
pub fn ellipse_points(rx: f64, ry: f64, divisions: usize) -> Vec<DVec3> {
    let n = divisions.max(1);
    (0..=n)
        .map(|i| {
            let angle = TAU * i as f64 / n as f64;
            DVec3::new(angle.cos() * rx, angle.sin() * ry, 0.0)
        })
        .collect()
}

/// Resample a polyline with a centripetal Catmull–Rom spline.
///
/// Produces `divisions + 1` points evenly spaced in the curve parameter,
/// passing through the first and last control points. End segments use
/// reflected phantom points.
#[must_use]
pub fn catmull_rom_centripetal(points: &[DVec3], divisions: usize) -> Vec<DVec3> {
    match points.len() {
        0 => return Vec::new(),
        1 => return vec![points[0]; divisions + 1],
        _ => {}
    }
    let n = divisions.max(1);
    (0..=n)
        .map(|d| catmull_rom_point(points, d as f64 / n as f64))
        .collect()
}

fn catmull_rom_point(points: &[DVec3], t: f64) -> DVec3 {
    let len = points.len();
    let p = (len - 1) as f64 * t;
    let mut segment = p.floor() as usize;
    let mut weight = p - segment as f64;
    if segment >= len - 1 {
        segment = len - 2;
        weight = 1.0;
    }

    let p1 = points[segment];
    let p2 = points[segment + 1];
    let p0 = if segment > 0 {
        points[segment - 1]
    } else {
        p1 * 2.0 - p2
    };
    let p3 = if segment + 2 < len {
        points[segment + 2]
    } else {
        p2 * 2.0 - p1
    };

    let mut dt0 = p0.distance_squared(p1).powf(0.25);
    let mut dt1 = p1.distance_squared(p2).powf(0.25);
    let mut dt2 = p2.distance_squared(p3).powf(0.25);
    // Coincident points would divide by zero.
    if dt1 < 1e-4 {
        dt1 = 1.0;
    }
    if dt0 < 1e-4 {
        dt0 = dt1;
    }
    if dt2 < 1e-4 {
        dt2 = dt1;
    }

    let axis = |a: f64, b: f64, c: f64, d: f64| {
        let t1 = ((b - a) / dt0 - (c - a) / (dt0 + dt1) + (c - b) / dt1) * dt1;
        let t2 = ((c - b) / dt1 - (d - b) / (dt1 + dt2) + (d - c) / dt2) * dt1;
        hermite(b, c, t1, t2, weight)
    };

    DVec3::new(
        axis(p0.x, p1.x, p2.x, p3.x),
        axis(p0.y, p1.y, p2.y, p3.y),
        axis(p0.z, p1.z, p2.z, p3.z),
    )
}

/// Cubic Hermite between `x0` and `x1` with tangents `t0`, `t1`.
fn hermite(x0: f64, x1: f64, t0: f64, t1: f64, s: f64) -> f64 {
    let c2 = -3.0 * x0 + 3.0 * x1 - 2.0 * t0 - t1;
    let c3 = 2.0 * x0 - 2.0 * x1 + t0 + t1;
    x0 + t0 * s + c2 * s * s + c3 * s * s * s
}
