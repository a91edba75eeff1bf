/// Block placement
///
/// Pointer ray -> nearest surface hit -> grid snap -> new dynamic body.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::PlacementConfigData;
use crate::core::Ray;
use crate::ecs::components::{BodyHandle, BodyTag};
use crate::ecs::physics::{BodyDesc, BodyShape};
use crate::ecs::BodyRegistry;
use crate::error::{Result, SandboxError};
use crate::material::{Material, MaterialCatalog};

/// Longest pick distance
pub const MAX_PICK_DISTANCE: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockShape {
    #[default]
    Cube,
    Cone,
    Sphere,
}

impl BlockShape {
    pub fn name(self) -> &'static str {
        match self {
            BlockShape::Cube => "cube",
            BlockShape::Cone => "cone",
            BlockShape::Sphere => "sphere",
        }
    }

    /// Collision shape for a block of edge length / diameter `size`
    pub fn body_shape(self, size: f32) -> BodyShape {
        let half = size / 2.0;
        match self {
            BlockShape::Cube => BodyShape::Cuboid {
                half_extents: Vec3::splat(half),
            },
            BlockShape::Cone => BodyShape::Cone {
                half_height: half,
                radius: half,
            },
            BlockShape::Sphere => BodyShape::Ball { radius: half },
        }
    }
}

impl fmt::Display for BlockShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlockShape {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cube" | "box" => Ok(BlockShape::Cube),
            "cone" => Ok(BlockShape::Cone),
            "sphere" => Ok(BlockShape::Sphere),
            other => Err(format!("unknown shape: {other}")),
        }
    }
}

/// What the next placed block will look like
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockTemplate {
    pub shape: BlockShape,
    pub size: f32,
    pub material: Material,
}

/// A placed block, immutable once created
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockSpec {
    pub shape: BlockShape,
    pub size: f32,
    pub material: Material,
    pub position: Vec3,
}

/// Result of a successful placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedBlock {
    pub spec: BlockSpec,
    pub body: BodyHandle,
}

fn snap_axis(value: f32, pitch: f32) -> f32 {
    (value / pitch).round() * pitch
}

/// Snap a surface point to the block grid of pitch `size`
///
/// X and Y go to the nearest multiple of `size`. Z goes to the lattice
/// `k * size + size / 2` of the cell the point lies in, so a block sits on
/// top of the surface it was clicked on. Snapped points are fixed points.
pub fn snap_to_grid(point: Vec3, size: f32) -> Vec3 {
    let half = size / 2.0;
    // Nudge so a point sitting on a cell boundary lands in the cell above it
    let layer = (point.z / size + 1e-4).floor();
    Vec3::new(
        snap_axis(point.x, size),
        snap_axis(point.y, size),
        layer * size + half,
    )
}

/// Nearest surface point under the pointer, pulled back toward the viewer
pub fn surface_point(registry: &BodyRegistry, ray: &Ray, surface_offset: f32) -> Result<Vec3> {
    let hit = registry
        .raycast(ray, MAX_PICK_DISTANCE)
        .into_iter()
        .next()
        .ok_or(SandboxError::NoSurfaceHit)?;

    Ok(ray.at((hit.distance - surface_offset).max(0.0)))
}

/// Place a block where the pointer ray meets existing geometry
pub fn place_block(
    registry: &mut BodyRegistry,
    catalog: &MaterialCatalog,
    config: &PlacementConfigData,
    ray: &Ray,
    template: &BlockTemplate,
) -> Result<PlacedBlock> {
    let size = template.size.clamp(config.min_size, config.max_size);
    let surface = surface_point(registry, ray, config.surface_offset)?;
    let position = snap_to_grid(surface, size);

    let physics = catalog.properties(template.material, size)?;

    // Blocks never sleep
    let mut desc = BodyDesc::new(template.shape.body_shape(size), position, physics.mass)
        .with_surface(physics.friction, physics.restitution);
    desc.ccd = config.ccd_enabled;
    desc.soft_ccd_prediction = config.soft_ccd_prediction;
    desc.can_sleep = false;

    let body = registry.register(&desc, BodyTag::Box, physics.color);
    let spec = BlockSpec {
        shape: template.shape,
        size,
        material: template.material,
        position,
    };

    tracing::info!(
        shape = %spec.shape,
        material = %spec.material,
        size = spec.size,
        position = ?spec.position,
        mass = physics.mass,
        "placed block"
    );

    Ok(PlacedBlock { spec, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_examples() {
        assert_eq!(snap_to_grid(Vec3::new(0.4, -0.6, 0.0), 1.0), Vec3::new(0.0, -1.0, 0.5));
        assert_eq!(snap_to_grid(Vec3::new(2.9, 1.1, 2.0), 2.0), Vec3::new(2.0, 2.0, 3.0));
        // Just below a block top still stacks on top
        assert_eq!(snap_to_grid(Vec3::new(0.0, 0.0, 0.99999), 1.0).z, 1.5);
    }

    #[test]
    fn test_snap_is_idempotent() {
        let sizes = [0.5_f32, 0.75, 1.0, 1.5, 2.25, 3.0];
        let points = [
            Vec3::new(0.3, 7.7, 0.01),
            Vec3::new(-4.2, 1.9, 3.3),
            Vec3::new(12.6, -0.1, 0.49),
            Vec3::new(-0.74, -9.99, 6.0),
        ];
        for size in sizes {
            for point in points {
                let once = snap_to_grid(point, size);
                let twice = snap_to_grid(once, size);
                assert!((once - twice).length() < 1e-4, "size {size}: {once} vs {twice}");
            }
        }
    }

    #[test]
    fn test_shape_dimensions() {
        assert_eq!(
            BlockShape::Cube.body_shape(2.0),
            BodyShape::Cuboid {
                half_extents: Vec3::ONE
            }
        );
        assert_eq!(BlockShape::Sphere.body_shape(3.0), BodyShape::Ball { radius: 1.5 });
        assert_eq!(
            BlockShape::Cone.body_shape(1.0),
            BodyShape::Cone {
                half_height: 0.5,
                radius: 0.5
            }
        );
    }

    #[test]
    fn test_shape_names() {
        assert_eq!("Sphere".parse::<BlockShape>().unwrap(), BlockShape::Sphere);
        assert!("pyramid".parse::<BlockShape>().is_err());
    }
}
