/// ECS components attached to every registered body
///
/// Each body entity carries a `PhysicsBody` (rapier handle + category),
/// a `Transform` mirrored from physics, and a `Visual` for the render layer.

use glam::{Quat, Vec3, Vec4};
use rapier3d::prelude::{ImpulseJointHandle, RigidBodyHandle};
use serde::{Deserialize, Serialize};

use super::physics::BodyShape;

/// Category used for bulk selection (clearing, force application)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyTag {
    /// User-placed block
    Box,
    WreckingBall,
    /// Fixed pivot a wrecking ball hangs from
    Anchor,
    Ground,
    HeavyBall,
}

impl BodyTag {
    /// Everything the user spawned; the ground stays
    pub const SPAWNED: [BodyTag; 4] = [
        BodyTag::Box,
        BodyTag::WreckingBall,
        BodyTag::Anchor,
        BodyTag::HeavyBall,
    ];
}

/// Opaque handle to a registered body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub hecs::Entity);

/// Link between a scene entity and its rapier body
#[derive(Debug, Clone, Copy)]
pub struct PhysicsBody {
    pub handle: RigidBodyHandle,
    pub tag: BodyTag,
    /// 0 for fixed bodies
    pub mass: f32,
    /// Registration order, breaks ties in ray casts
    pub seq: u64,
}

impl PhysicsBody {
    pub fn is_dynamic(&self) -> bool {
        self.mass > 0.0
    }
}

/// World transform, owned by physics once the simulation runs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Unit meshes the render layer knows how to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MeshKind {
    /// Unit cube centred on the origin
    Cube,
    /// Unit-height cone, unit base diameter, apex on +Z
    Cone,
    /// Unit-diameter sphere
    Sphere,
    /// Unit square in the XY plane, facing +Z
    Plane,
}

/// Visual representation component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visual {
    pub mesh: MeshKind,
    pub scale: Vec3,
    pub color: Vec4,
}

impl Visual {
    /// Visual matching a collision shape
    pub fn for_shape(shape: &BodyShape, color: Vec4) -> Self {
        let (mesh, scale) = match *shape {
            BodyShape::Cuboid { half_extents } => (MeshKind::Cube, half_extents * 2.0),
            BodyShape::Ball { radius } => (MeshKind::Sphere, Vec3::splat(radius * 2.0)),
            BodyShape::Cone { half_height, radius } => (
                MeshKind::Cone,
                Vec3::new(radius * 2.0, radius * 2.0, half_height * 2.0),
            ),
            // Unbounded; callers pick the drawn extent
            BodyShape::HalfSpace => (MeshKind::Plane, Vec3::ONE),
        };
        Self { mesh, scale, color }
    }
}

/// Spherical joint tying a ball to its anchor
#[derive(Debug, Clone, Copy)]
pub struct Constraint {
    pub anchor: BodyHandle,
    pub ball: BodyHandle,
    pub joint: ImpulseJointHandle,
}

impl Constraint {
    pub fn involves(&self, handle: BodyHandle) -> bool {
        self.anchor == handle || self.ball == handle
    }
}
