/// Render extraction for registered bodies
///
/// The renderer itself lives outside this crate; it receives a `RenderBatch`
/// each frame through the `SceneRenderer` trait.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use super::components::*;
use crate::core::Camera;

/// GPU instance layout: model matrix followed by RGBA color
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

/// A single body to draw
#[derive(Debug, Clone)]
pub struct RenderInstance {
    pub model_matrix: Mat4,
    pub mesh: MeshKind,
    pub color: Vec4,
    pub tag: BodyTag,
    pub distance_from_camera: f32,
}

impl RenderInstance {
    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.model_matrix.to_cols_array_2d(),
            color: self.color.to_array(),
        }
    }
}

/// Everything the render layer needs for one frame
#[derive(Debug, Default)]
pub struct RenderBatch {
    pub instances: Vec<RenderInstance>,
}

impl RenderBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group by mesh, front to back within a mesh
    pub fn sort(&mut self) {
        self.instances.sort_by(|a, b| {
            a.mesh
                .cmp(&b.mesh)
                .then(a.distance_from_camera.total_cmp(&b.distance_from_camera))
        });
    }

    /// Instance data for one mesh, ready for upload
    pub fn raw_instances(&self, mesh: MeshKind) -> Vec<InstanceRaw> {
        self.instances
            .iter()
            .filter(|instance| instance.mesh == mesh)
            .map(RenderInstance::to_raw)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Extract renderable bodies from the ECS world
pub fn extract_render_batch(world: &hecs::World, camera_position: Vec3) -> RenderBatch {
    let mut batch = RenderBatch::new();

    for (_entity, (body, transform, visual)) in world
        .query::<(&PhysicsBody, &Transform, &Visual)>()
        .iter()
    {
        batch.instances.push(RenderInstance {
            model_matrix: Mat4::from_scale_rotation_translation(
                visual.scale,
                transform.rotation,
                transform.position,
            ),
            mesh: visual.mesh,
            color: visual.color,
            tag: body.tag,
            distance_from_camera: transform.position.distance(camera_position),
        });
    }

    batch.sort();
    batch
}

/// Render collaborator
pub trait SceneRenderer {
    fn draw(&mut self, batch: &RenderBatch, camera: &Camera) -> anyhow::Result<()>;
}

/// Renderer that only reports what it would draw
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    pub frames: u64,
    pub last_instance_count: usize,
}

impl SceneRenderer for HeadlessRenderer {
    fn draw(&mut self, batch: &RenderBatch, camera: &Camera) -> anyhow::Result<()> {
        self.frames += 1;
        if batch.len() != self.last_instance_count {
            let bytes: usize = [MeshKind::Cube, MeshKind::Cone, MeshKind::Sphere, MeshKind::Plane]
                .into_iter()
                .map(|mesh| bytemuck::cast_slice::<InstanceRaw, u8>(&batch.raw_instances(mesh)).len())
                .sum();
            tracing::debug!(
                instances = batch.len(),
                bytes,
                camera = ?camera.position(),
                "scene changed"
            );
        }
        self.last_instance_count = batch.len();
        Ok(())
    }
}
