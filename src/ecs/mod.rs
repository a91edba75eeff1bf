/// Rigid body registry
///
/// This module provides:
/// - A hecs world holding one entity per registered body (transform + visual)
/// - The rapier physics world those entities are mirrored into
/// - Tag-based enumeration and bulk clearing
///
/// All mutation and iteration happen on the frame thread. Enumeration hands
/// out snapshots so callers may mutate the registry while walking them.

pub mod components;
pub mod physics;
pub mod rendering;

use std::collections::HashMap;

use glam::{Vec3, Vec4};
use hecs::World;
use rapier3d::prelude::RigidBodyHandle;

use crate::config::PhysicsConfigData;
use crate::core::Ray;
use crate::error::{Result, SandboxError};
use components::{BodyHandle, BodyTag, Constraint, PhysicsBody, Transform, Visual};
use physics::{BodyDesc, PhysicsWorld};

/// One ray/body intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub body: BodyHandle,
    pub point: Vec3,
    /// Ray parameter of the hit
    pub distance: f32,
}

/// Owns every body in the scene and its physics counterpart
pub struct BodyRegistry {
    /// hecs World - one entity per body
    pub world: World,

    pub physics: PhysicsWorld,

    /// Rapier body back to its entity, for ray hits
    by_rigid_body: HashMap<RigidBodyHandle, BodyHandle>,
    constraints: Vec<Constraint>,
    next_seq: u64,
}

impl BodyRegistry {
    pub fn new(config: &PhysicsConfigData) -> Self {
        Self {
            world: World::new(),
            physics: PhysicsWorld::new(config),
            by_rigid_body: HashMap::new(),
            constraints: Vec::new(),
            next_seq: 0,
        }
    }

    /// Create the physics body and its visual, tagged for bulk operations
    pub fn register(&mut self, desc: &BodyDesc, tag: BodyTag, color: Vec4) -> BodyHandle {
        self.register_with_visual(desc, tag, Visual::for_shape(&desc.shape, color))
    }

    /// As `register`, with a visual that need not match the collider
    pub fn register_with_visual(&mut self, desc: &BodyDesc, tag: BodyTag, visual: Visual) -> BodyHandle {
        let rb_handle = self.physics.insert_body(desc);
        let seq = self.next_seq;
        self.next_seq += 1;

        let entity = self.world.spawn((
            PhysicsBody {
                handle: rb_handle,
                tag,
                mass: if desc.is_dynamic() { desc.mass } else { 0.0 },
                seq,
            },
            Transform::at(desc.position),
            visual,
        ));
        self.by_rigid_body.insert(rb_handle, BodyHandle(entity));

        tracing::trace!(?tag, seq, position = ?desc.position, "registered body");
        BodyHandle(entity)
    }

    /// Snapshot of bodies with `tag`, in registration order
    pub fn all_with_tag(&self, tag: BodyTag) -> std::vec::IntoIter<BodyHandle> {
        self.collect_ordered(|body| body.tag == tag)
    }

    /// Snapshot of every dynamic body, in registration order
    pub fn dynamic_bodies(&self) -> std::vec::IntoIter<BodyHandle> {
        self.collect_ordered(PhysicsBody::is_dynamic)
    }

    fn collect_ordered(&self, filter: impl Fn(&PhysicsBody) -> bool) -> std::vec::IntoIter<BodyHandle> {
        let mut found: Vec<(u64, BodyHandle)> = self
            .world
            .query::<&PhysicsBody>()
            .iter()
            .filter(|(_, body)| filter(*body))
            .map(|(entity, body)| (body.seq, BodyHandle(entity)))
            .collect();
        found.sort_by_key(|(seq, _)| *seq);
        found
            .into_iter()
            .map(|(_, handle)| handle)
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Remove every body whose tag is in `tags`, returns how many went
    pub fn clear(&mut self, tags: &[BodyTag]) -> usize {
        let doomed: Vec<(hecs::Entity, PhysicsBody)> = self
            .world
            .query::<&PhysicsBody>()
            .iter()
            .filter(|(_, body)| tags.contains(&body.tag))
            .map(|(entity, body)| (entity, *body))
            .collect();

        for (entity, body) in &doomed {
            self.physics.remove_body(body.handle);
            self.by_rigid_body.remove(&body.handle);
            let _ = self.world.despawn(*entity);
            self.constraints
                .retain(|constraint| !constraint.involves(BodyHandle(*entity)));
        }

        if !doomed.is_empty() {
            tracing::debug!(removed = doomed.len(), ?tags, "cleared bodies");
        }
        doomed.len()
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.world.contains(handle.0)
    }

    pub fn body(&self, handle: BodyHandle) -> Result<PhysicsBody> {
        self.world
            .get::<&PhysicsBody>(handle.0)
            .map(|body| *body)
            .map_err(|_| SandboxError::StaleHandle(handle.0))
    }

    pub fn tag(&self, handle: BodyHandle) -> Result<BodyTag> {
        self.body(handle).map(|body| body.tag)
    }

    pub fn mass(&self, handle: BodyHandle) -> Result<f32> {
        self.body(handle).map(|body| body.mass)
    }

    pub fn visual(&self, handle: BodyHandle) -> Result<Visual> {
        self.world
            .get::<&Visual>(handle.0)
            .map(|visual| *visual)
            .map_err(|_| SandboxError::StaleHandle(handle.0))
    }

    pub fn transform(&self, handle: BodyHandle) -> Result<Transform> {
        self.world
            .get::<&Transform>(handle.0)
            .map(|transform| *transform)
            .map_err(|_| SandboxError::StaleHandle(handle.0))
    }

    /// Current centre of mass position as the physics engine sees it
    pub fn position(&self, handle: BodyHandle) -> Result<Vec3> {
        let body = self.body(handle)?;
        self.physics
            .translation(body.handle)
            .ok_or(SandboxError::StaleHandle(handle.0))
    }

    pub fn linear_velocity(&self, handle: BodyHandle) -> Result<Vec3> {
        let body = self.body(handle)?;
        self.physics
            .linear_velocity(body.handle)
            .ok_or(SandboxError::StaleHandle(handle.0))
    }

    pub fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3) -> Result<()> {
        let body = self.body(handle)?;
        if self.physics.apply_impulse(body.handle, impulse) {
            Ok(())
        } else {
            Err(SandboxError::StaleHandle(handle.0))
        }
    }

    /// Join `anchor` and `ball` with a spherical joint
    pub fn add_spherical_joint(
        &mut self,
        anchor: BodyHandle,
        ball: BodyHandle,
        anchor_pivot: Vec3,
        ball_pivot: Vec3,
    ) -> Result<Constraint> {
        let anchor_body = self.body(anchor)?;
        let ball_body = self.body(ball)?;

        let joint = self.physics.add_spherical_joint(
            anchor_body.handle,
            ball_body.handle,
            anchor_pivot,
            ball_pivot,
        );
        let constraint = Constraint { anchor, ball, joint };
        self.constraints.push(constraint);
        Ok(constraint)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Every body the ray hits, nearest first; equal distances keep registration order
    pub fn raycast(&self, ray: &Ray, max_distance: f32) -> Vec<RayHit> {
        let mut hits: Vec<(u64, RayHit)> = self
            .physics
            .cast_ray(ray.origin, ray.direction, max_distance)
            .into_iter()
            .filter_map(|(rb_handle, distance)| {
                let handle = *self.by_rigid_body.get(&rb_handle)?;
                let seq = self.body(handle).ok()?.seq;
                Some((
                    seq,
                    RayHit {
                        body: handle,
                        point: ray.at(distance),
                        distance,
                    },
                ))
            })
            .collect();

        hits.sort_by(|(seq_a, a), (seq_b, b)| {
            a.distance.total_cmp(&b.distance).then(seq_a.cmp(seq_b))
        });
        hits.into_iter().map(|(_, hit)| hit).collect()
    }

    /// Advance physics and mirror the new poses into the scene
    pub fn step(&mut self, delta_time: f32) -> u32 {
        let steps = self.physics.advance(delta_time);
        if steps > 0 {
            self.sync_transforms();
        }
        steps
    }

    /// Copy physics poses onto `Transform` components
    pub fn sync_transforms(&mut self) {
        for (_entity, (body, transform)) in self.world.query_mut::<(&PhysicsBody, &mut Transform)>() {
            if let (Some(position), Some(rotation)) = (
                self.physics.translation(body.handle),
                self.physics.rotation(body.handle),
            ) {
                transform.position = position;
                transform.rotation = rotation;
            }
        }
    }

    pub fn count_with_tag(&self, tag: BodyTag) -> usize {
        self.world
            .query::<&PhysicsBody>()
            .iter()
            .filter(|(_, body)| body.tag == tag)
            .count()
    }

    pub fn len(&self) -> usize {
        self.world.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BodyRegistry {
    fn default() -> Self {
        Self::new(&PhysicsConfigData::default())
    }
}
