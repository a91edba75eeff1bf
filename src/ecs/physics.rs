/// Physics integration with Rapier
///
/// Provides:
/// - Fixed-timestep stepping driven by variable frame time
/// - Body creation from shape/material descriptors
/// - Impulses, spherical joints and ray casts through the query pipeline
///
/// Public API speaks glam; conversion to nalgebra happens here.

use glam::{Quat, Vec3};
use nalgebra as na;
use rapier3d::prelude::*;

use crate::config::PhysicsConfigData;

/// Collision geometry for a body. Cones stand along +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Cuboid { half_extents: Vec3 },
    Ball { radius: f32 },
    Cone { half_height: f32, radius: f32 },
    /// Infinite solid below the body's XY plane, normal +Z
    HalfSpace,
}

impl BodyShape {
    fn collider_builder(&self) -> ColliderBuilder {
        match *self {
            BodyShape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            BodyShape::Ball { radius } => ColliderBuilder::ball(radius),
            // Rapier cones point along +Y, tip them onto +Z
            BodyShape::Cone { half_height, radius } => ColliderBuilder::cone(half_height, radius)
                .rotation(vector![std::f32::consts::FRAC_PI_2, 0.0, 0.0]),
            BodyShape::HalfSpace => ColliderBuilder::halfspace(Vector::z_axis()),
        }
    }
}

/// Everything needed to create one rigid body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub shape: BodyShape,
    pub position: Vec3,
    /// 0 creates a fixed body
    pub mass: f32,
    pub friction: f32,
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub ccd: bool,
    /// Soft-CCD look-ahead distance, 0 disables it
    pub soft_ccd_prediction: f32,
    pub can_sleep: bool,
}

impl BodyDesc {
    pub fn new(shape: BodyShape, position: Vec3, mass: f32) -> Self {
        Self {
            shape,
            position,
            mass,
            friction: 0.5,
            restitution: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            ccd: false,
            soft_ccd_prediction: 0.0,
            can_sleep: true,
        }
    }

    pub fn with_surface(mut self, friction: f32, restitution: f32) -> Self {
        self.friction = friction;
        self.restitution = restitution;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn is_dynamic(&self) -> bool {
        self.mass > 0.0
    }
}

/// Physics world wrapper
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub gravity: Vector<Real>,
    pub integration_params: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,

    /// Unsimulated time carried to the next frame
    accumulator: f32,
    max_substeps: u32,
}

impl PhysicsWorld {
    pub fn new(config: &PhysicsConfigData) -> Self {
        let mut integration_params = IntegrationParameters::default();
        integration_params.dt = config.timestep;

        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: vec3_to_vector(config.gravity),
            integration_params,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            accumulator: 0.0,
            max_substeps: config.max_substeps.max(1),
        }
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = vec3_to_vector(gravity);
    }

    pub fn timestep(&self) -> f32 {
        self.integration_params.dt
    }

    /// Advance by `delta_time` in fixed substeps, returns substeps taken.
    /// Time beyond the substep cap is dropped rather than carried over.
    pub fn advance(&mut self, delta_time: f32) -> u32 {
        let dt = self.integration_params.dt;
        self.accumulator += delta_time.max(0.0);

        let mut steps = 0;
        while self.accumulator >= dt && steps < self.max_substeps {
            self.step();
            self.accumulator -= dt;
            steps += 1;
        }
        if steps == self.max_substeps {
            self.accumulator = self.accumulator.min(dt);
        }
        steps
    }

    /// Single fixed step
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );

        self.query_pipeline.update(&self.collider_set);
    }

    /// Create a body and its single collider
    pub fn insert_body(&mut self, desc: &BodyDesc) -> RigidBodyHandle {
        let builder = if desc.is_dynamic() {
            RigidBodyBuilder::dynamic()
        } else {
            RigidBodyBuilder::fixed()
        };

        let rigid_body = builder
            .translation(vec3_to_vector(desc.position))
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping)
            .ccd_enabled(desc.ccd)
            .soft_ccd_prediction(desc.soft_ccd_prediction)
            .can_sleep(desc.can_sleep)
            .build();
        let rb_handle = self.rigid_body_set.insert(rigid_body);

        let mut collider = desc
            .shape
            .collider_builder()
            .friction(desc.friction)
            .restitution(desc.restitution);
        if desc.is_dynamic() {
            collider = collider.mass(desc.mass);
        }
        self.collider_set
            .insert_with_parent(collider.build(), rb_handle, &mut self.rigid_body_set);

        // Impulses applied before the first step need the mass in place
        if let Some(body) = self.rigid_body_set.get_mut(rb_handle) {
            body.recompute_mass_properties_from_colliders(&self.collider_set);
        }
        // Visible to ray casts before the first step
        self.query_pipeline.update(&self.collider_set);

        rb_handle
    }

    /// Remove a body together with its colliders and attached joints
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        let removed = self
            .rigid_body_set
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some();
        if removed {
            self.query_pipeline.update(&self.collider_set);
        }
        removed
    }

    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: Vec3) -> bool {
        match self.rigid_body_set.get_mut(handle) {
            Some(body) => {
                body.apply_impulse(vec3_to_vector(impulse), true);
                true
            }
            None => false,
        }
    }

    /// Spherical joint between two bodies, pivots given in each body's local frame
    pub fn add_spherical_joint(
        &mut self,
        body1: RigidBodyHandle,
        body2: RigidBodyHandle,
        pivot1: Vec3,
        pivot2: Vec3,
    ) -> ImpulseJointHandle {
        let joint = SphericalJointBuilder::new()
            .local_anchor1(vec3_to_point(pivot1))
            .local_anchor2(vec3_to_point(pivot2));
        self.impulse_joint_set.insert(body1, body2, joint, true)
    }

    pub fn joint_count(&self) -> usize {
        self.impulse_joint_set.len()
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    pub fn translation(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set
            .get(handle)
            .map(|body| vector_to_vec3(body.translation()))
    }

    pub fn rotation(&self, handle: RigidBodyHandle) -> Option<Quat> {
        self.rigid_body_set
            .get(handle)
            .map(|body| unit_quat_to_quat(body.rotation()))
    }

    pub fn linear_velocity(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set
            .get(handle)
            .map(|body| vector_to_vec3(body.linvel()))
    }

    /// Every body the ray hits within `max_distance`, with the distance to
    /// its nearest collider. Unordered.
    pub fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
    ) -> Vec<(RigidBodyHandle, f32)> {
        let ray = Ray::new(vec3_to_point(origin), vec3_to_vector(direction.normalize()));
        let mut hits: Vec<(RigidBodyHandle, f32)> = Vec::new();

        self.query_pipeline.intersections_with_ray(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_distance,
            true,
            QueryFilter::default(),
            |collider_handle, intersection| {
                let parent = self
                    .collider_set
                    .get(collider_handle)
                    .and_then(|collider| collider.parent());
                if let Some(body) = parent {
                    let toi = intersection.time_of_impact;
                    match hits.iter_mut().find(|(handle, _)| *handle == body) {
                        Some(hit) => hit.1 = hit.1.min(toi),
                        None => hits.push((body, toi)),
                    }
                }
                true
            },
        );

        hits
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(&PhysicsConfigData::default())
    }
}

fn vec3_to_vector(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

fn vec3_to_point(v: Vec3) -> Point<Real> {
    Point::new(v.x, v.y, v.z)
}

fn vector_to_vec3(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn unit_quat_to_quat(q: &na::UnitQuaternion<Real>) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ground(world: &mut PhysicsWorld) -> RigidBodyHandle {
        world.insert_body(&BodyDesc::new(
            BodyShape::Cuboid {
                half_extents: Vec3::new(10.0, 10.0, 0.5),
            },
            Vec3::new(0.0, 0.0, -0.5),
            0.0,
        ))
    }

    fn distance_to(world: &PhysicsWorld, body: RigidBodyHandle, origin: Vec3, direction: Vec3) -> Option<f32> {
        world
            .cast_ray(origin, direction, 1000.0)
            .into_iter()
            .find(|(handle, _)| *handle == body)
            .map(|(_, distance)| distance)
    }

    #[test]
    fn test_ray_hits_fresh_body_without_stepping() {
        let mut world = PhysicsWorld::default();
        let handle = ground(&mut world);

        let hit = distance_to(&world, handle, Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!((hit.unwrap() - 5.0).abs() < 1e-4);

        let miss = distance_to(&world, handle, Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert!(miss.is_none());
    }

    #[test]
    fn test_removed_body_leaves_ray_casts() {
        let mut world = PhysicsWorld::default();
        let handle = ground(&mut world);
        assert!(world.remove_body(handle));
        assert!(world.cast_ray(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, 100.0).is_empty());
    }

    #[test]
    fn test_half_space_has_no_edge() {
        let mut world = PhysicsWorld::default();
        let plane = world.insert_body(&BodyDesc::new(BodyShape::HalfSpace, Vec3::ZERO, 0.0));

        let near = distance_to(&world, plane, Vec3::new(0.0, 0.0, 2.0), Vec3::NEG_Z);
        assert!((near.unwrap() - 2.0).abs() < 1e-4);

        // Slanted ray meets z = 0 at x = 60
        let slanted = Vec3::new(60.0, 0.0, -30.0);
        let far = distance_to(&world, plane, Vec3::new(0.0, 0.0, 30.0), slanted);
        assert!((far.unwrap() - slanted.length()).abs() < 1e-2);

        let far_away = distance_to(&world, plane, Vec3::new(5000.0, -5000.0, 1.0), Vec3::NEG_Z);
        assert!((far_away.unwrap() - 1.0).abs() < 1e-3);

        assert!(distance_to(&world, plane, Vec3::new(0.0, 0.0, 2.0), Vec3::Z).is_none());
    }

    #[test]
    fn test_ray_sees_bodies_moved_by_step() {
        let mut world = PhysicsWorld::default();
        let ball = world.insert_body(&BodyDesc::new(
            BodyShape::Ball { radius: 0.5 },
            Vec3::new(0.0, 0.0, 10.0),
            1.0,
        ));
        let before = distance_to(&world, ball, Vec3::new(0.0, 0.0, 20.0), Vec3::NEG_Z).unwrap();
        world.advance(0.5);
        let after = distance_to(&world, ball, Vec3::new(0.0, 0.0, 20.0), Vec3::NEG_Z).unwrap();
        assert!(after > before);
    }

    #[test]
    fn test_body_flags_reach_rapier() {
        let mut world = PhysicsWorld::default();
        let mut desc = BodyDesc::new(BodyShape::Ball { radius: 0.5 }, Vec3::Z, 1.0);
        desc.ccd = true;
        desc.soft_ccd_prediction = 0.5;
        desc.can_sleep = false;
        let handle = world.insert_body(&desc);

        let body = &world.rigid_body_set[handle];
        assert!(body.is_ccd_enabled());
        assert_eq!(body.soft_ccd_prediction(), 0.5);
    }

    #[test]
    fn test_dynamic_body_falls() {
        let mut world = PhysicsWorld::default();
        let ball = world.insert_body(&BodyDesc::new(
            BodyShape::Ball { radius: 0.5 },
            Vec3::new(0.0, 0.0, 10.0),
            1.0,
        ));

        let steps = world.advance(0.5);
        assert!(steps > 0);
        assert!(world.translation(ball).unwrap().z < 10.0);
    }

    #[test]
    fn test_substep_cap() {
        let mut world = PhysicsWorld::default();
        let steps = world.advance(10.0);
        assert_eq!(steps, PhysicsConfigData::default().max_substeps);
    }

    #[test]
    fn test_remove_body_drops_joint() {
        let mut world = PhysicsWorld::default();
        let anchor = ground(&mut world);
        let ball = world.insert_body(&BodyDesc::new(
            BodyShape::Ball { radius: 1.0 },
            Vec3::new(0.0, 0.0, 3.0),
            5.0,
        ));
        world.add_spherical_joint(anchor, ball, Vec3::ZERO, Vec3::new(0.0, 0.0, -5.0));
        assert_eq!(world.joint_count(), 1);

        assert!(world.remove_body(ball));
        assert_eq!(world.joint_count(), 0);
        assert!(!world.apply_impulse(ball, Vec3::X));
    }

    #[test]
    fn test_cone_stands_on_z() {
        let mut world = PhysicsWorld::default();
        let cone = world.insert_body(&BodyDesc::new(
            BodyShape::Cone {
                half_height: 1.0,
                radius: 0.25,
            },
            Vec3::ZERO,
            0.0,
        ));

        // Tall along Z, narrow in the XY plane
        let down = distance_to(&world, cone, Vec3::new(0.1, 0.0, 5.0), Vec3::NEG_Z);
        assert!((down.unwrap() - 4.8).abs() < 0.05);
        let wide = distance_to(&world, cone, Vec3::new(0.0, 0.5, 5.0), Vec3::NEG_Z);
        assert!(wide.is_none());
        let high = distance_to(&world, cone, Vec3::new(5.0, 0.0, 0.6), Vec3::NEG_X);
        assert!(high.is_some());
    }
}
