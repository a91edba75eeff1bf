/// Destruction engine
///
/// Wrecking ball rig, radial explosions, dropped heavy balls and the timed
/// earthquake. Everything acts through impulses on registered bodies.

use glam::{Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{DestructionConfigData, HeavyBallConfig, WreckingBallConfig};
use crate::ecs::components::{BodyHandle, BodyTag, Constraint};
use crate::ecs::physics::{BodyDesc, BodyShape};
use crate::ecs::BodyRegistry;
use crate::error::Result;
use crate::task::{TaskStatus, TimedTask};

/// Direction used when a body sits exactly on the epicenter
pub const EXPLOSION_FALLBACK_AXIS: Vec3 = Vec3::Z;

const WRECKING_BALL_COLOR: Vec4 = Vec4::new(0.5, 0.5, 0.5, 1.0);
const ANCHOR_COLOR: Vec4 = Vec4::new(0.2, 0.2, 0.25, 1.0);
const HEAVY_BALL_COLOR: Vec4 = Vec4::new(0.15, 0.15, 0.15, 1.0);

/// Ball, anchor and the joint between them
#[derive(Debug, Clone, Copy)]
pub struct WreckingBall {
    pub ball: BodyHandle,
    pub anchor: BodyHandle,
    pub constraint: Constraint,
}

/// One impulse handed out by an explosion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedImpulse {
    pub body: BodyHandle,
    pub impulse: Vec3,
    pub distance: f32,
}

/// Impulse an explosion gives a body at `body_position`, `None` when out of range
///
/// Magnitude is `force / (distance + damping)`; the damping term keeps it
/// finite at the epicenter.
pub fn explosion_impulse(
    epicenter: Vec3,
    body_position: Vec3,
    force: f32,
    radius: f32,
    damping: f32,
) -> Option<Vec3> {
    let offset = body_position - epicenter;
    let distance = offset.length();
    if distance >= radius {
        return None;
    }

    let direction = if distance == 0.0 {
        EXPLOSION_FALLBACK_AXIS
    } else {
        offset / distance
    };
    Some(direction * (force / (distance + damping)))
}

/// Shakes every dynamic body for a fixed time
pub struct Earthquake {
    task: TimedTask,
    magnitude: f32,
    rng: StdRng,
}

impl Earthquake {
    pub fn new(duration: f32, magnitude: f32, seed: u64) -> Self {
        Self {
            task: TimedTask::new(duration),
            magnitude,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Horizontal impulse, each axis uniform in [-1, 1] times the magnitude
    pub fn sample_impulse(&mut self) -> Vec3 {
        Vec3::new(
            self.rng.random_range(-1.0_f32..=1.0),
            self.rng.random_range(-1.0_f32..=1.0),
            0.0,
        ) * self.magnitude
    }

    /// One frame of shaking; `Finished` once the duration has passed
    pub fn tick(&mut self, registry: &mut BodyRegistry, delta_time: f32, physics_enabled: bool) -> TaskStatus {
        if self.task.poll(delta_time) == TaskStatus::Finished {
            return TaskStatus::Finished;
        }
        if !physics_enabled {
            return TaskStatus::Continue;
        }

        for body in registry.dynamic_bodies() {
            let impulse = self.sample_impulse();
            if let Err(err) = registry.apply_impulse(body, impulse) {
                tracing::warn!("Earthquake skipped body: {}", err);
            }
        }
        TaskStatus::Continue
    }

    pub fn elapsed(&self) -> f32 {
        self.task.elapsed()
    }

    pub fn remaining(&self) -> f32 {
        self.task.remaining()
    }
}

/// Spawns hazards and applies destructive impulses
pub struct DestructionEngine {
    pub config: DestructionConfigData,
    earthquake: Option<Earthquake>,
}

impl DestructionEngine {
    pub fn new(config: DestructionConfigData) -> Self {
        Self {
            config,
            earthquake: None,
        }
    }

    /// Ball on a spherical joint below a fixed anchor, pushed sideways to swing
    pub fn spawn_wrecking_ball(&self, registry: &mut BodyRegistry) -> Result<WreckingBall> {
        let rig: &WreckingBallConfig = &self.config.wrecking_ball;

        let ball_desc = BodyDesc::new(
            BodyShape::Ball { radius: rig.radius },
            rig.ball_position,
            rig.mass,
        )
        .with_surface(rig.friction, rig.restitution)
        .with_damping(rig.damping, rig.damping);
        let ball = registry.register(&ball_desc, BodyTag::WreckingBall, WRECKING_BALL_COLOR);

        let anchor_desc = BodyDesc::new(
            BodyShape::Cuboid {
                half_extents: Vec3::splat(rig.anchor_half_extent),
            },
            rig.anchor_position,
            0.0,
        );
        let anchor = registry.register(&anchor_desc, BodyTag::Anchor, ANCHOR_COLOR);

        let constraint = registry.add_spherical_joint(anchor, ball, Vec3::ZERO, rig.ball_pivot)?;
        registry.apply_impulse(ball, rig.initial_impulse)?;

        tracing::info!(
            mass = rig.mass,
            anchor = ?rig.anchor_position,
            "spawned wrecking ball"
        );
        Ok(WreckingBall {
            ball,
            anchor,
            constraint,
        })
    }

    /// Radial impulse on every dynamic body within `radius` of `epicenter`
    ///
    /// Does nothing while physics is disabled.
    pub fn trigger_explosion(
        &self,
        registry: &mut BodyRegistry,
        physics_enabled: bool,
        epicenter: Vec3,
        force: f32,
        radius: f32,
    ) -> Vec<AppliedImpulse> {
        if !physics_enabled {
            tracing::debug!("Explosion ignored, physics disabled");
            return Vec::new();
        }

        let mut applied = Vec::new();
        for body in registry.dynamic_bodies() {
            let position = match registry.position(body) {
                Ok(position) => position,
                Err(err) => {
                    tracing::warn!("Explosion skipped body: {}", err);
                    continue;
                }
            };

            let Some(impulse) = explosion_impulse(
                epicenter,
                position,
                force,
                radius,
                self.config.explosion_distance_damping,
            ) else {
                continue;
            };

            if registry.apply_impulse(body, impulse).is_ok() {
                applied.push(AppliedImpulse {
                    body,
                    impulse,
                    distance: position.distance(epicenter),
                });
            }
        }

        tracing::info!(
            epicenter = ?epicenter,
            force,
            radius,
            affected = applied.len(),
            "explosion"
        );
        applied
    }

    /// Heavy ball released above `position`, left to gravity
    pub fn drop_heavy_ball(&self, registry: &mut BodyRegistry, position: Vec3) -> BodyHandle {
        let ball: &HeavyBallConfig = &self.config.heavy_ball;
        let spawn_at = position + Vec3::Z * ball.drop_height;

        let desc = BodyDesc::new(BodyShape::Ball { radius: ball.radius }, spawn_at, ball.mass)
            .with_surface(ball.friction, ball.restitution);
        let handle = registry.register(&desc, BodyTag::HeavyBall, HEAVY_BALL_COLOR);

        tracing::info!(position = ?spawn_at, mass = ball.mass, "dropped heavy ball");
        handle
    }

    /// Start shaking; replaces any earthquake already running
    pub fn trigger_earthquake(&mut self) {
        let seed = self
            .config
            .earthquake_seed
            .unwrap_or_else(|| rand::rng().random::<u64>());

        self.earthquake = Some(Earthquake::new(
            self.config.earthquake_duration,
            self.config.earthquake_magnitude,
            seed,
        ));
        tracing::info!(
            duration = self.config.earthquake_duration,
            magnitude = self.config.earthquake_magnitude,
            seed,
            "earthquake started"
        );
    }

    /// Run the earthquake for one frame; `None` when no earthquake is active
    pub fn tick_earthquake(
        &mut self,
        registry: &mut BodyRegistry,
        delta_time: f32,
        physics_enabled: bool,
    ) -> Option<TaskStatus> {
        let earthquake = self.earthquake.as_mut()?;
        let status = earthquake.tick(registry, delta_time, physics_enabled);
        if status == TaskStatus::Finished {
            tracing::info!(elapsed = earthquake.elapsed(), "earthquake ended");
            self.earthquake = None;
        }
        Some(status)
    }

    pub fn earthquake(&self) -> Option<&Earthquake> {
        self.earthquake.as_ref()
    }

    pub fn earthquake_active(&self) -> bool {
        self.earthquake.is_some()
    }
}

impl Default for DestructionEngine {
    fn default() -> Self {
        Self::new(DestructionConfigData::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_scenario() {
        let impulse =
            explosion_impulse(Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0), 500_000.0, 10.0, 0.1).unwrap();
        assert!((impulse.length() - 500_000.0 / 5.1).abs() < 0.5);
        assert!(impulse.x > 0.0);
        assert!(impulse.y.abs() < 1e-3 && impulse.z.abs() < 1e-3);
    }

    #[test]
    fn test_impulse_out_of_range() {
        assert!(explosion_impulse(Vec3::ZERO, Vec3::new(0.0, 5.0, 0.0), 100.0, 5.0, 0.1).is_none());
        assert!(explosion_impulse(Vec3::ZERO, Vec3::new(0.0, 9.0, 0.0), 100.0, 5.0, 0.1).is_none());
    }

    #[test]
    fn test_impulse_at_epicenter_uses_fallback_axis() {
        let impulse = explosion_impulse(Vec3::ONE, Vec3::ONE, 100.0, 5.0, 0.1).unwrap();
        assert!((impulse.normalize() - EXPLOSION_FALLBACK_AXIS).length() < 1e-6);
        assert!((impulse.length() - 100.0 / 0.1).abs() < 1e-2);
    }

    #[test]
    fn test_impulse_decreases_with_distance() {
        let force = 1000.0;
        let mut previous = f32::INFINITY;
        for step in 0..50 {
            let distance = step as f32 * 0.2;
            let magnitude = explosion_impulse(Vec3::ZERO, Vec3::new(distance, 0.0, 0.0), force, 20.0, 0.1)
                .unwrap()
                .length();
            assert!(magnitude <= force / 0.1 + 1e-2);
            assert!(magnitude < previous);
            previous = magnitude;
        }
    }

    #[test]
    fn test_earthquake_samples_are_horizontal_and_bounded() {
        let mut quake = Earthquake::new(5.0, 10.0, 42);
        for _ in 0..200 {
            let impulse = quake.sample_impulse();
            assert_eq!(impulse.z, 0.0);
            assert!(impulse.x.abs() <= 10.0 && impulse.y.abs() <= 10.0);
        }
    }

    #[test]
    fn test_earthquake_is_reproducible() {
        let mut a = Earthquake::new(5.0, 10.0, 9);
        let mut b = Earthquake::new(5.0, 10.0, 9);
        for _ in 0..10 {
            assert_eq!(a.sample_impulse(), b.sample_impulse());
        }
    }

    #[test]
    fn test_earthquake_expires() {
        let mut registry = BodyRegistry::default();
        let mut engine = DestructionEngine::default();
        engine.trigger_earthquake();

        let mut frames = 0;
        while let Some(TaskStatus::Continue) = engine.tick_earthquake(&mut registry, 0.1, true) {
            frames += 1;
            assert!(frames < 100);
        }
        assert!(!engine.earthquake_active());
        assert!(frames >= 49 && frames <= 50);
        assert_eq!(engine.tick_earthquake(&mut registry, 0.1, true), None);
    }
}
