/// Sandbox state and per-frame update
///
/// Owns the registry, camera, session selection, mode machine and the
/// destruction engine. The window loop feeds it input and clicks; the render
/// layer reads a `RenderBatch` back out.

use glam::{Vec3, Vec4};

use crate::config::SandboxConfig;
use crate::core::{Camera, Ray};
use crate::destruction::{AppliedImpulse, DestructionEngine, WreckingBall};
use crate::ecs::components::{BodyHandle, BodyTag, MeshKind, Visual};
use crate::ecs::physics::{BodyDesc, BodyShape};
use crate::ecs::rendering::{extract_render_batch, RenderBatch};
use crate::ecs::BodyRegistry;
use crate::error::{Result, SandboxError};
use crate::input::InputState;
use crate::mode::{ClickAction, InteractionMode, ModeMachine};
use crate::placement::{self, PlacedBlock};
use crate::session::SessionConfig;
use crate::task::TaskStatus;

const GROUND_COLOR: Vec4 = Vec4::new(0.35, 0.45, 0.3, 1.0);

/// What a pointer click ended up doing
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Placed(PlacedBlock),
    Exploded {
        epicenter: Vec3,
        impulses: Vec<AppliedImpulse>,
    },
    /// The pointer ray hit nothing
    Missed,
    /// Clicks are ignored in the current mode
    Ignored,
}

pub struct Sandbox {
    pub config: SandboxConfig,
    pub registry: BodyRegistry,
    pub camera: Camera,
    pub session: SessionConfig,
    pub destruction: DestructionEngine,
    modes: ModeMachine,
    physics_enabled: bool,
    ground: BodyHandle,
}

impl Sandbox {
    pub fn new(config: SandboxConfig) -> Self {
        let mut registry = BodyRegistry::new(&config.physics);

        // Collides as the whole plane z = 0; only the visual is bounded
        let half = config.placement.ground_half_extent;
        let ground_desc = BodyDesc::new(BodyShape::HalfSpace, Vec3::ZERO, 0.0);
        let ground_visual = Visual {
            mesh: MeshKind::Plane,
            scale: Vec3::new(half * 2.0, half * 2.0, 1.0),
            color: GROUND_COLOR,
        };
        let ground = registry.register_with_visual(&ground_desc, BodyTag::Ground, ground_visual);

        let camera = Camera::from(config.camera.clone());
        let session = SessionConfig::new(&config.placement, &config.destruction);
        let destruction = DestructionEngine::new(config.destruction.clone());
        let physics_enabled = config.physics.start_enabled;

        tracing::info!(
            physics_enabled,
            ground_half_extent = half,
            "sandbox ready"
        );

        Self {
            config,
            registry,
            camera,
            session,
            destruction,
            modes: ModeMachine::new(),
            physics_enabled,
            ground,
        }
    }

    /// One frame: physics, camera movement, look, earthquake
    pub fn tick(&mut self, delta_time: f32, input: &mut InputState) {
        if self.physics_enabled {
            self.registry.step(delta_time);
        }

        let axes = input.movement_axes();
        let speed = self.config.camera.move_speed * delta_time;
        self.camera.move_forward(axes.x * speed);
        self.camera.move_right(axes.y * speed);
        self.camera.move_up(axes.z * speed);

        let look = input.take_mouse_delta();
        if !input.ui_focus() && look != glam::Vec2::ZERO {
            let sensitivity = self.config.camera.look_sensitivity.to_radians();
            self.camera.rotate(-look.x * sensitivity, -look.y * sensitivity);
        }

        if let Some(TaskStatus::Finished) =
            self.destruction
                .tick_earthquake(&mut self.registry, delta_time, self.physics_enabled)
        {
            self.modes.finish_earthquake();
        }
    }

    /// Dispatch a pointer click according to the current mode
    pub fn handle_click(&mut self, ray: &Ray) -> Result<ClickOutcome> {
        match self.modes.click_action() {
            ClickAction::Ignore => {
                tracing::debug!(mode = %self.modes.mode(), "click ignored");
                Ok(ClickOutcome::Ignored)
            }
            ClickAction::Place => {
                let template = self.session.template();
                match placement::place_block(
                    &mut self.registry,
                    &self.config.materials,
                    &self.config.placement,
                    ray,
                    &template,
                ) {
                    Ok(placed) => Ok(ClickOutcome::Placed(placed)),
                    Err(SandboxError::NoSurfaceHit) => {
                        tracing::debug!("placement missed");
                        Ok(ClickOutcome::Missed)
                    }
                    Err(err) => Err(err),
                }
            }
            ClickAction::Explode => {
                let surface = match placement::surface_point(
                    &self.registry,
                    ray,
                    self.config.placement.surface_offset,
                ) {
                    Ok(surface) => surface,
                    Err(SandboxError::NoSurfaceHit) => {
                        tracing::debug!("explosion click missed");
                        return Ok(ClickOutcome::Missed);
                    }
                    Err(err) => return Err(err),
                };

                let epicenter = placement::snap_to_grid(surface, self.session.block_size);
                let (force, radius) = self.session.explosion_input(&self.config.destruction);
                let impulses = self.destruction.trigger_explosion(
                    &mut self.registry,
                    self.physics_enabled,
                    epicenter,
                    force,
                    radius,
                );
                self.modes.explosion_fired();

                Ok(ClickOutcome::Exploded {
                    epicenter,
                    impulses,
                })
            }
        }
    }

    pub fn toggle_physics(&mut self) -> bool {
        self.set_physics_enabled(!self.physics_enabled);
        self.physics_enabled
    }

    pub fn set_physics_enabled(&mut self, enabled: bool) {
        if self.physics_enabled != enabled {
            tracing::info!(enabled, "physics toggled");
            self.physics_enabled = enabled;
        }
    }

    pub fn toggle_explosion_mode(&mut self) -> InteractionMode {
        self.modes.toggle_explosion()
    }

    /// Start the earthquake; refused outside Building
    pub fn trigger_earthquake(&mut self) -> bool {
        if !self.modes.start_earthquake() {
            return false;
        }
        self.destruction.trigger_earthquake();
        true
    }

    pub fn spawn_wrecking_ball(&mut self) -> Result<WreckingBall> {
        self.destruction.spawn_wrecking_ball(&mut self.registry)
    }

    /// Drop a heavy ball above wherever the pointer ray meets the scene
    pub fn drop_heavy_ball(&mut self, ray: &Ray) -> Result<BodyHandle> {
        let target = placement::surface_point(
            &self.registry,
            ray,
            self.config.placement.surface_offset,
        )?;
        Ok(self.destruction.drop_heavy_ball(&mut self.registry, target))
    }

    /// Remove everything the user spawned; the ground stays
    pub fn clear_blocks(&mut self) -> usize {
        let removed = self.registry.clear(&BodyTag::SPAWNED);
        tracing::info!(removed, "cleared scene");
        removed
    }

    /// Select the destruction preset at `index`, if there is one
    pub fn select_preset(&mut self, index: usize) -> bool {
        match self.config.destruction.presets.get(index) {
            Some(preset) => {
                self.session.apply_preset(preset);
                true
            }
            None => false,
        }
    }

    pub fn render_batch(&self) -> RenderBatch {
        extract_render_batch(&self.registry.world, self.camera.position())
    }

    pub fn mode(&self) -> InteractionMode {
        self.modes.mode()
    }

    pub fn explosion_fields_visible(&self) -> bool {
        self.modes.explosion_fields_visible()
    }

    pub fn physics_enabled(&self) -> bool {
        self.physics_enabled
    }

    pub fn ground(&self) -> BodyHandle {
        self.ground
    }

    /// Short status line for the window title
    pub fn status(&self) -> String {
        let physics = if self.physics_enabled { "on" } else { "off" };
        let mut status = format!(
            "{} | physics {} | {} {} {:.2} | {} bodies",
            self.modes.mode(),
            physics,
            self.session.material,
            self.session.shape,
            self.session.block_size,
            self.registry.len(),
        );
        if let Some(earthquake) = self.destruction.earthquake() {
            status.push_str(&format!(" | quake {:.1}s", earthquake.remaining()));
        }
        status
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new(SandboxConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down_ray(x: f32, y: f32) -> Ray {
        Ray::new(Vec3::new(x, y, 20.0), Vec3::NEG_Z)
    }

    #[test]
    fn test_ground_is_registered() {
        let sandbox = Sandbox::default();
        assert_eq!(sandbox.registry.len(), 1);
        assert_eq!(sandbox.registry.tag(sandbox.ground()).unwrap(), BodyTag::Ground);
        assert!(!sandbox.physics_enabled());
        assert_eq!(sandbox.mode(), InteractionMode::Building);
    }

    #[test]
    fn test_click_places_block_on_ground() {
        let mut sandbox = Sandbox::default();
        let outcome = sandbox.handle_click(&down_ray(0.3, 0.2)).unwrap();
        let ClickOutcome::Placed(placed) = outcome else {
            panic!("expected placement");
        };
        assert_eq!(placed.spec.position, Vec3::new(0.0, 0.0, 0.5));

        // Stacks on top of the first block
        let outcome = sandbox.handle_click(&down_ray(0.1, -0.1)).unwrap();
        let ClickOutcome::Placed(second) = outcome else {
            panic!("expected placement");
        };
        assert_eq!(second.spec.position, Vec3::new(0.0, 0.0, 1.5));
    }

    #[test]
    fn test_ground_reaches_past_drawn_extent() {
        let mut sandbox = Sandbox::default();
        let drawn = sandbox.config.placement.ground_half_extent;
        let visual = sandbox.registry.visual(sandbox.ground()).unwrap();
        assert_eq!(visual.mesh, MeshKind::Plane);
        assert_eq!(visual.scale.x, drawn * 2.0);

        let outcome = sandbox.handle_click(&down_ray(drawn * 4.0, 0.0)).unwrap();
        let ClickOutcome::Placed(placed) = outcome else {
            panic!("expected placement");
        };
        assert_eq!(placed.spec.position, Vec3::new(drawn * 4.0, 0.0, 0.5));
    }

    #[test]
    fn test_tick_moves_camera() {
        let mut sandbox = Sandbox::default();
        let mut input = InputState::new();
        input.press(winit::keyboard::KeyCode::Space);
        let before = sandbox.camera.position();
        sandbox.tick(0.5, &mut input);
        let moved = sandbox.camera.position() - before;
        assert!((moved.z - sandbox.config.camera.move_speed * 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_look_ignored_with_ui_focus() {
        let mut sandbox = Sandbox::default();
        let mut input = InputState::new();
        let heading = sandbox.camera.heading();

        input.toggle_ui_focus();
        input.add_mouse_delta(50.0, 0.0);
        sandbox.tick(0.016, &mut input);
        assert_eq!(sandbox.camera.heading(), heading);

        input.toggle_ui_focus();
        input.add_mouse_delta(50.0, 0.0);
        sandbox.tick(0.016, &mut input);
        assert_ne!(sandbox.camera.heading(), heading);
    }

    #[test]
    fn test_status_mentions_mode() {
        let mut sandbox = Sandbox::default();
        sandbox.toggle_explosion_mode();
        assert!(sandbox.status().starts_with("Explosion"));
    }
}
