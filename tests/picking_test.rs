/// Screen-to-world picking: a pixel that shows a body must cast a ray that hits it

use demolition_sandbox::core::Camera;
use demolition_sandbox::ecs::components::BodyTag;
use demolition_sandbox::ecs::physics::{BodyDesc, BodyShape};
use demolition_sandbox::Sandbox;
use glam::{Mat4, Vec3, Vec4};

const WIDTH: f32 = 1280.0;
const HEIGHT: f32 = 720.0;

/// Project a world point to window pixels (origin top-left)
fn world_to_screen(world_pos: Vec3, view: Mat4, proj: Mat4) -> (f32, f32) {
    let clip = proj * view * world_pos.extend(1.0);
    let ndc = clip.truncate() / clip.w;
    ((ndc.x + 1.0) * 0.5 * WIDTH, (1.0 - ndc.y) * 0.5 * HEIGHT)
}

fn camera_looking_at(position: Vec3, target: Vec3) -> Camera {
    let dir = (target - position).normalize();
    let mut camera = Camera::new(position);
    camera.set_orientation((-dir.x).atan2(dir.y), dir.z.asin());
    camera
}

#[test]
fn test_projected_block_is_picked() {
    let mut sandbox = Sandbox::default();
    let targets = [
        Vec3::new(0.0, 0.0, 0.5),
        Vec3::new(4.0, 3.0, 0.5),
        Vec3::new(-6.0, 8.0, 2.5),
    ];
    let handles: Vec<_> = targets
        .iter()
        .map(|&position| {
            sandbox.registry.register(
                &BodyDesc::new(
                    BodyShape::Cuboid {
                        half_extents: Vec3::splat(0.5),
                    },
                    position,
                    1.0,
                ),
                BodyTag::Box,
                Vec4::ONE,
            )
        })
        .collect();

    sandbox.camera = camera_looking_at(Vec3::new(0.0, -15.0, 10.0), Vec3::ZERO);
    let view = sandbox.camera.view_matrix();
    let proj = sandbox.camera.projection_matrix(WIDTH / HEIGHT);

    for (target, handle) in targets.iter().zip(&handles) {
        let (x, y) = world_to_screen(*target, view, proj);
        let ray = sandbox.camera.pointer_ray(x, y, WIDTH, HEIGHT);

        let hits = sandbox.registry.raycast(&ray, 1000.0);
        assert_eq!(hits.first().map(|hit| hit.body), Some(*handle), "target {target}");
    }
}

#[test]
fn test_camera_looking_at_helper() {
    let camera = camera_looking_at(Vec3::new(3.0, -4.0, 2.0), Vec3::new(3.0, 6.0, 2.0));
    assert!((camera.forward() - Vec3::Y).length() < 1e-5);
}
