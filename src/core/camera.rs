use glam::{Mat4, Vec3, Vec4};

use crate::config::CameraConfigData;

const PITCH_LIMIT: f32 = 89.0_f32 * std::f32::consts::PI / 180.0;

/// Free-flying camera for a Z-up world
///
/// Heading rotates about +Z (0 looks down +Y, positive turns left),
/// pitch tilts the view up and down and is clamped short of vertical.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    heading: f32,
    pitch: f32,
    /// Field of view in radians
    fov: f32,
    near_plane: f32,
    far_plane: f32,
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            heading: 0.0,
            pitch: 0.0,
            fov: 60.0_f32.to_radians(),
            near_plane: 0.1,
            far_plane: 1000.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Heading in radians
    pub fn heading(&self) -> f32 {
        self.heading
    }

    /// Pitch in radians
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_orientation(&mut self, heading: f32, pitch: f32) {
        self.heading = heading;
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Unit vector the camera looks along
    pub fn forward(&self) -> Vec3 {
        let (sin_h, cos_h) = self.heading.sin_cos();
        let (sin_p, cos_p) = self.pitch.sin_cos();
        Vec3::new(-sin_h * cos_p, cos_h * cos_p, sin_p)
    }

    /// Horizontal unit vector to the camera's right
    pub fn right(&self) -> Vec3 {
        let (sin_h, cos_h) = self.heading.sin_cos();
        Vec3::new(cos_h, sin_h, 0.0)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Z)
    }

    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect_ratio, self.near_plane, self.far_plane)
    }

    /// Move along the view direction
    pub fn move_forward(&mut self, amount: f32) {
        self.position += self.forward() * amount;
    }

    /// Strafe
    pub fn move_right(&mut self, amount: f32) {
        self.position += self.right() * amount;
    }

    /// Move along world +Z
    pub fn move_up(&mut self, amount: f32) {
        self.position.z += amount;
    }

    /// Apply look deltas in radians
    pub fn rotate(&mut self, heading_delta: f32, pitch_delta: f32) {
        self.heading = (self.heading + heading_delta).rem_euclid(std::f32::consts::TAU);
        self.pitch = (self.pitch + pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Ray from the camera through a pixel of the viewport
    pub fn pointer_ray(&self, mouse_x: f32, mouse_y: f32, viewport_width: f32, viewport_height: f32) -> Ray {
        let aspect = viewport_width / viewport_height.max(1.0);
        Ray::from_screen(
            mouse_x,
            mouse_y,
            viewport_width,
            viewport_height,
            self.view_matrix(),
            self.projection_matrix(aspect),
        )
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from(CameraConfigData::default())
    }
}

impl From<CameraConfigData> for Camera {
    fn from(data: CameraConfigData) -> Self {
        let mut camera = Self::new(data.position);
        camera.set_orientation(data.heading.to_radians(), data.pitch.to_radians());
        camera.fov = data.fov.to_radians();
        camera
    }
}

/// Ray for picking, direction is unit length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at parameter `t` along the ray
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Unproject a pixel (origin top-left) into a world-space ray
    pub fn from_screen(
        mouse_x: f32,
        mouse_y: f32,
        viewport_width: f32,
        viewport_height: f32,
        view_matrix: Mat4,
        proj_matrix: Mat4,
    ) -> Self {
        // Screen Y grows downward, NDC Y grows upward
        let ndc_x = (2.0 * mouse_x) / viewport_width - 1.0;
        let ndc_y = 1.0 - (2.0 * mouse_y) / viewport_height;

        let ray_clip = Vec4::new(ndc_x, ndc_y, -1.0, 1.0);

        let inv_proj = proj_matrix.inverse();
        let ray_view = inv_proj * ray_clip;
        let ray_view = Vec4::new(ray_view.x, ray_view.y, -1.0, 0.0);

        let inv_view = view_matrix.inverse();
        let ray_world = inv_view * ray_view;

        Self::new(inv_view.w_axis.truncate(), ray_world.truncate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_pixel_follows_forward() {
        let mut camera = Camera::new(Vec3::new(1.0, -10.0, 4.0));
        camera.set_orientation(0.3, -0.2);

        let ray = camera.pointer_ray(640.0, 360.0, 1280.0, 720.0);
        assert!((ray.origin - camera.position()).length() < 1e-4);
        assert!(ray.direction.dot(camera.forward()) > 0.9999);
    }

    #[test]
    fn test_top_of_screen_points_up() {
        let camera = Camera::new(Vec3::ZERO);
        let ray = camera.pointer_ray(640.0, 0.0, 1280.0, 720.0);
        assert!(ray.direction.z > 0.0);
        assert!(ray.direction.y > 0.0);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.rotate(0.0, 10.0);
        assert!(camera.pitch() <= PITCH_LIMIT);
        assert!(camera.forward().z < 1.0);
    }

    #[test]
    fn test_strafe_is_horizontal() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.set_orientation(1.0, 0.7);
        camera.move_right(2.0);
        assert!(camera.position().z.abs() < 1e-6);
        assert!((camera.position().length() - 2.0).abs() < 1e-5);
    }
}
