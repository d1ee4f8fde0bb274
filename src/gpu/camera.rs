//! Orbit camera with damped rotation.

use glam::{Mat4, Vec3};

/// Smallest allowed angle from the +Y axis, in radians.
pub const MIN_POLAR: f32 = std::f32::consts::PI / 5.0;
/// Largest allowed angle from the +Y axis; keeps the view above ground.
pub const MAX_POLAR: f32 = std::f32::consts::PI / 2.3;

/// Fraction of the remaining rotation applied per 60 Hz frame.
const DAMPING: f32 = 0.05;

/// Orbit camera around a fixed target. Rotation only: no pan, no zoom.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Horizontal angle around +Y, in radians.
    pub yaw: f32,
    /// Angle from the +Y axis, in radians.
    pub polar: f32,
    pub distance: f32,
    pub target: Vec3,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    goal_yaw: f32,
    goal_polar: f32,
}

impl OrbitCamera {
    /// Camera at `position` looking at the origin.
    pub fn looking_at_origin(position: Vec3) -> Self {
        let distance = position.length().max(1e-3);
        let yaw = position.x.atan2(position.z);
        let polar = (position.y / distance).clamp(-1.0, 1.0).acos().clamp(MIN_POLAR, MAX_POLAR);

        Self {
            yaw,
            polar,
            distance,
            target: Vec3::ZERO,
            fov_y: 35.0_f32.to_radians(),
            near: 0.01,
            far: 1000.0,
            goal_yaw: yaw,
            goal_polar: polar,
        }
    }

    /// Queue a rotation; it is applied gradually by [`update`](Self::update).
    pub fn rotate(&mut self, delta_yaw: f32, delta_polar: f32) {
        self.goal_yaw += delta_yaw;
        self.goal_polar = (self.goal_polar + delta_polar).clamp(MIN_POLAR, MAX_POLAR);
    }

    /// Ease towards the queued rotation.
    pub fn update(&mut self, delta: f32) {
        let blend = 1.0 - (1.0 - DAMPING).powf(delta * 60.0);
        self.yaw += (self.goal_yaw - self.yaw) * blend;
        self.polar += (self.goal_polar - self.polar) * blend;
    }

    pub fn position(&self) -> Vec3 {
        let ring = self.distance * self.polar.sin();
        self.target
            + Vec3::new(
                ring * self.yaw.sin(),
                self.distance * self.polar.cos(),
                ring * self.yaw.cos(),
            )
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::looking_at_origin(Vec3::new(-10.0, 30.0, 70.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_requested_position() {
        let start = Vec3::new(-10.0, 30.0, 70.0);
        let camera = OrbitCamera::looking_at_origin(start);
        assert!((camera.position() - start).length() < 1e-3);
    }

    #[test]
    fn test_polar_angle_is_clamped() {
        let mut camera = OrbitCamera::default();
        camera.rotate(0.0, 10.0);
        for _ in 0..2000 {
            camera.update(1.0 / 60.0);
        }
        assert!((camera.polar - MAX_POLAR).abs() < 1e-3);

        camera.rotate(0.0, -10.0);
        for _ in 0..2000 {
            camera.update(1.0 / 60.0);
        }
        assert!((camera.polar - MIN_POLAR).abs() < 1e-3);
    }

    #[test]
    fn test_rotation_is_damped() {
        let mut camera = OrbitCamera::default();
        let yaw = camera.yaw;
        camera.rotate(1.0, 0.0);
        camera.update(1.0 / 60.0);
        let moved = camera.yaw - yaw;
        assert!(moved > 0.0 && moved < 0.1);
    }
}
