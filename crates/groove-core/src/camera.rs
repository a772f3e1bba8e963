//! Follow camera: a PI controller that trails the marker across the stage.
//!
//! Only the in-plane position is smoothed. The look-at snaps to the marker
//! every tick, so orientation has no lag of its own.

use crate::config::CameraGains;
use glam::{Mat4, Vec2, Vec3};

/// Simple right-handed camera description with perspective projection.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn new(eye: Vec3, target: Vec3, aspect: f32) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            aspect,
            fovy_radians: 75f32.to_radians(),
            znear: 0.1,
            zfar: 1000.0,
        }
    }

    /// Compute the clip-space projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect.max(1e-3), self.znear, self.zfar)
    }

    /// Compute the view matrix that transforms world to view space.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraState {
    pub position: Vec2,
    pub accumulated_error: Vec2,
}

#[derive(Clone, Debug)]
pub struct FollowCamera {
    gains: CameraGains,
    state: CameraState,
    look_at: Vec2,
}

impl FollowCamera {
    pub fn new(gains: CameraGains) -> Self {
        Self {
            gains,
            state: CameraState::default(),
            look_at: Vec2::ZERO,
        }
    }

    #[inline]
    pub fn state(&self) -> &CameraState {
        &self.state
    }

    #[inline]
    pub fn gains(&self) -> &CameraGains {
        &self.gains
    }

    /// One controller step toward `target`.
    pub fn update(&mut self, target: Vec2, dt: f32) {
        let error = target - self.state.position;
        self.state.accumulated_error += error * dt;
        let correction = self.gains.kp * error + self.gains.ki * self.state.accumulated_error;
        self.state.position += correction * dt;
        self.look_at = target;
    }

    /// Jump straight to `target` and drop the integral term, used after seeks.
    pub fn snap_to(&mut self, target: Vec2) {
        self.state = CameraState {
            position: target,
            accumulated_error: Vec2::ZERO,
        };
        self.look_at = target;
    }

    #[inline]
    pub fn eye(&self) -> Vec3 {
        self.state.position.extend(self.gains.distance)
    }

    #[inline]
    pub fn look_at(&self) -> Vec3 {
        self.look_at.extend(0.0)
    }

    pub fn camera(&self, aspect: f32) -> Camera {
        Camera::new(self.eye(), self.look_at(), aspect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_step_matches_pi_law() {
        let mut cam = FollowCamera::new(CameraGains::default());
        cam.update(Vec2::new(1.0, 0.0), 0.1);
        // error 1, integral 0.1, correction 5*1 + 0.5*0.1 = 5.05, step 0.505
        assert!((cam.state().position.x - 0.505).abs() < 1e-6);
        assert!((cam.state().accumulated_error.x - 0.1).abs() < 1e-6);
        assert_eq!(cam.look_at(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn converges_on_stationary_target() {
        let mut cam = FollowCamera::new(CameraGains::default());
        let target = Vec2::new(2.0, -1.0);
        for _ in 0..2000 {
            cam.update(target, 1.0 / 60.0);
        }
        assert!((cam.state().position - target).length() < 1e-2);
    }

    #[test]
    fn snap_clears_integral() {
        let mut cam = FollowCamera::new(CameraGains::default());
        cam.update(Vec2::new(3.0, 0.0), 0.5);
        cam.snap_to(Vec2::new(-1.0, 0.0));
        assert_eq!(cam.state().accumulated_error, Vec2::ZERO);
        assert_eq!(cam.eye(), Vec3::new(-1.0, 0.0, cam.gains().distance));
    }
}
