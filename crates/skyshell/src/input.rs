//! Tap-to-launch placement.

use skyshell_shared::{Mat4, Vec3};

/// World-space launch origin for a tap: a fixed distance straight ahead
/// of the camera, at the camera's own height.
///
/// Firing from eye level reads naturally in AR; the riser climbs out of
/// the user's view rather than materializing overhead.
#[must_use]
pub fn launch_position(view: &Mat4, distance: f32) -> Vec3 {
    view.camera_position() + view.camera_forward() * distance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_sits_ahead_of_the_camera() {
        let eye = Vec3::new(1.0, 1.6, 4.0);
        let view = Mat4::look_at(eye, Vec3::new(1.0, 1.6, 0.0), Vec3::Y);

        let origin = launch_position(&view, 2.0);
        assert!((origin - Vec3::new(1.0, 1.6, 2.0)).length() < 1e-4);
        assert!((origin - eye).length() - 2.0 < 1e-4);
    }

    #[test]
    fn test_distance_scales_linearly() {
        let view = Mat4::look_at(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y);
        let near = launch_position(&view, 1.0);
        let far = launch_position(&view, 3.0);
        assert!((far.length() - 3.0 * near.length()).abs() < 1e-4);
    }
}
