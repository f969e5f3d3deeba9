//! Billboard transforms: quads that always face the viewer.

use skyshell_shared::{Mat4, Vec3};

/// The rotation that cancels the camera's orientation.
///
/// Takes the current view matrix, zeroes its translation column, and
/// inverts the remaining pure rotation (transpose, since a view rotation
/// is orthonormal). Composed into a model matrix, it makes the quad's
/// local forward axis come out with no net rotation relative to the
/// camera, whatever the camera orientation.
#[must_use]
pub fn billboard_rotation(view: &Mat4) -> Mat4 {
    view.without_translation().transposed()
}

/// Model matrix for a particle at `position`: translation x billboard.
#[must_use]
pub fn model_matrix(position: Vec3, view: &Mat4) -> Mat4 {
    Mat4::from_translation(position) * billboard_rotation(view)
}

/// Per-draw MVP uniform: projection x view x model.
#[must_use]
pub fn mvp_matrix(position: Vec3, view: &Mat4, projection: &Mat4) -> Mat4 {
    *projection * *view * model_matrix(position, view)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arbitrary_views() -> Vec<Mat4> {
        vec![
            Mat4::IDENTITY,
            Mat4::look_at(Vec3::new(3.0, 1.0, -4.0), Vec3::ZERO, Vec3::Y),
            Mat4::look_at(Vec3::new(-2.0, 5.0, 2.0), Vec3::new(1.0, 1.0, 1.0), Vec3::Y),
            Mat4::from_rotation_y(1.1)
                * Mat4::from_rotation_x(-0.4)
                * Mat4::from_translation(Vec3::new(0.5, -2.0, 3.0)),
        ]
    }

    #[test]
    fn test_billboard_cancels_camera_rotation() {
        for view in arbitrary_views() {
            let combined = view.without_translation() * billboard_rotation(&view);
            // The upper 3x3 of view x billboard must be the identity:
            // zero net rotation relative to the camera frame.
            for c in 0..3 {
                for r in 0..3 {
                    let expect = if c == r { 1.0 } else { 0.0 };
                    assert!(
                        (combined.cols[c][r] - expect).abs() < 1e-5,
                        "residual rotation in view {view:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_quad_forward_axis_faces_camera() {
        for view in arbitrary_views() {
            let model = model_matrix(Vec3::new(1.0, 2.0, -3.0), &view);
            let forward_in_camera = (view * model).transform_direction(Vec3::Z);
            assert!(forward_in_camera.distance(Vec3::Z) < 1e-5);
        }
    }

    #[test]
    fn test_model_keeps_particle_position() {
        let view = Mat4::look_at(Vec3::new(0.0, 1.0, 8.0), Vec3::ZERO, Vec3::Y);
        let position = Vec3::new(-2.0, 4.0, 1.0);
        let model = model_matrix(position, &view);
        assert!(model.transform_point(Vec3::ZERO).distance(position) < 1e-5);
    }
}
