//! The published camera matrix pair.
//!
//! The camera feed (an AR session callback on its own thread) is the only
//! writer; the render pipeline reads a consistent snapshot each frame.
//! Updates are published by value - never mutated in place across threads -
//! so a reader can never observe half of an update.

use parking_lot::Mutex;
use std::sync::Arc;

use skyshell_shared::Mat4;

/// One consistent (view, projection) pair.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraMatrices {
    /// World-to-camera view matrix.
    pub view: Mat4,
    /// Camera projection matrix.
    pub projection: Mat4,
}

/// Shared camera state: single writer, many readers.
#[derive(Clone, Default)]
pub struct CameraState {
    inner: Arc<Mutex<CameraMatrices>>,
}

impl CameraState {
    /// Creates a state holding identity matrices.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a new matrix pair. Called once per tracked camera frame.
    pub fn publish(&self, view: Mat4, projection: Mat4) {
        *self.inner.lock() = CameraMatrices { view, projection };
    }

    /// A consistent copy of the latest pair.
    #[must_use]
    pub fn snapshot(&self) -> CameraMatrices {
        *self.inner.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyshell_shared::Vec3;

    #[test]
    fn test_publish_is_atomic_pairwise() {
        let state = CameraState::new();
        let view = Mat4::look_at(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective(1.0, 1.5, 0.1, 100.0);

        state.publish(view, projection);
        let snap = state.snapshot();
        assert_eq!(snap.view, view);
        assert_eq!(snap.projection, projection);
    }

    #[test]
    fn test_snapshot_defaults_to_identity() {
        let snap = CameraState::new().snapshot();
        assert_eq!(snap.view, Mat4::IDENTITY);
        assert_eq!(snap.projection, Mat4::IDENTITY);
    }
}
